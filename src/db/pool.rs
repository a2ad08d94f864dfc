//! Shared SQLite connection handle.
//!
//! The controller and the sync engine both hold a clone of the same pool;
//! the mutex is only ever held for the duration of a synchronous query.

use crate::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct DbPool {
    conn: Arc<Mutex<Connection>>,
}

impl DbPool {
    pub fn new(path: &str) -> AppResult<Self> {
        let conn = Connection::open(Path::new(path))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self::from_connection(conn))
    }

    /// Private in-memory database, mostly for tests.
    pub fn in_memory() -> AppResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Helper to execute a closure with a mutable connection reference.
    pub fn with_conn<F, T>(&self, func: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| AppError::StorageUnavailable("connection lock poisoned".into()))?;
        func(&mut guard)
    }
}
