//! Unified application error type.
//! All modules (db, sync, core, cli) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Local record store
    // ---------------------------
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Record {0} not found")]
    NotFound(i64),

    // ---------------------------
    // Network / sync
    // ---------------------------
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Sync of record {record_id} failed after {attempts} attempts: {last_error}")]
    SyncFailed {
        record_id: i64,
        attempts: u32,
        last_error: String,
    },

    #[error("Offline: {0}")]
    Offline(String),

    #[error("A sync pass is already in progress")]
    SyncInProgress,

    // ---------------------------
    // Controller / location
    // ---------------------------
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Location unavailable: {0}")]
    Location(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid record type: {0}")]
    InvalidRecordType(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
