//! Local Record Store: durable storage for attendance records, the offline
//! request queue and the sync watermark.
//!
//! `LocalStore` is a cheap handle (`Clone`) over a shared [`DbPool`]. Every
//! method is synchronous and holds the connection only for its own
//! statements, so it can be called freely from async code.

use crate::core::calculator::working;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::db::{log, offline_queue, queries, settings};
use crate::errors::{AppError, AppResult};
use crate::models::offline_request::{NewOfflineRequest, OfflineRequest};
use crate::models::query::RecordQuery;
use crate::models::record::{AttendanceRecord, NewRecord};
use crate::utils::date;
use chrono::NaiveDate;

#[derive(Clone)]
pub struct LocalStore {
    pool: DbPool,
}

impl LocalStore {
    /// Open (or create) the database at `path` and run pending migrations.
    pub fn open(path: &str) -> AppResult<Self> {
        Self::from_pool(DbPool::new(path)?)
    }

    pub fn in_memory() -> AppResult<Self> {
        Self::from_pool(DbPool::in_memory()?)
    }

    pub fn from_pool(pool: DbPool) -> AppResult<Self> {
        pool.with_conn(|conn| init_db(conn))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    // ------------------------------------------------
    // Attendance records
    // ------------------------------------------------

    pub fn insert(&self, record: NewRecord) -> AppResult<AttendanceRecord> {
        let stored = self
            .pool
            .with_conn(|conn| queries::insert_record(conn, &record))?;
        tracing::debug!(id = stored.id, kind = %stored.kind, "attendance record added");
        Ok(stored)
    }

    pub fn query(&self, q: &RecordQuery) -> AppResult<Vec<AttendanceRecord>> {
        self.pool.with_conn(|conn| queries::query_records(conn, q))
    }

    pub fn get(&self, id: i64) -> AppResult<AttendanceRecord> {
        self.pool
            .with_conn(|conn| queries::load_record(conn, id))?
            .ok_or(AppError::NotFound(id))
    }

    pub fn get_most_recent_by_timestamp(&self) -> AppResult<Option<AttendanceRecord>> {
        self.pool.with_conn(|conn| queries::load_most_recent(conn))
    }

    pub fn get_unsynced(&self) -> AppResult<Vec<AttendanceRecord>> {
        self.pool.with_conn(|conn| queries::load_unsynced(conn))
    }

    pub fn unsynced_count(&self) -> AppResult<i64> {
        self.pool.with_conn(|conn| queries::count_unsynced(conn))
    }

    pub fn record_count(&self) -> AppResult<i64> {
        self.pool.with_conn(|conn| queries::count_records(conn))
    }

    /// Idempotently flag a record as synced and drop any queued replay of
    /// its upload.
    pub fn mark_synced(&self, id: i64) -> AppResult<AttendanceRecord> {
        self.pool.with_conn(|conn| {
            let tx = conn.transaction()?;

            if queries::set_synced(&tx, id)? == 0 {
                return Err(AppError::NotFound(id));
            }
            offline_queue::delete_for_record(&tx, id)?;

            let record = queries::load_record(&tx, id)?.ok_or(AppError::NotFound(id))?;
            tx.commit()?;

            tracing::debug!(id, "record marked as synced");
            Ok(record)
        })
    }

    /// True if a record on `date` already has this `(timestamp, type)`.
    pub fn has_record(
        &self,
        date: &NaiveDate,
        timestamp: i64,
        kind: crate::models::record_type::RecordType,
    ) -> AppResult<bool> {
        self.pool
            .with_conn(|conn| queries::exists_on_date(conn, date, timestamp, kind))
    }

    /// Administrative purge of one record.
    pub fn delete_record(&self, id: i64) -> AppResult<()> {
        self.pool.with_conn(|conn| {
            if queries::delete_record(conn, id)? == 0 {
                return Err(AppError::NotFound(id));
            }
            offline_queue::delete_for_record(conn, id)?;
            Ok(())
        })
    }

    /// Drop every record and every queued offline request. No undo.
    pub fn clear(&self) -> AppResult<()> {
        self.pool.with_conn(|conn| {
            conn.execute_batch(
                "BEGIN;
                 DELETE FROM attendance;
                 DELETE FROM offline_requests;
                 COMMIT;",
            )?;
            Ok(())
        })
    }

    pub fn records_for_day(&self, day: NaiveDate) -> AppResult<Vec<AttendanceRecord>> {
        self.query(&RecordQuery::on(day))
    }

    /// Records of the Sunday..Saturday week containing `day`.
    pub fn records_for_week(&self, day: NaiveDate) -> AppResult<Vec<AttendanceRecord>> {
        let (start, end) = date::week_bounds(day);
        self.query(&RecordQuery::between(start, end))
    }

    /// See [`working::compute_working_minutes`].
    pub fn compute_working_minutes(records: &[AttendanceRecord]) -> f64 {
        working::compute_working_minutes(records)
    }

    // ------------------------------------------------
    // Offline request queue
    // ------------------------------------------------

    pub fn enqueue_request(&self, req: NewOfflineRequest) -> AppResult<OfflineRequest> {
        self.pool.with_conn(|conn| offline_queue::enqueue(conn, &req))
    }

    pub fn pending_requests(&self) -> AppResult<Vec<OfflineRequest>> {
        self.pool.with_conn(|conn| offline_queue::load_pending(conn))
    }

    pub fn delete_request(&self, id: i64) -> AppResult<()> {
        self.pool
            .with_conn(|conn| offline_queue::delete_request(conn, id))?;
        Ok(())
    }

    // ------------------------------------------------
    // Settings
    // ------------------------------------------------

    /// Last successful download watermark (ms); 0 if never synced.
    pub fn last_sync_time(&self) -> AppResult<i64> {
        let raw = self
            .pool
            .with_conn(|conn| settings::get_setting(conn, settings::LAST_SYNC_TIME))?;

        Ok(raw.and_then(|v| v.parse::<i64>().ok()).unwrap_or(0))
    }

    pub fn set_last_sync_time(&self, ms: i64) -> AppResult<()> {
        self.pool.with_conn(|conn| {
            settings::put_setting(conn, settings::LAST_SYNC_TIME, &ms.to_string())
        })
    }

    // ------------------------------------------------
    // Internal audit log
    // ------------------------------------------------

    pub fn audit(&self, operation: &str, target: &str, message: &str) {
        let res = self.pool.with_conn(|conn| {
            log::ttlog_quiet(conn, operation, target, message);
            Ok(())
        });
        if let Err(e) = res {
            tracing::warn!(operation, error = %e, "failed to write internal log");
        }
    }
}
