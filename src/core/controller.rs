//! Check-in / check-out state machine.

use crate::core::clock::{Clock, SystemClock};
use crate::core::location::{BoundedResolver, LocationResolver};
use crate::db::store::LocalStore;
use crate::errors::{AppError, AppResult};
use crate::models::query::{RecordQuery, SortOrder};
use crate::models::record::{AttendanceRecord, NewRecord};
use crate::models::record_type::RecordType;
use crate::sync::engine::{SyncEngine, UploadOutcome};
use crate::sync::transport::AttendanceApi;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum SessionState {
    Ready,
    CheckedIn { since: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub today_minutes: f64,
    pub week_minutes: f64,
    pub unsynced: i64,
}

pub struct AttendanceController<A: AttendanceApi, R: LocationResolver> {
    engine: Arc<SyncEngine<A>>,
    resolver: BoundedResolver<R>,
    clock: Arc<dyn Clock>,
    state: SessionState,
}

impl<A, R> AttendanceController<A, R>
where
    A: AttendanceApi + 'static,
    R: LocationResolver,
{
    /// Build a controller and recover its state from the store.
    pub fn new(engine: Arc<SyncEngine<A>>, resolver: BoundedResolver<R>) -> AppResult<Self> {
        Self::with_clock(engine, resolver, Arc::new(SystemClock))
    }

    pub fn with_clock(
        engine: Arc<SyncEngine<A>>,
        resolver: BoundedResolver<R>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let mut controller = Self {
            engine,
            resolver,
            clock,
            state: SessionState::Ready,
        };
        controller.recover()?;
        Ok(controller)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn engine(&self) -> &Arc<SyncEngine<A>> {
        &self.engine
    }

    fn store(&self) -> &LocalStore {
        self.engine.store()
    }

    /// Re-derive the session state from the most recent record.
    ///
    /// A record from a previous day never leaves the session open: a
    /// forgotten check-out yesterday starts today as `Ready`.
    pub fn recover(&mut self) -> AppResult<SessionState> {
        let latest = self.store().get_most_recent_by_timestamp()?;

        self.state = match &latest {
            Some(rec) if rec.date == self.clock.today() && rec.kind.is_in() => {
                SessionState::CheckedIn {
                    since: rec.timestamp,
                }
            }
            _ => SessionState::Ready,
        };

        if let Some(location) = latest.and_then(|r| r.location) {
            self.resolver.seed(location);
        }

        debug!(state = ?self.state, "session state recovered");
        Ok(self.state)
    }

    pub async fn check_in(&mut self) -> AppResult<AttendanceRecord> {
        if let SessionState::CheckedIn { since } = self.state {
            return Err(AppError::InvalidTransition(format!(
                "already checked in since {}",
                since
            )));
        }

        let record = self.record(RecordType::CheckIn).await?;
        self.state = SessionState::CheckedIn {
            since: record.timestamp,
        };
        Ok(record)
    }

    pub async fn check_out(&mut self) -> AppResult<AttendanceRecord> {
        if self.state == SessionState::Ready {
            return Err(AppError::InvalidTransition("not checked in".into()));
        }

        let record = self.record(RecordType::CheckOut).await?;
        self.state = SessionState::Ready;
        Ok(record)
    }

    async fn record(&self, kind: RecordType) -> AppResult<AttendanceRecord> {
        let location = match self.resolver.resolve().await {
            Ok(loc) => Some(loc),
            Err(e) => {
                debug!(error = %e, "recording without location");
                None
            }
        };

        let now = self.clock.now_ms();
        let mut record = self
            .store()
            .insert(NewRecord::new(kind, now).with_location(location))?;

        info!(id = record.id, kind = %kind, "attendance recorded");
        self.store().audit(
            kind.to_db_str(),
            &record.id.to_string(),
            &format!("{} at {}", kind.label(), record.time_str()),
        );

        if self.engine.is_online() {
            match self.engine.upload_record(&record).await {
                Ok(UploadOutcome::Uploaded(_)) => match self.store().mark_synced(record.id) {
                    Ok(synced) => record = synced,
                    // left unsynced: the next batch pass uploads it again
                    Err(e) => warn!(id = record.id, error = %e, "cannot mark record synced"),
                },
                Ok(UploadOutcome::Offline) => {}
                Err(e) => warn!(id = record.id, error = %e, "immediate upload failed"),
            }
        }

        Ok(record)
    }

    /// Running totals for today and the current week.
    pub fn stats(&self) -> AppResult<Stats> {
        let today = self.clock.today();
        let day = self.store().records_for_day(today)?;
        let week = self.store().records_for_week(today)?;

        Ok(Stats {
            today_minutes: LocalStore::compute_working_minutes(&day),
            week_minutes: LocalStore::compute_working_minutes(&week),
            unsynced: self.store().unsynced_count()?,
        })
    }

    /// Kilometers between today's check-in and the check-out that closed
    /// it, when both carry a location.
    pub fn session_distance_km(&self, check_out: &AttendanceRecord) -> AppResult<Option<f64>> {
        let Some(out_loc) = &check_out.location else {
            return Ok(None);
        };

        let opened = self
            .store()
            .records_for_day(check_out.date)?
            .into_iter()
            .filter(|r| r.kind.is_in() && r.timestamp <= check_out.timestamp)
            .max_by_key(|r| r.timestamp);

        Ok(opened
            .and_then(|r| r.location)
            .map(|in_loc| in_loc.distance_to(out_loc)))
    }

    /// Most recent records first.
    pub fn recent(&self, limit: usize) -> AppResult<Vec<AttendanceRecord>> {
        self.store()
            .query(&RecordQuery::all().order(SortOrder::Desc).limit(limit))
    }
}
