//! Sync Engine: reconciles the local store with the remote attendance
//! service.
//!
//! At most one sync pass runs at a time (`sync_in_progress`). Requests that
//! arrive while a pass is running are dropped, not queued; callers that care
//! reschedule through [`SyncEngine::schedule_sync`].

use crate::core::clock::{Clock, SystemClock};
use crate::db::store::LocalStore;
use crate::errors::{AppError, AppResult};
use crate::models::offline_request::NewOfflineRequest;
use crate::models::record::{AttendanceRecord, NewRecord, RecordPayload, ServerRecord};
use crate::sync::events::{EventBus, SyncEvent, SyncReport};
use crate::sync::transport::AttendanceApi;
use crate::utils::date;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total upload tries per record (first try included).
    pub max_attempts: u32,
    /// Attempt `n` failing waits `base_delay * n` before the next one.
    pub base_delay: Duration,
    /// Flat delay before re-trying a failed `schedule_sync`.
    pub schedule_retry: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            schedule_retry: Duration::from_secs(30),
        }
    }
}

/// Marker sent to the deferred (background) sync trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The server acknowledged the record.
    Uploaded(serde_json::Value),
    /// No network: the record stays unsynced for a later batch pass.
    Offline,
}

impl UploadOutcome {
    pub fn is_offline(&self) -> bool {
        matches!(self, UploadOutcome::Offline)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncNowOutcome {
    AlreadyRunning,
    Offline,
    NothingToSync,
    Completed(SyncReport),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    /// Offline or a pass already running.
    Skipped,
    /// Handed to the background trigger.
    Deferred,
    /// No background trigger: the pass ran inline.
    Ran(SyncNowOutcome),
    /// Scheduling failed; another attempt is pending.
    RetryScheduled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Inserted(AttendanceRecord),
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FullSyncReport {
    pub downloaded: usize,
    pub inserted: usize,
    pub uploaded: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    pub online: bool,
    pub sync_in_progress: bool,
    pub last_sync_time: i64,
    pub can_sync: bool,
    pub unsynced: i64,
}

/// Releases the in-progress flag when a pass ends, whatever the outcome.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncEngine<A: AttendanceApi> {
    store: LocalStore,
    api: A,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    online: AtomicBool,
    sync_in_progress: AtomicBool,
    events: EventBus,
    deferred: Mutex<Option<mpsc::UnboundedSender<SyncRequest>>>,
}

impl<A: AttendanceApi + 'static> SyncEngine<A> {
    pub fn new(store: LocalStore, api: A, policy: RetryPolicy, online: bool) -> Self {
        Self {
            store,
            api,
            policy,
            clock: Arc::new(SystemClock),
            online: AtomicBool::new(online),
            sync_in_progress: AtomicBool::new(false),
            events: EventBus::new(),
            deferred: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn is_sync_in_progress(&self) -> bool {
        self.sync_in_progress.load(Ordering::Acquire)
    }

    /// Route future `schedule_sync` calls to a background trigger.
    pub fn register_deferred(&self, tx: mpsc::UnboundedSender<SyncRequest>) {
        if let Ok(mut slot) = self.deferred.lock() {
            *slot = Some(tx);
        }
    }

    fn deferred_sender(&self) -> Option<mpsc::UnboundedSender<SyncRequest>> {
        self.deferred.lock().ok().and_then(|slot| slot.clone())
    }

    fn drop_deferred(&self) {
        if let Ok(mut slot) = self.deferred.lock() {
            *slot = None;
        }
    }

    fn try_begin_pass(&self) -> Option<PassGuard<'_>> {
        self.sync_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard(&self.sync_in_progress))
    }

    // ------------------------------------------------
    // Connectivity
    // ------------------------------------------------

    /// Apply a connectivity signal. Going online schedules a sync pass.
    pub async fn set_connectivity(self: &Arc<Self>, online: bool) -> Option<ScheduleOutcome> {
        let was_online = self.online.swap(online, Ordering::AcqRel);
        if was_online == online {
            return None;
        }

        if online {
            info!("connection restored");
        } else {
            info!("connection lost");
        }
        self.events.emit(SyncEvent::ConnectivityChanged { online });

        if online {
            Some(self.schedule_sync().await)
        } else {
            None
        }
    }

    /// Probe the server and feed the result to [`Self::set_connectivity`].
    pub async fn probe_connectivity(self: &Arc<Self>) -> bool {
        let reachable = match self.api.health().await {
            Ok(ok) => ok,
            Err(e) => {
                debug!(error = %e, "health probe failed");
                false
            }
        };
        self.set_connectivity(reachable).await;
        reachable
    }

    /// Lightweight reachability check. Never fails: errors read as unreachable.
    pub async fn check_server_reachable(&self) -> bool {
        if !self.is_online() {
            return false;
        }

        match self.api.health().await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "server connection check failed");
                false
            }
        }
    }

    // ------------------------------------------------
    // Scheduling
    // ------------------------------------------------

    pub async fn schedule_sync(self: &Arc<Self>) -> ScheduleOutcome {
        match self.try_schedule().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    error = %e,
                    retry_in_secs = self.policy.schedule_retry.as_secs(),
                    "failed to schedule sync"
                );
                self.spawn_schedule_retry();
                ScheduleOutcome::RetryScheduled
            }
        }
    }

    async fn try_schedule(&self) -> AppResult<ScheduleOutcome> {
        if !self.is_online() || self.is_sync_in_progress() {
            return Ok(ScheduleOutcome::Skipped);
        }

        if let Some(tx) = self.deferred_sender() {
            if tx.send(SyncRequest).is_ok() {
                debug!("background sync scheduled");
                return Ok(ScheduleOutcome::Deferred);
            }
            // the trigger is gone; later attempts run inline
            self.drop_deferred();
            return Err(AppError::Other("background sync trigger unavailable".into()));
        }

        Ok(ScheduleOutcome::Ran(self.sync_now().await?))
    }

    fn spawn_schedule_retry(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        let delay = self.policy.schedule_retry;

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(delay).await;
                match engine.try_schedule().await {
                    Ok(outcome) => {
                        debug!(?outcome, "scheduled sync retry finished");
                        break;
                    }
                    Err(e) => warn!(error = %e, "scheduled sync retry failed"),
                }
            }
        });
    }

    // ------------------------------------------------
    // Upload
    // ------------------------------------------------

    /// Upload every unsynced record, one at a time.
    ///
    /// A record that exhausts its retries is reported and skipped; the rest
    /// of the batch still runs. Storage failures abort the pass.
    pub async fn sync_now(&self) -> AppResult<SyncNowOutcome> {
        if self.is_sync_in_progress() {
            debug!("sync already in progress");
            return Ok(SyncNowOutcome::AlreadyRunning);
        }
        if !self.is_online() {
            debug!("cannot sync while offline");
            return Ok(SyncNowOutcome::Offline);
        }
        let Some(_pass) = self.try_begin_pass() else {
            return Ok(SyncNowOutcome::AlreadyRunning);
        };

        let pending = self.store.get_unsynced()?;
        info!(count = pending.len(), "found unsynced records");

        if pending.is_empty() {
            return Ok(SyncNowOutcome::NothingToSync);
        }

        self.events.emit(SyncEvent::SyncStarted {
            pending: pending.len(),
        });

        let mut report = SyncReport {
            attempted: pending.len(),
            ..SyncReport::default()
        };

        for record in &pending {
            match self.sync_record(record).await {
                Ok(_) => report.synced += 1,
                Err(e @ (AppError::Storage(_) | AppError::StorageUnavailable(_))) => return Err(e),
                Err(e) => {
                    warn!(record_id = record.id, error = %e, "record left unsynced");
                    report.failed.push((record.id, e.to_string()));
                }
            }
        }

        if report.is_success() {
            info!(synced = report.synced, "sync completed successfully");
        } else {
            warn!(
                synced = report.synced,
                failed = report.failed.len(),
                "sync finished with failures, will retry later"
            );
        }
        self.store.audit(
            "sync",
            "upload",
            &format!("Synced {}/{} records", report.synced, report.attempted),
        );
        self.events.emit(SyncEvent::SyncFinished {
            report: report.clone(),
        });

        Ok(SyncNowOutcome::Completed(report))
    }

    /// POST one record, retrying transport failures with linear backoff.
    /// Marks the record synced once the server acknowledged it.
    pub async fn sync_record(&self, record: &AttendanceRecord) -> AppResult<serde_json::Value> {
        let payload = record.payload();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt: u32 = 1;

        loop {
            match self.api.post_record(&payload).await {
                Ok(ack) => {
                    self.store.mark_synced(record.id)?;
                    info!(record_id = record.id, attempt, "record synced");
                    self.events.emit(SyncEvent::RecordSynced {
                        record_id: record.id,
                    });
                    return Ok(ack);
                }
                Err(e) => {
                    warn!(record_id = record.id, attempt, error = %e, "sync attempt failed");

                    if attempt >= max_attempts {
                        return Err(AppError::SyncFailed {
                            record_id: record.id,
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    }

                    let delay = self.policy.base_delay * attempt;
                    debug!(record_id = record.id, delay_ms = delay.as_millis() as u64, "retrying");
                    self.events.emit(SyncEvent::RetryScheduled {
                        record_id: record.id,
                        attempt,
                        delay,
                    });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Best-effort immediate upload right after a record is created.
    ///
    /// Offline or a network-class failure both yield `Offline` (the failed
    /// POST is queued for replay); any other failure is `UploadFailed`.
    /// Never marks the record synced: that is the caller's call.
    pub async fn upload_record(&self, record: &AttendanceRecord) -> AppResult<UploadOutcome> {
        if !self.is_online() {
            info!(
                record_id = record.id,
                "offline: record will be synced when connection is restored"
            );
            return Ok(UploadOutcome::Offline);
        }

        let payload = record.payload();
        match self.api.post_record(&payload).await {
            Ok(ack) => {
                debug!(record_id = record.id, "record uploaded");
                Ok(UploadOutcome::Uploaded(ack))
            }
            Err(e) if e.is_network() => {
                info!(
                    record_id = record.id,
                    error = %e,
                    "network error: record will be synced when connection is restored"
                );
                self.queue_for_replay(record, &payload);
                Ok(UploadOutcome::Offline)
            }
            Err(e) => Err(AppError::UploadFailed(e.to_string())),
        }
    }

    fn queue_for_replay(&self, record: &AttendanceRecord, payload: &RecordPayload) {
        let body = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(record_id = record.id, error = %e, "cannot serialize payload for replay");
                return;
            }
        };

        let req = NewOfflineRequest {
            url: self.api.endpoint().to_string(),
            method: "POST".to_string(),
            payload: body,
            timestamp: self.clock.now_ms(),
            record_id: Some(record.id),
        };

        match self.store.enqueue_request(req) {
            Ok(queued) => debug!(
                request_id = queued.id,
                record_id = record.id,
                "request stored for replay"
            ),
            Err(e) => warn!(record_id = record.id, error = %e, "failed to queue offline request"),
        }
    }

    // ------------------------------------------------
    // Download / merge
    // ------------------------------------------------

    /// Fetch server records newer than the watermark and merge them.
    ///
    /// The watermark moves only after every record merged; it is set to the
    /// instant the pass started, so records created server-side during the
    /// fetch are picked up next time.
    pub async fn download_records(&self) -> AppResult<Vec<ServerRecord>> {
        let (records, _) = self.download_pass().await?;
        Ok(records)
    }

    async fn download_pass(&self) -> AppResult<(Vec<ServerRecord>, usize)> {
        if !self.is_online() {
            debug!("cannot download records while offline");
            return Ok((Vec::new(), 0));
        }

        let started = self.clock.now_ms();
        let since = self.store.last_sync_time()?;

        let records = self
            .api
            .fetch_since(since)
            .await
            .map_err(|e| AppError::DownloadFailed(e.to_string()))?;
        info!(count = records.len(), since, "downloaded records from server");

        let mut inserted = 0;
        for server in &records {
            match self.merge_record(server) {
                Ok(MergeOutcome::Inserted(_)) => inserted += 1,
                Ok(MergeOutcome::Duplicate) => {}
                Err(AppError::InvalidDate(detail)) => {
                    warn!(server_id = ?server.id, %detail, "server record rejected");
                }
                Err(e) => return Err(e),
            }
        }

        self.store.set_last_sync_time(started)?;
        self.events.emit(SyncEvent::DownloadFinished {
            fetched: records.len(),
            inserted,
        });

        Ok((records, inserted))
    }

    /// Insert a server record unless a local record on the same date has
    /// the same `(timestamp, type)`. Exact match only: clock-skewed
    /// near-duplicates are kept as distinct records.
    ///
    /// A timestamp outside the calendar range is rejected with `InvalidDate`.
    pub fn merge_record(&self, server: &ServerRecord) -> AppResult<MergeOutcome> {
        if date::checked_date_from_millis(server.record.timestamp).is_none() {
            return Err(AppError::InvalidDate(format!(
                "timestamp {} is out of range",
                server.record.timestamp
            )));
        }

        let new = NewRecord::from(server);
        let date = new.resolved_date();

        if self
            .store
            .has_record(&date, server.record.timestamp, server.record.kind)?
        {
            debug!(
                timestamp = server.record.timestamp,
                kind = %server.record.kind,
                "duplicate server record skipped"
            );
            return Ok(MergeOutcome::Duplicate);
        }

        let stored = self.store.insert(new)?;
        debug!(id = stored.id, server_id = ?server.id, "merged record from server");
        Ok(MergeOutcome::Inserted(stored))
    }

    // ------------------------------------------------
    // Full sync
    // ------------------------------------------------

    /// Download, then upload every unsynced record. Unlike `sync_now`, the
    /// first failure aborts the whole operation.
    pub async fn perform_full_sync(&self) -> AppResult<FullSyncReport> {
        if !self.is_online() {
            return Err(AppError::Offline(
                "cannot perform full sync while offline".into(),
            ));
        }
        let Some(_pass) = self.try_begin_pass() else {
            return Err(AppError::SyncInProgress);
        };

        info!("starting full sync");

        let (downloaded, inserted) = self.download_pass().await?;

        let pending = self.store.get_unsynced()?;
        for record in &pending {
            self.sync_record(record).await?;
        }

        let report = FullSyncReport {
            downloaded: downloaded.len(),
            inserted,
            uploaded: pending.len(),
        };
        info!(?report, "full sync completed");
        self.store.audit(
            "sync",
            "full",
            &format!(
                "Downloaded {} ({} new), uploaded {}",
                report.downloaded, report.inserted, report.uploaded
            ),
        );

        Ok(report)
    }

    pub fn status(&self) -> AppResult<SyncStatus> {
        let online = self.is_online();
        let in_progress = self.is_sync_in_progress();

        Ok(SyncStatus {
            online,
            sync_in_progress: in_progress,
            last_sync_time: self.store.last_sync_time()?,
            can_sync: online && !in_progress,
            unsynced: self.store.unsynced_count()?,
        })
    }
}
