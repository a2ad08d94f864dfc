//! Background sync trigger.
//!
//! Receives deferred sync requests from the engine, replays queued offline
//! requests, runs a batch upload and announces completion on the event bus.

use crate::errors::{AppError, AppResult};
use crate::sync::engine::{SyncEngine, SyncNowOutcome, SyncRequest};
use crate::sync::events::SyncEvent;
use crate::sync::transport::AttendanceApi;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplayReport {
    pub replayed: usize,
    pub remaining: usize,
}

/// Result of one background pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub replay: ReplayReport,
    pub outcome: SyncNowOutcome,
}

/// Re-send every queued offline request in insertion order.
///
/// A delivered request is removed from the queue and, when it carried a
/// record, that record is marked synced. Failed requests stay queued.
pub async fn replay_pending<A: AttendanceApi + 'static>(
    engine: &SyncEngine<A>,
) -> AppResult<ReplayReport> {
    let store = engine.store();
    let pending = store.pending_requests()?;
    let mut report = ReplayReport::default();

    for req in pending {
        match engine.api().replay(&req.url, &req.method, &req.payload).await {
            Ok(()) => {
                store.delete_request(req.id)?;
                report.replayed += 1;
                debug!(request_id = req.id, "synced offline request");

                if let Some(record_id) = req.record_id {
                    match store.mark_synced(record_id) {
                        Ok(_) => engine.events().emit(SyncEvent::RecordSynced { record_id }),
                        // purged locally since it was queued
                        Err(AppError::NotFound(_)) => {}
                        Err(e) => return Err(e),
                    }
                }
            }
            Err(e) => {
                report.remaining += 1;
                warn!(request_id = req.id, error = %e, "failed to replay offline request");
            }
        }
    }

    Ok(report)
}

pub struct BackgroundSync<A: AttendanceApi> {
    engine: Arc<SyncEngine<A>>,
    rx: mpsc::UnboundedReceiver<SyncRequest>,
}

impl<A: AttendanceApi + 'static> BackgroundSync<A> {
    /// Register a fresh trigger with `engine`; later `schedule_sync` calls
    /// are delivered here instead of running inline.
    pub fn attach(engine: &Arc<SyncEngine<A>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        engine.register_deferred(tx);
        Self {
            engine: Arc::clone(engine),
            rx,
        }
    }

    pub fn spawn(engine: &Arc<SyncEngine<A>>) -> JoinHandle<()> {
        let trigger = Self::attach(engine);
        tokio::spawn(trigger.run())
    }

    pub async fn run(mut self) {
        while self.rx.recv().await.is_some() {
            // requests that piled up meanwhile are served by this pass
            while self.rx.try_recv().is_ok() {}

            if let Err(e) = self.run_once().await {
                warn!(error = %e, "background sync failed");
            }
        }
        debug!("background sync trigger stopped");
    }

    /// One background pass: replay, batch upload, notify.
    pub async fn run_once(&self) -> AppResult<PassReport> {
        let replay = replay_pending(&self.engine).await?;
        let outcome = self.engine.sync_now().await?;
        debug!(?outcome, "background batch sync finished");

        info!(
            replayed = replay.replayed,
            remaining = replay.remaining,
            "background sync completed"
        );
        self.engine.events().emit(SyncEvent::SyncComplete {
            replayed: replay.replayed,
            remaining: replay.remaining,
        });

        Ok(PassReport { replay, outcome })
    }
}

/// Schedule a sync pass every `every`, starting one period from now.
///
/// Connectivity changes alone only sync on reconnect; this picks up records
/// left unsynced while the server stayed reachable.
pub fn spawn_periodic<A: AttendanceApi + 'static>(
    engine: &Arc<SyncEngine<A>>,
    every: Duration,
) -> JoinHandle<()> {
    let engine = Arc::clone(engine);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let outcome = engine.schedule_sync().await;
            debug!(?outcome, "periodic sync");
        }
    })
}
