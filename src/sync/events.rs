//! Typed event bus between the sync engine and UI-facing consumers.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::broadcast;

/// Buffered events per subscriber before the slowest one starts lagging.
pub const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    /// `(record id, error)` for every record that exhausted its retries.
    pub failed: Vec<(i64, String)>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SyncEvent {
    ConnectivityChanged { online: bool },
    SyncStarted { pending: usize },
    RecordSynced { record_id: i64 },
    RetryScheduled {
        record_id: i64,
        attempt: u32,
        #[serde(with = "millis")]
        delay: Duration,
    },
    SyncFinished { report: SyncReport },
    DownloadFinished { fetched: usize, inserted: usize },
    /// A background pass (queue replay + sync) completed.
    SyncComplete { replayed: usize, remaining: usize },
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget; having no subscribers is not an error.
    pub fn emit(&self, event: SyncEvent) {
        tracing::trace!(?event, "sync event");
        let _ = self.tx.send(event);
    }
}
