#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use rattendance::core::clock::FixedClock;
use rattendance::db::store::LocalStore;
use rattendance::models::record::{RecordPayload, ServerRecord};
use rattendance::models::record_type::RecordType;
use rattendance::sync::engine::{RetryPolicy, SyncEngine};
use rattendance::sync::transport::{AttendanceApi, TransportError, TransportResult};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Nothing listens on the discard port: every request fails fast.
pub const UNREACHABLE: &str = "http://127.0.0.1:9/api/attendance";

/// 2024-03-06T09:00:00Z, a Wednesday.
pub const WED_9AM: i64 = 1_709_715_600_000;
pub const MINUTE: i64 = 60_000;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;

pub fn rat() -> Command {
    let mut cmd = cargo_bin_cmd!("rattendance");
    cmd.env("RUST_LOG", "off");
    cmd
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rattendance.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    fs::remove_file(format!("{}-wal", db_path)).ok();
    fs::remove_file(format!("{}-shm", db_path)).ok();
    db_path
}

/// `init` a fresh database through the CLI.
pub fn init_db(db_path: &str) {
    rat()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

pub fn temp_store() -> (LocalStore, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("attendance.sqlite");
    let store = LocalStore::open(&path.to_string_lossy()).expect("open store");
    (store, dir)
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1000),
        schedule_retry: Duration::from_secs(30),
    }
}

pub fn network_error() -> TransportError {
    TransportError::Network("connection refused".into())
}

pub fn server_error() -> TransportError {
    TransportError::Http {
        status: 500,
        message: "Internal Server Error".into(),
    }
}

pub fn server_record(kind: RecordType, timestamp: i64, date: &str) -> ServerRecord {
    ServerRecord {
        id: Some(json!(format!("srv-{}", timestamp))),
        record: RecordPayload {
            kind,
            timestamp,
            date: date.to_string(),
            location: None,
        },
    }
}

/// Scripted stand-in for the remote attendance service.
///
/// Each scripted queue is consumed front to back; once empty, calls succeed.
pub struct MockApi {
    endpoint: String,
    post_script: Mutex<VecDeque<TransportResult<Value>>>,
    replay_script: Mutex<VecDeque<TransportResult<()>>>,
    fetch_result: Mutex<Option<TransportResult<Vec<ServerRecord>>>>,
    healthy: AtomicBool,
    post_calls: AtomicUsize,
    health_calls: AtomicUsize,
    posted: Mutex<Vec<RecordPayload>>,
    replayed: Mutex<Vec<(String, String, Value)>>,
    fetched_since: Mutex<Vec<i64>>,
    post_hook: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            endpoint: "http://mock.test/api/attendance".to_string(),
            post_script: Mutex::new(VecDeque::new()),
            replay_script: Mutex::new(VecDeque::new()),
            fetch_result: Mutex::new(None),
            healthy: AtomicBool::new(true),
            post_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            posted: Mutex::new(Vec::new()),
            replayed: Mutex::new(Vec::new()),
            fetched_since: Mutex::new(Vec::new()),
            post_hook: Mutex::new(None),
        }
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(self, script: Vec<TransportResult<Value>>) -> Self {
        *self.post_script.lock().unwrap() = script.into();
        self
    }

    pub fn with_replays(self, script: Vec<TransportResult<()>>) -> Self {
        *self.replay_script.lock().unwrap() = script.into();
        self
    }

    pub fn with_fetch(self, result: TransportResult<Vec<ServerRecord>>) -> Self {
        *self.fetch_result.lock().unwrap() = Some(result);
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Run `hook` once, inside the next `post_record` call.
    pub fn set_post_hook(&self, hook: impl FnOnce() + Send + 'static) {
        *self.post_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn post_calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn posted(&self) -> Vec<RecordPayload> {
        self.posted.lock().unwrap().clone()
    }

    pub fn replayed(&self) -> Vec<(String, String, Value)> {
        self.replayed.lock().unwrap().clone()
    }

    pub fn fetched_since(&self) -> Vec<i64> {
        self.fetched_since.lock().unwrap().clone()
    }
}

impl AttendanceApi for MockApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_record(&self, payload: &RecordPayload) -> TransportResult<Value> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        self.posted.lock().unwrap().push(payload.clone());
        let hook = self.post_hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        let next = self.post_script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(json!({ "ok": true })))
    }

    async fn fetch_since(&self, since: i64) -> TransportResult<Vec<ServerRecord>> {
        self.fetched_since.lock().unwrap().push(since);
        self.fetch_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn health(&self) -> TransportResult<bool> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.healthy.load(Ordering::SeqCst))
    }

    async fn replay(&self, url: &str, method: &str, payload: &Value) -> TransportResult<()> {
        self.replayed
            .lock()
            .unwrap()
            .push((url.to_string(), method.to_string(), payload.clone()));
        let next = self.replay_script.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }
}

pub struct Harness {
    pub engine: Arc<SyncEngine<MockApi>>,
    pub clock: Arc<FixedClock>,
    pub _dir: TempDir,
}

impl Harness {
    pub fn new(api: MockApi, online: bool) -> Self {
        let (store, dir) = temp_store();
        let clock = Arc::new(FixedClock::new(WED_9AM));
        let engine = Arc::new(
            SyncEngine::new(store, api, fast_policy(), online).with_clock(clock.clone()),
        );
        Self {
            engine,
            clock,
            _dir: dir,
        }
    }

    pub fn store(&self) -> &LocalStore {
        self.engine.store()
    }

    pub fn api(&self) -> &MockApi {
        self.engine.api()
    }
}
