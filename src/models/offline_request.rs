use serde::Serialize;

/// A non-idempotent request that failed to reach the network and waits in
/// `offline_requests` for replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfflineRequest {
    pub id: i64,
    pub url: String,
    pub method: String,
    pub payload: serde_json::Value,
    pub timestamp: i64,
    /// Local record carried by this request, if any.
    pub record_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewOfflineRequest {
    pub url: String,
    pub method: String,
    pub payload: serde_json::Value,
    pub timestamp: i64,
    pub record_id: Option<i64>,
}
