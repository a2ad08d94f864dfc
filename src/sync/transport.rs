//! Transport to the remote attendance service.
//!
//! The engine only talks to [`AttendanceApi`]; [`HttpApi`] is the `reqwest`
//! implementation, tests plug in scripted fakes.

use crate::models::record::{RecordPayload, ServerRecord};
use reqwest::{Client, Method, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single request, classified for the retry/offline policy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Nothing reached the server (DNS, refused, reset, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The server answered 2xx with a body we could not read.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn is_network(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

pub trait AttendanceApi: Send + Sync {
    /// Endpoint URL used for uploads; stored with queued offline requests.
    fn endpoint(&self) -> &str;

    /// `POST {endpoint}`; resolves to the (opaque) acknowledgement body.
    fn post_record(
        &self,
        payload: &RecordPayload,
    ) -> impl Future<Output = TransportResult<serde_json::Value>> + Send;

    /// `GET {endpoint}?since={since}`.
    fn fetch_since(
        &self,
        since: i64,
    ) -> impl Future<Output = TransportResult<Vec<ServerRecord>>> + Send;

    /// `HEAD {endpoint}/health`; `Ok(true)` on 2xx.
    fn health(&self) -> impl Future<Output = TransportResult<bool>> + Send;

    /// Re-send a stored request verbatim.
    fn replay(
        &self,
        url: &str,
        method: &str,
        payload: &serde_json::Value,
    ) -> impl Future<Output = TransportResult<()>> + Send;
}

/// `reqwest` client bound to one attendance endpoint.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    endpoint: String,
}

impl HttpApi {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.endpoint)
    }
}

fn ensure_success(resp: &reqwest::Response) -> TransportResult<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    Err(TransportError::Http {
        status: status.as_u16(),
        message: status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    })
}

/// Acknowledgement bodies are opaque; an empty body becomes `null`.
async fn read_ack(resp: reqwest::Response) -> TransportResult<serde_json::Value> {
    if resp.status() == StatusCode::NO_CONTENT {
        return Ok(serde_json::Value::Null);
    }

    let body = resp.text().await?;
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
}

impl AttendanceApi for HttpApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_record(&self, payload: &RecordPayload) -> TransportResult<serde_json::Value> {
        let resp = self.client.post(&self.endpoint).json(payload).send().await?;
        ensure_success(&resp)?;
        read_ack(resp).await
    }

    async fn fetch_since(&self, since: i64) -> TransportResult<Vec<ServerRecord>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("since", since)])
            .send()
            .await?;
        ensure_success(&resp)?;

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn health(&self) -> TransportResult<bool> {
        let resp = self
            .client
            .head(self.health_url())
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    async fn replay(
        &self,
        url: &str,
        method: &str,
        payload: &serde_json::Value,
    ) -> TransportResult<()> {
        let method = Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|e| TransportError::Decode(format!("invalid method '{}': {}", method, e)))?;

        let resp = self
            .client
            .request(method, url)
            .json(payload)
            .send()
            .await?;
        ensure_success(&resp)
    }
}
