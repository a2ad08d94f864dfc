//! Queue of non-idempotent requests that could not reach the network.

use crate::errors::AppResult;
use crate::models::offline_request::{NewOfflineRequest, OfflineRequest};
use rusqlite::{Connection, Result, Row, params};

fn map_request(row: &Row) -> Result<OfflineRequest> {
    let payload: String = row.get("payload")?;
    let payload = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(OfflineRequest {
        id: row.get("id")?,
        url: row.get("url")?,
        method: row.get("method")?,
        payload,
        timestamp: row.get("timestamp")?,
        record_id: row.get("record_id")?,
    })
}

/// Append a request. A request carrying a record replaces any older queued
/// request for the same record, so a record is queued at most once.
pub fn enqueue(conn: &Connection, req: &NewOfflineRequest) -> AppResult<OfflineRequest> {
    let tx = conn.unchecked_transaction()?;

    if let Some(record_id) = req.record_id {
        tx.execute(
            "DELETE FROM offline_requests WHERE record_id = ?1",
            [record_id],
        )?;
    }

    tx.execute(
        "INSERT INTO offline_requests (url, method, payload, timestamp, record_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            req.url,
            req.method,
            serde_json::to_string(&req.payload)?,
            req.timestamp,
            req.record_id,
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    Ok(OfflineRequest {
        id,
        url: req.url.clone(),
        method: req.method.clone(),
        payload: req.payload.clone(),
        timestamp: req.timestamp,
        record_id: req.record_id,
    })
}

/// Pending requests in insertion order.
pub fn load_pending(conn: &Connection) -> AppResult<Vec<OfflineRequest>> {
    let mut stmt = conn.prepare(
        "SELECT id, url, method, payload, timestamp, record_id
         FROM offline_requests ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], map_request)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn delete_request(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM offline_requests WHERE id = ?1", [id])?)
}

pub fn delete_for_record(conn: &Connection, record_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM offline_requests WHERE record_id = ?1",
        [record_id],
    )?)
}
