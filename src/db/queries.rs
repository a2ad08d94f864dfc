use crate::errors::{AppError, AppResult};
use crate::models::location::Location;
use crate::models::query::{RecordQuery, SortOrder};
use crate::models::record::{AttendanceRecord, NewRecord};
use crate::models::record_type::RecordType;
use chrono::{Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension, Result, Row, params, params_from_iter};

const SELECT_RECORD: &str = "SELECT id, type, timestamp, date, location, synced FROM attendance";

fn conversion_error(col: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(err))
}

pub fn map_row(row: &Row) -> Result<AttendanceRecord> {
    let kind_str: String = row.get("type")?;
    let kind = RecordType::from_db_str(&kind_str)
        .ok_or_else(|| conversion_error(1, AppError::InvalidRecordType(kind_str.clone())))?;

    let date_str: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|_| conversion_error(3, AppError::InvalidDate(date_str.clone())))?;

    let loc_json: Option<String> = row.get("location")?;
    let location = match loc_json {
        Some(s) => Some(
            serde_json::from_str::<Location>(&s).map_err(|e| conversion_error(4, e.into()))?,
        ),
        None => None,
    };

    Ok(AttendanceRecord {
        id: row.get("id")?,
        kind,
        timestamp: row.get("timestamp")?,
        date,
        location,
        synced: row.get::<_, i32>("synced")? == 1,
    })
}

fn collect(
    rows: impl Iterator<Item = Result<AttendanceRecord>>,
) -> AppResult<Vec<AttendanceRecord>> {
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn insert_record(conn: &Connection, rec: &NewRecord) -> AppResult<AttendanceRecord> {
    let date = rec.resolved_date();
    let synced = rec.resolved_synced();
    let location_json = match &rec.location {
        Some(loc) => Some(serde_json::to_string(loc)?),
        None => None,
    };

    conn.execute(
        "INSERT INTO attendance (type, timestamp, date, location, synced, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            rec.kind.to_db_str(),
            rec.timestamp,
            date.format("%Y-%m-%d").to_string(),
            location_json,
            if synced { 1 } else { 0 },
            Local::now().to_rfc3339(),
        ],
    )?;

    Ok(AttendanceRecord {
        id: conn.last_insert_rowid(),
        kind: rec.kind,
        timestamp: rec.timestamp,
        date,
        location: rec.location.clone(),
        synced,
    })
}

pub fn load_record(conn: &Connection, id: i64) -> AppResult<Option<AttendanceRecord>> {
    let sql = format!("{} WHERE id = ?1", SELECT_RECORD);
    Ok(conn.query_row(&sql, [id], map_row).optional()?)
}

pub fn query_records(conn: &Connection, q: &RecordQuery) -> AppResult<Vec<AttendanceRecord>> {
    let mut sql = String::from(SELECT_RECORD);
    let mut args: Vec<String> = Vec::new();

    // range wins over exact date
    if let Some((start, end)) = q.date_range {
        sql.push_str(" WHERE date BETWEEN ?1 AND ?2");
        args.push(start.format("%Y-%m-%d").to_string());
        args.push(end.format("%Y-%m-%d").to_string());
    } else if let Some(d) = q.exact_date {
        sql.push_str(" WHERE date = ?1");
        args.push(d.format("%Y-%m-%d").to_string());
    }

    match q.order {
        SortOrder::Asc => sql.push_str(" ORDER BY timestamp ASC, id ASC"),
        SortOrder::Desc => sql.push_str(" ORDER BY timestamp DESC, id DESC"),
    }

    if let Some(limit) = q.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), map_row)?;
    collect(rows)
}

pub fn load_most_recent(conn: &Connection) -> AppResult<Option<AttendanceRecord>> {
    let sql = format!("{} ORDER BY timestamp DESC, id DESC LIMIT 1", SELECT_RECORD);
    Ok(conn.query_row(&sql, [], map_row).optional()?)
}

pub fn load_unsynced(conn: &Connection) -> AppResult<Vec<AttendanceRecord>> {
    let sql = format!("{} WHERE synced = 0 ORDER BY timestamp ASC, id ASC", SELECT_RECORD);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_row)?;
    collect(rows)
}

pub fn count_unsynced(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM attendance WHERE synced = 0",
        [],
        |row| row.get(0),
    )?)
}

/// Set `synced = 1`. Returns the number of rows matched (0 or 1); an
/// already-synced row still matches, so the call is idempotent.
pub fn set_synced(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("UPDATE attendance SET synced = 1 WHERE id = ?1", [id])?)
}

pub fn delete_record(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM attendance WHERE id = ?1", [id])?)
}

/// True if a record on `date` already has this exact `(timestamp, type)`.
pub fn exists_on_date(
    conn: &Connection,
    date: &NaiveDate,
    timestamp: i64,
    kind: RecordType,
) -> AppResult<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM attendance
         WHERE date = ?1 AND timestamp = ?2 AND type = ?3
         LIMIT 1",
    )?;
    Ok(stmt.exists(params![
        date.format("%Y-%m-%d").to_string(),
        timestamp,
        kind.to_db_str()
    ])?)
}

pub fn count_records(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM attendance", [], |row| row.get(0))?)
}
