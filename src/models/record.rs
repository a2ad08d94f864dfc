use super::{location::Location, record_type::RecordType};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A stored attendance record (one row of `attendance`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub id: i64,                    // ⇔ attendance.id (AUTOINCREMENT)
    #[serde(rename = "type")]
    pub kind: RecordType,           // ⇔ attendance.type ('check-in' | 'check-out')
    pub timestamp: i64,             // ⇔ attendance.timestamp (ms since epoch)
    pub date: NaiveDate,            // ⇔ attendance.date (TEXT "YYYY-MM-DD")
    pub location: Option<Location>, // ⇔ attendance.location (JSON or NULL)
    pub synced: bool,               // ⇔ attendance.synced (0/1)
}

impl AttendanceRecord {
    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Creation instant in the local timezone, for display.
    pub fn local_time(&self) -> Option<DateTime<Local>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp).map(|dt| dt.with_timezone(&Local))
    }

    pub fn time_str(&self) -> String {
        self.local_time()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string())
    }

    /// Body of `POST {endpoint}`.
    pub fn payload(&self) -> RecordPayload {
        RecordPayload {
            kind: self.kind,
            timestamp: self.timestamp,
            date: self.date_str(),
            location: self.location.clone(),
        }
    }
}

/// Wire shape shared by uploads and downloads: `{type, timestamp, date, location}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
    #[serde(rename = "type")]
    pub kind: RecordType,
    pub timestamp: i64,
    pub date: String,
    #[serde(default)]
    pub location: Option<Location>,
}

/// A record as returned by `GET {endpoint}?since=`: the payload plus the
/// server's own identifier, which is opaque to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(flatten)]
    pub record: RecordPayload,
}

/// Builder for records about to be inserted.
///
/// Defaults are applied only to fields left unset:
/// - `date` is derived from `timestamp` (UTC calendar day)
/// - `synced` is `false`
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub kind: RecordType,
    pub timestamp: i64,
    pub date: Option<NaiveDate>,
    pub location: Option<Location>,
    pub synced: Option<bool>,
}

impl NewRecord {
    pub fn new(kind: RecordType, timestamp: i64) -> Self {
        Self {
            kind,
            timestamp,
            date: None,
            location: None,
            synced: None,
        }
    }

    pub fn check_in(timestamp: i64) -> Self {
        Self::new(RecordType::CheckIn, timestamp)
    }

    pub fn check_out(timestamp: i64) -> Self {
        Self::new(RecordType::CheckOut, timestamp)
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    pub fn synced(mut self, synced: bool) -> Self {
        self.synced = Some(synced);
        self
    }

    /// Date the record will be stored under.
    pub fn resolved_date(&self) -> NaiveDate {
        self.date
            .unwrap_or_else(|| crate::utils::date::date_from_millis(self.timestamp))
    }

    pub fn resolved_synced(&self) -> bool {
        self.synced.unwrap_or(false)
    }
}

impl From<&ServerRecord> for NewRecord {
    /// Server records are inserted as already synced; an unparsable `date`
    /// falls back to the date derived from `timestamp`.
    fn from(server: &ServerRecord) -> Self {
        let mut rec = NewRecord::new(server.record.kind, server.record.timestamp)
            .with_location(server.record.location.clone())
            .synced(true);

        if let Some(d) = crate::utils::date::parse_date(&server.record.date) {
            rec = rec.with_date(d);
        }
        rec
    }
}
