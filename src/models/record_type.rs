use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an attendance record. Serialized as `"check-in"` / `"check-out"`
/// both on the wire and in the `attendance.type` column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RecordType {
    #[serde(rename = "check-in")]
    CheckIn,
    #[serde(rename = "check-out")]
    CheckOut,
}

impl RecordType {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RecordType::CheckIn => "check-in",
            RecordType::CheckOut => "check-out",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "check-in" => Some(RecordType::CheckIn),
            "check-out" => Some(RecordType::CheckOut),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordType::CheckIn => "Check In",
            RecordType::CheckOut => "Check Out",
        }
    }

    pub fn is_in(&self) -> bool {
        matches!(self, RecordType::CheckIn)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}
