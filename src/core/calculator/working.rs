use crate::models::record::AttendanceRecord;
use crate::models::record_type::RecordType;

/// Total minutes worked across matched check-in → check-out pairs.
///
/// Records are walked in timestamp order:
/// - a check-in opens (or re-opens) the current session
/// - a check-out closes the open session and adds its length
/// - a check-out with no open session is ignored
/// - a trailing open check-in contributes nothing
pub fn compute_working_minutes(records: &[AttendanceRecord]) -> f64 {
    let mut sorted: Vec<&AttendanceRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.timestamp);

    let mut total_ms: i64 = 0;
    let mut open_in: Option<i64> = None;

    for rec in sorted {
        match rec.kind {
            RecordType::CheckIn => open_in = Some(rec.timestamp),
            RecordType::CheckOut => {
                if let Some(start) = open_in.take() {
                    total_ms += rec.timestamp - start;
                }
            }
        }
    }

    total_ms as f64 / 60_000.0
}
