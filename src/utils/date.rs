use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Today's calendar date. Record dates are UTC days, so "today" is too.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// UTC calendar date of a millisecond timestamp, `None` when out of range.
pub fn checked_date_from_millis(ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

/// UTC calendar date of a millisecond timestamp.
pub fn date_from_millis(ms: i64) -> NaiveDate {
    checked_date_from_millis(ms).unwrap_or_default()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Sunday..Saturday week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = date.weekday().num_days_from_sunday() as i64;
    let start = date - Duration::days(offset);
    let end = start + Duration::days(6);
    (start, end)
}
