use chrono::NaiveDate;
use rattendance::db::log::load_log;
use rattendance::db::migrate::applied_versions;
use rattendance::db::store::LocalStore;
use rattendance::errors::AppError;
use rattendance::models::location::Location;
use rattendance::models::offline_request::NewOfflineRequest;
use rattendance::models::query::{RecordQuery, SortOrder};
use rattendance::models::record::{AttendanceRecord, NewRecord};
use rattendance::models::record_type::RecordType;
use serde_json::json;

mod common;
use common::{DAY, HOUR, MINUTE, WED_9AM, temp_store};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn rec(id: i64, kind: RecordType, timestamp: i64) -> AttendanceRecord {
    AttendanceRecord {
        id,
        kind,
        timestamp,
        date: d("2024-03-06"),
        location: None,
        synced: false,
    }
}

fn queued_for(record_id: i64) -> NewOfflineRequest {
    NewOfflineRequest {
        url: "http://mock.test/api/attendance".into(),
        method: "POST".into(),
        payload: json!({ "type": "check-in" }),
        timestamp: WED_9AM,
        record_id: Some(record_id),
    }
}

#[test]
fn insert_fills_defaults_and_round_trips_by_date() {
    let (store, _dir) = temp_store();

    let loc = Location::from_coordinates(45.0, 7.0, 12.0, "config");
    let stored = store
        .insert(NewRecord::check_in(WED_9AM).with_location(Some(loc.clone())))
        .unwrap();

    assert!(stored.id > 0);
    assert_eq!(stored.date, d("2024-03-06"));
    assert!(!stored.synced);

    let found = store.query(&RecordQuery::on(d("2024-03-06"))).unwrap();
    assert_eq!(found, vec![stored.clone()]);
    assert_eq!(found[0].location, Some(loc));

    assert!(store.query(&RecordQuery::on(d("2024-03-07"))).unwrap().is_empty());
}

#[test]
fn date_is_the_utc_day_of_the_timestamp() {
    let (store, _dir) = temp_store();

    // 23:30 UTC on March 6th
    let late = store.insert(NewRecord::check_out(WED_9AM + 14 * HOUR + 30 * MINUTE)).unwrap();
    assert_eq!(late.date, d("2024-03-06"));

    let explicit = store
        .insert(NewRecord::check_in(WED_9AM).with_date(d("2024-03-05")))
        .unwrap();
    assert_eq!(explicit.date, d("2024-03-05"));
}

#[test]
fn ids_increase_monotonically() {
    let (store, _dir) = temp_store();
    let a = store.insert(NewRecord::check_in(WED_9AM)).unwrap();
    let b = store.insert(NewRecord::check_out(WED_9AM + HOUR)).unwrap();
    store.delete_record(b.id).unwrap();
    let c = store.insert(NewRecord::check_in(WED_9AM + 2 * HOUR)).unwrap();

    assert!(b.id > a.id);
    assert!(c.id > b.id);
}

#[test]
fn range_wins_over_exact_date() {
    let (store, _dir) = temp_store();
    store.insert(NewRecord::check_in(WED_9AM - DAY)).unwrap();
    store.insert(NewRecord::check_in(WED_9AM)).unwrap();
    store.insert(NewRecord::check_in(WED_9AM + DAY)).unwrap();

    let mut q = RecordQuery::between(d("2024-03-05"), d("2024-03-06"));
    q.exact_date = Some(d("2024-03-07"));

    let found = store.query(&q).unwrap();
    let dates: Vec<String> = found.iter().map(|r| r.date_str()).collect();
    assert_eq!(dates, vec!["2024-03-05", "2024-03-06"]);
}

#[test]
fn limit_applies_after_ordering() {
    let (store, _dir) = temp_store();
    for i in 0..5 {
        store.insert(NewRecord::check_in(WED_9AM + i * HOUR)).unwrap();
    }

    let newest = store
        .query(&RecordQuery::all().order(SortOrder::Desc).limit(2))
        .unwrap();
    let ts: Vec<i64> = newest.iter().map(|r| r.timestamp).collect();
    assert_eq!(ts, vec![WED_9AM + 4 * HOUR, WED_9AM + 3 * HOUR]);

    let oldest = store.query(&RecordQuery::all().limit(1)).unwrap();
    assert_eq!(oldest[0].timestamp, WED_9AM);
}

#[test]
fn most_recent_is_by_timestamp_not_id() {
    let (store, _dir) = temp_store();
    assert!(store.get_most_recent_by_timestamp().unwrap().is_none());

    store.insert(NewRecord::check_out(WED_9AM + HOUR)).unwrap();
    store.insert(NewRecord::check_in(WED_9AM)).unwrap();

    let latest = store.get_most_recent_by_timestamp().unwrap().unwrap();
    assert_eq!(latest.timestamp, WED_9AM + HOUR);
    assert_eq!(latest.kind, RecordType::CheckOut);
}

#[test]
fn unsynced_are_returned_oldest_first() {
    let (store, _dir) = temp_store();
    let later = store.insert(NewRecord::check_out(WED_9AM + HOUR)).unwrap();
    let earlier = store.insert(NewRecord::check_in(WED_9AM)).unwrap();
    store.insert(NewRecord::check_in(WED_9AM + 2 * HOUR).synced(true)).unwrap();

    let pending = store.get_unsynced().unwrap();
    let ids: Vec<i64> = pending.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![earlier.id, later.id]);
    assert_eq!(store.unsynced_count().unwrap(), 2);
}

#[test]
fn mark_synced_is_idempotent() {
    let (store, _dir) = temp_store();
    let r = store.insert(NewRecord::check_in(WED_9AM)).unwrap();

    let first = store.mark_synced(r.id).unwrap();
    let second = store.mark_synced(r.id).unwrap();

    assert!(first.synced);
    assert_eq!(first, second);
    assert_eq!(store.unsynced_count().unwrap(), 0);
}

#[test]
fn mark_synced_unknown_id_is_not_found() {
    let (store, _dir) = temp_store();
    assert!(matches!(store.mark_synced(42), Err(AppError::NotFound(42))));
}

#[test]
fn mark_synced_drops_queued_replays_of_the_record() {
    let (store, _dir) = temp_store();
    let a = store.insert(NewRecord::check_in(WED_9AM)).unwrap();
    let b = store.insert(NewRecord::check_out(WED_9AM + HOUR)).unwrap();

    store.enqueue_request(queued_for(a.id)).unwrap();
    store.enqueue_request(queued_for(b.id)).unwrap();

    store.mark_synced(a.id).unwrap();

    let pending = store.pending_requests().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].record_id, Some(b.id));
}

#[test]
fn queue_keeps_one_entry_per_record_in_insertion_order() {
    let (store, _dir) = temp_store();
    let a = store.insert(NewRecord::check_in(WED_9AM)).unwrap();
    let b = store.insert(NewRecord::check_out(WED_9AM + HOUR)).unwrap();

    store.enqueue_request(queued_for(a.id)).unwrap();
    store.enqueue_request(queued_for(b.id)).unwrap();
    store.enqueue_request(queued_for(a.id)).unwrap();

    let pending = store.pending_requests().unwrap();
    let records: Vec<Option<i64>> = pending.iter().map(|r| r.record_id).collect();
    assert_eq!(records, vec![Some(b.id), Some(a.id)]);

    store.delete_request(pending[0].id).unwrap();
    assert_eq!(store.pending_requests().unwrap().len(), 1);
}

#[test]
fn delete_and_clear() {
    let (store, _dir) = temp_store();
    let a = store.insert(NewRecord::check_in(WED_9AM)).unwrap();
    store.insert(NewRecord::check_out(WED_9AM + HOUR)).unwrap();
    store.enqueue_request(queued_for(a.id)).unwrap();

    store.delete_record(a.id).unwrap();
    assert!(matches!(store.get(a.id), Err(AppError::NotFound(_))));
    assert!(matches!(store.delete_record(a.id), Err(AppError::NotFound(_))));
    assert!(store.pending_requests().unwrap().is_empty());

    store.clear().unwrap();
    assert_eq!(store.record_count().unwrap(), 0);
}

#[test]
fn week_runs_sunday_to_saturday() {
    let (store, _dir) = temp_store();
    // Sat 2024-03-02, Sun 03-03, Wed 03-06, Sat 03-09, Sun 03-10
    for offset in [-4, -3, 0, 3, 4] {
        store.insert(NewRecord::check_in(WED_9AM + offset * DAY)).unwrap();
    }

    let week = store.records_for_week(d("2024-03-06")).unwrap();
    let dates: Vec<String> = week.iter().map(|r| r.date_str()).collect();
    assert_eq!(dates, vec!["2024-03-03", "2024-03-06", "2024-03-09"]);

    assert_eq!(store.records_for_day(d("2024-03-06")).unwrap().len(), 1);
}

#[test]
fn watermark_defaults_to_zero_and_persists() {
    let (store, _dir) = temp_store();
    assert_eq!(store.last_sync_time().unwrap(), 0);

    store.set_last_sync_time(WED_9AM).unwrap();
    assert_eq!(store.last_sync_time().unwrap(), WED_9AM);
}

#[test]
fn migrations_are_recorded_once() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("m.sqlite").to_string_lossy().to_string();

    let first = LocalStore::open(&path).unwrap();
    let count = |s: &LocalStore| {
        s.pool()
            .with_conn(|conn| load_log(conn))
            .unwrap()
            .iter()
            .filter(|(_, _, op, _, _)| op == "migration_applied")
            .count()
    };
    let applied = count(&first);
    let versions = first.pool().with_conn(|conn| applied_versions(conn)).unwrap();
    assert_eq!(versions.len(), applied);
    assert!(applied > 0);
    drop(first);

    let reopened = LocalStore::open(&path).unwrap();
    assert_eq!(count(&reopened), applied);
}

#[test]
fn working_minutes_pairs_each_checkout_with_open_checkin() {
    let records = vec![
        rec(1, RecordType::CheckIn, WED_9AM),
        rec(2, RecordType::CheckOut, WED_9AM + 3 * HOUR),
        rec(3, RecordType::CheckIn, WED_9AM + 4 * HOUR),
        rec(4, RecordType::CheckOut, WED_9AM + 8 * HOUR),
    ];
    assert_eq!(LocalStore::compute_working_minutes(&records), 420.0);
}

#[test]
fn working_minutes_ignores_orphans_and_trailing_checkin() {
    let records = vec![
        rec(1, RecordType::CheckOut, WED_9AM - HOUR),
        rec(2, RecordType::CheckIn, WED_9AM),
        rec(3, RecordType::CheckOut, WED_9AM + 90 * MINUTE),
        rec(4, RecordType::CheckIn, WED_9AM + 2 * HOUR),
    ];
    assert_eq!(LocalStore::compute_working_minutes(&records), 90.0);
    assert_eq!(LocalStore::compute_working_minutes(&[]), 0.0);
}

#[test]
fn working_minutes_sorts_input_and_reopens_on_repeated_checkin() {
    let records = vec![
        rec(3, RecordType::CheckOut, WED_9AM + 2 * HOUR),
        rec(2, RecordType::CheckIn, WED_9AM + HOUR),
        rec(1, RecordType::CheckIn, WED_9AM),
    ];
    // the second check-in replaces the first
    assert_eq!(LocalStore::compute_working_minutes(&records), 60.0);
}
