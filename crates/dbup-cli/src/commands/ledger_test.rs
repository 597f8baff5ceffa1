use super::*;
use chrono::{TimeZone, Utc};

fn record(path: &str, state: UpdateState) -> UpdateRecord {
    UpdateRecord {
        path: path.to_string(),
        hash: "abcdef0123456789".to_string(),
        applied_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        speed_ms: 12,
        state,
        missing_runs: 0,
    }
}

#[test]
fn test_filter_records_keeps_all_by_default() {
    let records = vec![
        record("a.sql", UpdateState::Active),
        record("b.sql", UpdateState::Archived),
    ];
    assert_eq!(filter_records(records, false).len(), 2);
}

#[test]
fn test_filter_records_archived_only() {
    let records = vec![
        record("a.sql", UpdateState::Active),
        record("b.sql", UpdateState::Archived),
    ];
    let archived = filter_records(records, true);
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].path, "b.sql");
}

#[test]
fn test_records_serialize_for_json_output() {
    let value = serde_json::to_value(vec![record("a.sql", UpdateState::Archived)]).unwrap();
    assert_eq!(value[0]["path"], "a.sql");
    assert_eq!(value[0]["state"], "archived");
    assert_eq!(value[0]["speed_ms"], 12);
}
