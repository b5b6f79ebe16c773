//! End-to-end location familiarity scenarios: the curve, passive decay with
//! floors, idempotence, and rename merging.

mod helpers;

use helpers::{test_db, DAY_MS};
use memoria::config::LocationConfig;
use memoria::location::decay::apply_familiarity_decay_at;
use memoria::location::merge::merge_locations;
use memoria::location::query::{associated_locations, get_location};
use memoria::location::record::{record_access_at, RecordOptions};
use rusqlite::Connection;

fn config() -> LocationConfig {
    LocationConfig::default()
}

fn record(conn: &mut Connection, path: &str, now: i64) {
    record_access_at(conn, path, &RecordOptions::default(), &config(), now).unwrap();
}

#[test]
fn familiarity_lifecycle_from_growth_to_floor() {
    let mut conn = test_db();

    // 10 accesses → familiarity ≈ 0.5
    for i in 0..10 {
        record(&mut conn, "/src/engine.rs", i64::from(i) * 1000);
    }
    let grown = get_location(&conn, "/src/engine.rs", None).unwrap();
    assert!(grown.familiarity >= 0.49 && grown.familiarity <= 0.51);

    // 30 days of silence, one decay pass: 0.5 · 0.9
    let mut now = 31 * DAY_MS;
    let changed = apply_familiarity_decay_at(&conn, &config(), now).unwrap();
    assert_eq!(changed, 1);
    let decayed = get_location(&conn, "/src/engine.rs", None).unwrap();
    assert!(decayed.familiarity >= 0.44 && decayed.familiarity <= 0.46);

    // 1000 further days of periodic sweeps: settles on the ordinary floor
    // (the peak never crossed the sticky threshold)
    for _ in 0..32 {
        now += 31 * DAY_MS;
        apply_familiarity_decay_at(&conn, &config(), now).unwrap();
    }
    let settled = get_location(&conn, "/src/engine.rs", None).unwrap();
    assert!((settled.familiarity - 0.1).abs() < 1e-9);
    assert!(settled.familiarity >= 0.1, "never below the floor");
}

#[test]
fn decay_is_idempotent_between_accesses() {
    let mut conn = test_db();
    for i in 0..10 {
        record(&mut conn, "/idle.rs", i64::from(i) * 1000);
    }

    let now = 40 * DAY_MS;
    apply_familiarity_decay_at(&conn, &config(), now).unwrap();
    let once = get_location(&conn, "/idle.rs", None).unwrap().familiarity;

    // Re-running in the same stale window changes nothing
    let changed = apply_familiarity_decay_at(&conn, &config(), now + 1).unwrap();
    assert_eq!(changed, 0);
    let twice = get_location(&conn, "/idle.rs", None).unwrap().familiarity;
    assert_eq!(once, twice);
}

#[test]
fn once_well_known_keeps_the_elevated_floor() {
    let mut conn = test_db();
    // 60 accesses → familiarity ≈ 0.857, past the sticky threshold
    for i in 0..60 {
        record(&mut conn, "/core/api.rs", i64::from(i) * 1000);
    }

    let mut now = 0;
    for _ in 0..40 {
        now += 31 * DAY_MS;
        apply_familiarity_decay_at(&conn, &config(), now).unwrap();
    }

    let location = get_location(&conn, "/core/api.rs", None).unwrap();
    assert!((location.familiarity - 0.4).abs() < 1e-9);
}

#[test]
fn rename_merge_preserves_learning() {
    let mut conn = test_db();

    // Build familiarity and an association under the old path
    let base = 60_000;
    for i in 0..10 {
        record(&mut conn, "/old/name.rs", base + i64::from(i) * 1000);
    }
    record(&mut conn, "/companion.rs", base + 20_000);

    // The file moves; only the old path exists → rename in place
    let merged = merge_locations(&mut conn, "/old/name.rs", "/new/name.rs", None)
        .unwrap()
        .unwrap();
    assert_eq!(merged.path, "/new/name.rs");
    assert_eq!(merged.access_count, 10);
    assert!((merged.familiarity - 0.5).abs() < 1e-9);

    // The association followed the rename
    let associated = associated_locations(&conn, "/new/name.rs", None).unwrap();
    assert_eq!(associated.len(), 1);
    assert_eq!(associated[0].path, "/companion.rs");
}

#[test]
fn merge_of_divergent_histories_combines() {
    let mut conn = test_db();

    for i in 0..10 {
        record(&mut conn, "/copy-a.rs", i64::from(i) * 1000);
    }
    for i in 0..5 {
        record(&mut conn, "/copy-b.rs", 200 * DAY_MS + i64::from(i) * 1000);
    }

    let merged = merge_locations(&mut conn, "/copy-a.rs", "/copy-b.rs", None)
        .unwrap()
        .unwrap();

    assert_eq!(merged.access_count, 15);
    // Max of the two familiarities: curve(10) = 0.5 beats curve(5)
    assert!((merged.familiarity - 0.5).abs() < 1e-9);
    assert_eq!(merged.last_accessed_ms, Some(200 * DAY_MS + 4000));
    assert!(memoria::location::query::find_by_path(&conn, "/copy-a.rs", None)
        .unwrap()
        .is_none());
}

#[test]
fn merge_with_neither_path_known_returns_none() {
    let mut conn = test_db();
    assert!(merge_locations(&mut conn, "/ghost-a.rs", "/ghost-b.rs", None)
        .unwrap()
        .is_none());
}
