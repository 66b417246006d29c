// crates/flagship-store-sqlite/tests/sqlite_storage_unit.rs
// ============================================================================
// Module: SQLite Storage Unit Tests
// Description: Behavioral tests for the SQLite storage backend.
// Purpose: Validate upsert semantics, FIFO queue ordering, overflow hooks,
//          aggregation drains, schema versioning, and concurrency safety.
// ============================================================================

//! ## Overview
//! Unit-level tests for the `SQLite` storage contracts:
//! - Split upserts, keyed lookups, watermarks, and the guarded local kill
//! - Segment full-image replacement and delta updates
//! - Membership replacement for the local subject
//! - FIFO queue ordering and overflow hook firing (count and byte budget)
//! - Telemetry increment/drain atomicity, including multi-threaded writers
//! - Schema version validation and file-backed persistence

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;

use flagship_core::Event;
use flagship_core::EventEnvelope;
use flagship_core::EventStorage;
use flagship_core::Impression;
use flagship_core::ImpressionStorage;
use flagship_core::LATENCY_BUCKET_COUNT;
use flagship_core::MembershipStorage;
use flagship_core::Segment;
use flagship_core::SegmentStorage;
use flagship_core::Split;
use flagship_core::SplitStorage;
use flagship_core::TelemetryStorage;
use flagship_store_sqlite::DbClient;
use flagship_store_sqlite::Filter;
use flagship_store_sqlite::SqlEventStorage;
use flagship_store_sqlite::SqlImpressionStorage;
use flagship_store_sqlite::SqlMembershipStorage;
use flagship_store_sqlite::SqlSegmentStorage;
use flagship_store_sqlite::SqlSplitStorage;
use flagship_store_sqlite::SqlTelemetryStorage;
use flagship_store_sqlite::SqliteStorageConfig;
use flagship_store_sqlite::SqliteStorageError;
use flagship_store_sqlite::records::MembershipRecord;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn memory_client() -> Arc<DbClient> {
    Arc::new(DbClient::new(&SqliteStorageConfig::default()).expect("open in-memory store"))
}

fn sample_split(name: &str, traffic_type: &str, change_number: i64) -> Split {
    Split::new(name, traffic_type, change_number)
}

fn split_with_segments(name: &str, segments: &[&str]) -> Split {
    let matchers: Vec<serde_json::Value> = segments
        .iter()
        .map(|segment| {
            serde_json::json!({
                "matcherType": "IN_SEGMENT",
                "userDefinedSegmentMatcherData": {"segmentName": segment}
            })
        })
        .collect();
    let json = serde_json::json!({
        "name": name,
        "trafficTypeName": "user",
        "changeNumber": 1,
        "conditions": [{"matcherGroup": {"matchers": matchers}}]
    });
    serde_json::from_value(json).expect("valid split json")
}

fn sample_impression(key: &str) -> Impression {
    Impression::new(key, "onboarding", "on", "default rule", 42, None, 1_700_000_000_000)
}

fn sample_event(event_type_id: &str, size: i64) -> EventEnvelope {
    EventEnvelope::new(
        Event {
            key: "user-1".to_string(),
            traffic_type_name: "user".to_string(),
            event_type_id: event_type_id.to_string(),
            value: Some(1.5),
            timestamp: 1_700_000_000_000,
            properties: None,
        },
        size,
    )
}

// ============================================================================
// SECTION: Split Storage
// ============================================================================

#[test]
fn split_put_get_overwrite_remove() {
    let splits = SqlSplitStorage::new(memory_client());
    assert!(splits.get("onboarding").expect("get").is_none());

    splits.put(&sample_split("onboarding", "user", 10)).expect("put");
    let stored = splits.get("onboarding").expect("get").expect("present");
    assert_eq!(stored.change_number, 10);
    assert_eq!(stored.traffic_type_name, "user");

    splits.put(&sample_split("onboarding", "account", 11)).expect("overwrite");
    let stored = splits.get("onboarding").expect("get").expect("present");
    assert_eq!(stored.change_number, 11);
    assert_eq!(stored.traffic_type_name, "account");

    assert!(splits.remove("onboarding").expect("remove"));
    assert!(!splits.remove("onboarding").expect("second remove"));
    assert!(splits.get("onboarding").expect("get").is_none());
}

#[test]
fn split_fetch_many_marks_absent_names() {
    let splits = SqlSplitStorage::new(memory_client());
    splits.put(&sample_split("a", "user", 1)).expect("put a");
    splits.put(&sample_split("b", "user", 2)).expect("put b");

    let names = vec!["a".to_string(), "missing".to_string(), "b".to_string()];
    let fetched = splits.fetch_many(&names).expect("fetch many");
    assert_eq!(fetched.len(), 3);
    assert_eq!(fetched.get("a").expect("key a").as_ref().map(|s| s.change_number), Some(1));
    assert_eq!(fetched.get("b").expect("key b").as_ref().map(|s| s.change_number), Some(2));
    assert!(fetched.get("missing").expect("key missing").is_none());
}

#[test]
fn split_change_number_defaults_to_zero() {
    let splits = SqlSplitStorage::new(memory_client());
    assert_eq!(splits.get_change_number().expect("default"), 0);
    splits.set_change_number(123).expect("set");
    assert_eq!(splits.get_change_number().expect("get"), 123);
    splits.set_change_number(124).expect("overwrite");
    assert_eq!(splits.get_change_number().expect("get"), 124);
}

#[test]
fn split_names_and_all_splits_track_live_set() {
    let splits = SqlSplitStorage::new(memory_client());
    splits.put(&sample_split("a", "user", 1)).expect("put a");
    splits.put(&sample_split("b", "user", 2)).expect("put b");

    let mut names = splits.get_split_names().expect("names");
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(splits.get_all_splits().expect("all").len(), 2);

    splits.remove("a").expect("remove");
    assert_eq!(splits.get_split_names().expect("names"), vec!["b".to_string()]);
}

#[test]
fn traffic_type_valid_only_while_referenced() {
    let splits = SqlSplitStorage::new(memory_client());
    splits.put(&sample_split("a", "user", 1)).expect("put a");
    splits.put(&sample_split("b", "user", 2)).expect("put b");

    assert!(splits.is_valid_traffic_type("user").expect("check"));
    assert!(!splits.is_valid_traffic_type("account").expect("check"));

    splits.remove("a").expect("remove a");
    assert!(splits.is_valid_traffic_type("user").expect("still referenced"));
    splits.remove("b").expect("remove b");
    assert!(!splits.is_valid_traffic_type("user").expect("no longer referenced"));
}

#[test]
fn segment_names_union_across_splits() {
    let splits = SqlSplitStorage::new(memory_client());
    splits
        .put(&split_with_segments("a", &["beta_testers", "employees"]))
        .expect("put a");
    splits.put(&split_with_segments("b", &["employees"])).expect("put b");
    splits.put(&sample_split("c", "user", 3)).expect("put c");

    let names = splits.get_segment_names().expect("segment names");
    assert_eq!(names.len(), 2);
    assert!(names.contains("beta_testers"));
    assert!(names.contains("employees"));
}

#[test]
fn kill_locally_superseded_by_newer_change_number() {
    let splits = SqlSplitStorage::new(memory_client());
    splits.put(&sample_split("onboarding", "user", 10)).expect("put");
    splits.set_change_number(100).expect("set watermark");

    splits.kill_locally("onboarding", "off", 50).expect("stale kill");
    let stored = splits.get("onboarding").expect("get").expect("present");
    assert!(!stored.killed);
    assert_eq!(stored.change_number, 10);
}

#[test]
fn kill_locally_applies_when_not_superseded() {
    let splits = SqlSplitStorage::new(memory_client());
    splits.put(&sample_split("onboarding", "user", 10)).expect("put");
    splits.set_change_number(100).expect("set watermark");

    splits.kill_locally("onboarding", "off", 150).expect("kill");
    let stored = splits.get("onboarding").expect("get").expect("present");
    assert!(stored.killed);
    assert_eq!(stored.default_treatment, "off");
    assert_eq!(stored.change_number, 150);
}

#[test]
fn kill_locally_missing_split_is_noop() {
    let splits = SqlSplitStorage::new(memory_client());
    splits.kill_locally("missing", "off", 5).expect("noop kill");
    assert!(splits.get("missing").expect("get").is_none());
}

// ============================================================================
// SECTION: Segment Storage
// ============================================================================

#[test]
fn segment_put_replaces_full_membership() {
    let segments = SqlSegmentStorage::new(memory_client());
    assert!(segments.get("beta").expect("get").is_none());

    let image = Segment::new("beta", ["k1".to_string(), "k2".to_string()], 5);
    segments.put(&image).expect("put");
    let stored = segments.get("beta").expect("get").expect("present");
    assert_eq!(stored, image);

    let replacement = Segment::new("beta", ["k3".to_string()], 6);
    segments.put(&replacement).expect("replace");
    let stored = segments.get("beta").expect("get").expect("present");
    assert_eq!(stored.keys.len(), 1);
    assert!(stored.contains("k3"));
    assert!(!stored.contains("k1"));
    assert_eq!(stored.change_number, 6);
}

#[test]
fn segment_update_applies_delta() {
    let segments = SqlSegmentStorage::new(memory_client());
    segments
        .put(&Segment::new("beta", ["k1".to_string(), "k2".to_string()], 5))
        .expect("put");

    segments
        .update("beta", &["k3".to_string()], &["k1".to_string()], Some(7))
        .expect("update");
    let stored = segments.get("beta").expect("get").expect("present");
    assert!(!stored.contains("k1"));
    assert!(stored.contains("k2"));
    assert!(stored.contains("k3"));
    assert_eq!(stored.change_number, 7);
}

#[test]
fn segment_update_readding_member_does_not_duplicate() {
    let segments = SqlSegmentStorage::new(memory_client());
    segments.put(&Segment::new("beta", ["k1".to_string()], 5)).expect("put");
    segments.update("beta", &["k1".to_string()], &[], None).expect("re-add");

    let stored = segments.get("beta").expect("get").expect("present");
    assert_eq!(stored.keys.len(), 1);
    // Change number untouched when the delta does not carry one.
    assert_eq!(stored.change_number, 5);
}

#[test]
fn segment_update_creates_absent_segment_without_change_number() {
    let segments = SqlSegmentStorage::new(memory_client());
    segments.update("fresh", &["k1".to_string()], &[], None).expect("create");
    // The segment exists but has never been assigned a change number.
    assert!(segments.get_change_number("fresh").expect("cn").is_none());
    assert!(segments.segment_contains("fresh", "k1").expect("contains"));

    segments.update("fresh", &[], &[], Some(7)).expect("assign");
    assert_eq!(segments.get_change_number("fresh").expect("cn"), Some(7));
}

#[test]
fn segment_change_number_roundtrip_and_absent_noop() {
    let segments = SqlSegmentStorage::new(memory_client());
    assert!(segments.get_change_number("beta").expect("absent").is_none());

    segments.set_change_number("beta", 9).expect("noop on absent");
    assert!(segments.get_change_number("beta").expect("still absent").is_none());

    segments.put(&Segment::new("beta", [], 5)).expect("put");
    segments.set_change_number("beta", 9).expect("set");
    assert_eq!(segments.get_change_number("beta").expect("cn"), Some(9));
}

#[test]
fn segment_contains_checks_one_key() {
    let segments = SqlSegmentStorage::new(memory_client());
    segments.put(&Segment::new("beta", ["k1".to_string()], 5)).expect("put");
    assert!(segments.segment_contains("beta", "k1").expect("member"));
    assert!(!segments.segment_contains("beta", "k2").expect("non-member"));
    assert!(!segments.segment_contains("missing", "k1").expect("absent segment"));
}

// ============================================================================
// SECTION: Membership Storage
// ============================================================================

#[test]
fn membership_put_replaces_subject_image() {
    let memberships = SqlMembershipStorage::new(memory_client());
    memberships
        .put("user-1", &["beta".to_string(), "employees".to_string()])
        .expect("put");
    memberships.put("user-2", &["beta".to_string()]).expect("put other");

    let mut names = memberships.get("user-1").expect("get");
    names.sort();
    assert_eq!(names, vec!["beta".to_string(), "employees".to_string()]);

    memberships.put("user-1", &["vip".to_string()]).expect("replace");
    assert_eq!(memberships.get("user-1").expect("get"), vec!["vip".to_string()]);
    // Replacing one subject leaves the other untouched.
    assert_eq!(memberships.get("user-2").expect("get"), vec!["beta".to_string()]);
}

#[test]
fn membership_segment_contains_and_clear() {
    let memberships = SqlMembershipStorage::new(memory_client());
    memberships.put("user-1", &["beta".to_string()]).expect("put");

    assert!(memberships.segment_contains("beta", "user-1").expect("member"));
    assert!(!memberships.segment_contains("beta", "user-2").expect("non-member"));
    assert!(!memberships.segment_contains("vip", "user-1").expect("wrong segment"));

    memberships.clear().expect("clear");
    assert!(memberships.get("user-1").expect("get").is_empty());
}

// ============================================================================
// SECTION: Impression Queue
// ============================================================================

#[test]
fn impressions_pop_in_insertion_order() {
    let impressions = SqlImpressionStorage::new(memory_client(), 100);
    let batch = vec![
        sample_impression("k1"),
        sample_impression("k2"),
        sample_impression("k3"),
    ];
    assert!(impressions.put(&batch).expect("put"));

    let popped = impressions.pop_many(2).expect("pop 2");
    assert_eq!(popped, batch[.. 2]);
    let popped = impressions.pop_many(10).expect("pop rest");
    assert_eq!(popped, batch[2 ..]);
    assert!(impressions.pop_many(10).expect("pop empty").is_empty());
}

#[test]
fn impressions_overflow_hook_fires_once_per_put() {
    let impressions = SqlImpressionStorage::new(memory_client(), 2);
    let fired = Arc::new(AtomicUsize::new(0));
    let observer = Arc::clone(&fired);
    impressions.set_table_full_hook(Box::new(move || {
        observer.fetch_add(1, Ordering::SeqCst);
    }));

    assert!(
        impressions
            .put(&[sample_impression("k1"), sample_impression("k2")])
            .expect("put at capacity")
    );
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    assert!(impressions.put(&[sample_impression("k3")]).expect("put over capacity"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn impressions_hook_panic_does_not_disable_overflow_signaling() {
    let impressions = SqlImpressionStorage::new(memory_client(), 1);
    impressions.set_table_full_hook(Box::new(|| panic!("flush failed")));

    impressions.put(&[sample_impression("k1")]).expect("put at capacity");
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        impressions.put(&[sample_impression("k2")])
    }));
    assert!(outcome.is_err());

    let fired = Arc::new(AtomicUsize::new(0));
    let observer = Arc::clone(&fired);
    impressions.set_table_full_hook(Box::new(move || {
        observer.fetch_add(1, Ordering::SeqCst);
    }));
    assert!(impressions.put(&[sample_impression("k3")]).expect("put over capacity"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn impressions_hook_may_replace_itself() {
    let impressions = Arc::new(SqlImpressionStorage::new(memory_client(), 1));
    let fired = Arc::new(AtomicUsize::new(0));
    let observer = Arc::clone(&fired);
    let queue = Arc::clone(&impressions);
    impressions.set_table_full_hook(Box::new(move || {
        observer.fetch_add(1, Ordering::SeqCst);
        queue.set_table_full_hook(Box::new(|| {}));
    }));

    impressions.put(&[sample_impression("k1")]).expect("put at capacity");
    impressions.put(&[sample_impression("k2")]).expect("put over capacity");
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // The replacement hook is a no-op, so further overflows stay silent.
    impressions.put(&[sample_impression("k3")]).expect("put over capacity");
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn impressions_clear_empties_queue() {
    let impressions = SqlImpressionStorage::new(memory_client(), 100);
    impressions.put(&[sample_impression("k1")]).expect("put");
    impressions.clear().expect("clear");
    assert!(impressions.pop_many(10).expect("pop").is_empty());
}

// ============================================================================
// SECTION: Event Queue
// ============================================================================

#[test]
fn events_pop_in_insertion_order() {
    let events = SqlEventStorage::new(memory_client(), 100);
    let batch = vec![
        sample_event("signup", 128),
        sample_event("purchase", 128),
        sample_event("churn", 128),
    ];
    assert!(events.put(&batch).expect("put"));

    let popped = events.pop_many(2).expect("pop 2");
    assert_eq!(popped.len(), 2);
    assert_eq!(popped[0].event_type_id, "signup");
    assert_eq!(popped[1].event_type_id, "purchase");

    let popped = events.pop_many(10).expect("pop rest");
    assert_eq!(popped.len(), 1);
    assert_eq!(popped[0].event_type_id, "churn");
    assert!(events.pop_many(10).expect("pop empty").is_empty());
}

#[test]
fn events_overflow_hook_fires_on_count() {
    let events = SqlEventStorage::new(memory_client(), 2);
    let fired = Arc::new(AtomicUsize::new(0));
    let observer = Arc::clone(&fired);
    events.set_table_full_hook(Box::new(move || {
        observer.fetch_add(1, Ordering::SeqCst);
    }));

    events
        .put(&[sample_event("a", 10), sample_event("b", 10)])
        .expect("put at capacity");
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    events.put(&[sample_event("c", 10)]).expect("put over capacity");
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn events_overflow_hook_fires_on_byte_budget() {
    let events = SqlEventStorage::new(memory_client(), 100);
    let fired = Arc::new(AtomicUsize::new(0));
    let observer = Arc::clone(&fired);
    events.set_table_full_hook(Box::new(move || {
        observer.fetch_add(1, Ordering::SeqCst);
    }));

    let three_mib = 3 * 1024 * 1024;
    events.put(&[sample_event("big-1", three_mib)]).expect("put under budget");
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    events.put(&[sample_event("big-2", three_mib)]).expect("put over budget");
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn events_hook_panic_does_not_disable_overflow_signaling() {
    let events = SqlEventStorage::new(memory_client(), 1);
    events.set_table_full_hook(Box::new(|| panic!("flush failed")));

    events.put(&[sample_event("a", 10)]).expect("put at capacity");
    let outcome = catch_unwind(AssertUnwindSafe(|| events.put(&[sample_event("b", 10)])));
    assert!(outcome.is_err());

    let fired = Arc::new(AtomicUsize::new(0));
    let observer = Arc::clone(&fired);
    events.set_table_full_hook(Box::new(move || {
        observer.fetch_add(1, Ordering::SeqCst);
    }));
    assert!(events.put(&[sample_event("c", 10)]).expect("put over capacity"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

// ============================================================================
// SECTION: Telemetry Storage
// ============================================================================

#[test]
fn counters_accumulate_and_drain() {
    let telemetry = SqlTelemetryStorage::new(memory_client());
    telemetry.inc_counter("evaluations").expect("inc");
    telemetry.inc_counter("evaluations").expect("inc");
    telemetry.inc_counter("evaluations").expect("inc");
    telemetry.inc_counter("exceptions").expect("inc");

    let counters = telemetry.pop_counters().expect("drain");
    assert_eq!(counters.len(), 2);
    assert_eq!(counters.get("evaluations"), Some(&3));
    assert_eq!(counters.get("exceptions"), Some(&1));
    assert!(telemetry.pop_counters().expect("second drain").is_empty());
}

#[test]
fn gauges_last_write_wins() {
    let telemetry = SqlTelemetryStorage::new(memory_client());
    telemetry.put_gauge("queue_depth", 10).expect("put");
    telemetry.put_gauge("queue_depth", 4).expect("overwrite");
    telemetry.put_gauge("splits_ready", 1).expect("put");

    let gauges = telemetry.pop_gauges().expect("drain");
    assert_eq!(gauges.len(), 2);
    assert_eq!(gauges.get("queue_depth"), Some(&4));
    assert_eq!(gauges.get("splits_ready"), Some(&1));
    assert!(telemetry.pop_gauges().expect("second drain").is_empty());
}

#[test]
fn latencies_accumulate_by_bucket_and_ignore_out_of_range() {
    let telemetry = SqlTelemetryStorage::new(memory_client());
    telemetry.inc_latency("sdk.get_treatment", 0).expect("bucket 0");
    telemetry.inc_latency("sdk.get_treatment", 1).expect("bucket 1");
    telemetry.inc_latency("sdk.get_treatment", 5).expect("bucket 5");
    telemetry.inc_latency("sdk.get_treatment", 5).expect("bucket 5 again");
    telemetry
        .inc_latency("sdk.get_treatment", LATENCY_BUCKET_COUNT)
        .expect("out of range is a no-op");

    let latencies = telemetry.pop_latencies().expect("drain");
    let buckets = latencies.get("sdk.get_treatment").expect("present");
    assert_eq!(buckets.len(), LATENCY_BUCKET_COUNT);
    assert_eq!(buckets[0], 1);
    assert_eq!(buckets[1], 1);
    assert_eq!(buckets[5], 2);
    assert_eq!(buckets.iter().sum::<i64>(), 4);
    assert!(telemetry.pop_latencies().expect("second drain").is_empty());
}

#[test]
fn out_of_range_bucket_alone_creates_nothing() {
    let telemetry = SqlTelemetryStorage::new(memory_client());
    telemetry
        .inc_latency("sdk.get_treatment", LATENCY_BUCKET_COUNT + 7)
        .expect("no-op");
    assert!(telemetry.pop_latencies().expect("drain").is_empty());
}

#[test]
fn telemetry_clear_empties_all_kinds() {
    let telemetry = SqlTelemetryStorage::new(memory_client());
    telemetry.inc_counter("evaluations").expect("inc");
    telemetry.put_gauge("queue_depth", 3).expect("gauge");
    telemetry.inc_latency("sdk.get_treatment", 2).expect("latency");

    telemetry.clear().expect("clear");
    assert!(telemetry.pop_counters().expect("counters").is_empty());
    assert!(telemetry.pop_gauges().expect("gauges").is_empty());
    assert!(telemetry.pop_latencies().expect("latencies").is_empty());
}

#[test]
fn concurrent_counter_increments_land_on_one_row() {
    let telemetry = Arc::new(SqlTelemetryStorage::new(memory_client()));
    let mut handles = Vec::new();
    for _ in 0 .. 8 {
        let telemetry = Arc::clone(&telemetry);
        handles.push(thread::spawn(move || {
            for _ in 0 .. 25 {
                telemetry.inc_counter("hits").expect("inc");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let counters = telemetry.pop_counters().expect("drain");
    assert_eq!(counters.len(), 1);
    assert_eq!(counters.get("hits"), Some(&200));
}

// ============================================================================
// SECTION: Generic Client Contracts
// ============================================================================

#[test]
fn get_one_or_none_rejects_multiple_matches() {
    let client = memory_client();
    let memberships = SqlMembershipStorage::new(Arc::clone(&client));
    memberships
        .put("user-1", &["beta".to_string(), "vip".to_string()])
        .expect("put two rows");

    let result = client.get_one_or_none::<MembershipRecord>(&[Filter::eq(
        "subject_key",
        "user-1".to_string(),
    )]);
    assert!(matches!(result, Err(SqliteStorageError::MultipleRecords(_))));
}

// ============================================================================
// SECTION: Schema and Persistence
// ============================================================================

#[test]
fn file_backed_store_persists_across_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let config = SqliteStorageConfig {
        path: Some(dir.path().join("flagship.db")),
        ..SqliteStorageConfig::default()
    };

    {
        let splits = SqlSplitStorage::new(Arc::new(DbClient::new(&config).expect("open")));
        splits.put(&sample_split("onboarding", "user", 10)).expect("put");
        splits.set_change_number(10).expect("watermark");
    }

    let splits = SqlSplitStorage::new(Arc::new(DbClient::new(&config).expect("reopen")));
    let stored = splits.get("onboarding").expect("get").expect("persisted");
    assert_eq!(stored.change_number, 10);
    assert_eq!(splits.get_change_number().expect("watermark"), 10);
}

#[test]
fn unknown_schema_version_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("flagship.db");
    let config = SqliteStorageConfig {
        path: Some(path.clone()),
        ..SqliteStorageConfig::default()
    };
    drop(DbClient::new(&config).expect("initial open"));

    let connection = Connection::open(&path).expect("raw open");
    connection
        .execute("UPDATE store_meta SET version = ?1", params![99_i64])
        .expect("bump version");
    drop(connection);

    let result = DbClient::new(&config);
    assert!(matches!(result, Err(SqliteStorageError::VersionMismatch(_))));
}
