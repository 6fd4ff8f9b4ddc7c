//! End-to-end monitor-tick scenarios against the in-memory store.

mod common;

use std::sync::Arc;

use chrono::{Datelike, Duration, TimeZone, Utc};

use common::{
    attendance_clocked_in, employee, live_location, registry_with, RecordingTransport,
    NAIROBI_SQUARE,
};
use geoclock_bot::monitor::{LocationMonitor, MonitorConfig};
use geoclock_bot::notify::Notifier;
use geoclock_bot::telegram::ChatTransport;
use geoclock_core::attendance::{ENTRY_CLOCK_OUT, STATUS_SUBMITTED, VALUE_ABSENT};
use geoclock_core::Timestamp;
use geoclock_store::memory::MemoryDatabase;

fn fixed_now() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 8, 14, 9, 0, 0).unwrap()
}

struct Fixture {
    db: Arc<MemoryDatabase>,
    transport: Arc<RecordingTransport>,
    monitor: LocationMonitor,
}

fn fixture() -> Fixture {
    let db = Arc::new(MemoryDatabase::new("alpha"));
    let databases = registry_with(Arc::clone(&db));
    let transport = Arc::new(RecordingTransport::default());
    let notifier = Arc::new(Notifier::new(
        Arc::clone(&transport) as Arc<dyn ChatTransport>,
        Arc::clone(&databases),
    ));
    let monitor = LocationMonitor::new(MonitorConfig::default(), databases, notifier);
    Fixture {
        db,
        transport,
        monitor,
    }
}

/// A clocked-in employee sharing live from outside the working area
/// is clocked out, and both the employee and the manager are told.
#[tokio::test]
async fn drift_outside_area_clocks_out_and_notifies() {
    let now = fixed_now();
    let f = fixture();

    let mut worker = employee("e1", "u1", Some("1001"), NAIROBI_SQUARE);
    worker.reporting_line_manager = Some("u-mgr".to_string());
    worker.current_location = Some(live_location(36.78, -1.29, now - Duration::minutes(2)));
    f.db.insert_employee(&worker).await.unwrap();

    let mut manager = employee("e2", "u-mgr", Some("2002"), "");
    manager.name = "Mary Atieno".to_string();
    f.db.insert_employee(&manager).await.unwrap();

    let clock_in = now - Duration::hours(2);
    f.db.insert_attendance(&attendance_clocked_in("att-1", "u1", clock_in))
        .await
        .unwrap();

    let results = f.monitor.tick(now).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].reason.contains("outside your designated working area"));

    let attendance = f.db.attendance("att-1").await.unwrap();
    assert!(attendance.last_clock_in_timestamp.is_none());
    assert!((attendance.monthly_worked_hours - 2.0).abs() < 1e-9);

    let day = attendance.values.get((clock_in.day() - 1) as usize).unwrap();
    assert_eq!(day.value.as_deref(), Some(VALUE_ABSENT));
    assert_eq!(day.status, STATUS_SUBMITTED);
    let last_entry = day.worked_hours.last().unwrap();
    assert_eq!(last_entry.entry_type, ENTRY_CLOCK_OUT);

    let sent = f.transport.sent().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, "1001");
    assert!(sent[0].1.starts_with("⚠️ You have been automatically clocked out because"));
    assert_eq!(sent[1].0, "2002");
    assert!(sent[1].1.contains("👤 Employee Jane Wanjiku has been automatically clocked out"));
}

/// A finalized sharing session is actionable.
#[tokio::test]
async fn ended_sharing_is_clocked_out() {
    let now = fixed_now();
    let f = fixture();

    let mut worker = employee("e1", "u1", Some("1001"), NAIROBI_SQUARE);
    let mut location = live_location(36.81, -1.28, now - Duration::minutes(1));
    location.is_live = false;
    location.ended_at = Some(now);
    worker.current_location = Some(location);
    f.db.insert_employee(&worker).await.unwrap();
    f.db.insert_attendance(&attendance_clocked_in("att-1", "u1", now - Duration::hours(1)))
        .await
        .unwrap();

    let results = f.monitor.tick(now).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].reason.contains("stopped sharing"));
    assert!(f.db.attendance("att-1").await.unwrap().last_clock_in_timestamp.is_none());
}

/// Stale non-live data is actionable.
#[tokio::test]
async fn stale_location_is_clocked_out() {
    let now = fixed_now();
    let f = fixture();

    let mut worker = employee("e1", "u1", Some("1001"), NAIROBI_SQUARE);
    let mut location = live_location(36.81, -1.28, now - Duration::minutes(45));
    location.is_live = false;
    worker.current_location = Some(location);
    f.db.insert_employee(&worker).await.unwrap();
    f.db.insert_attendance(&attendance_clocked_in("att-1", "u1", now - Duration::hours(1)))
        .await
        .unwrap();

    let results = f.monitor.tick(now).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].reason.contains("45 minutes old"));
}

/// A recent clock-out on the clock-in day suppresses another one
/// within the check interval.
#[tokio::test]
async fn recent_clock_out_is_deduplicated() {
    let now = fixed_now();
    let f = fixture();

    let mut worker = employee("e1", "u1", Some("1001"), NAIROBI_SQUARE);
    worker.current_location = Some(live_location(36.78, -1.29, now - Duration::minutes(2)));
    f.db.insert_employee(&worker).await.unwrap();

    let clock_in = now - Duration::hours(2);
    let mut attendance = attendance_clocked_in("att-1", "u1", clock_in);
    {
        let day = attendance.values.get_or_create((clock_in.day() - 1) as usize);
        day.worked_hours.push(geoclock_core::attendance::WorkedHoursEntry {
            id: "prev-out".to_string(),
            timestamp: now - Duration::minutes(2),
            entry_type: ENTRY_CLOCK_OUT.to_string(),
            hour: "10:58 AM".to_string(),
        });
    }
    let monthly_before = attendance.monthly_worked_hours;
    f.db.insert_attendance(&attendance).await.unwrap();

    let results = f.monitor.tick(now).await;
    assert!(results.is_empty());

    let stored = f.db.attendance("att-1").await.unwrap();
    assert!(stored.last_clock_in_timestamp.is_some());
    assert!((stored.monthly_worked_hours - monthly_before).abs() < 1e-9);
    assert!(f.transport.sent().await.is_empty());

    // An older clock-out no longer suppresses.
    let mut attendance = f.db.attendance("att-1").await.unwrap();
    let day_index = (clock_in.day() - 1) as usize;
    attendance
        .values
        .get_or_create(day_index)
        .worked_hours[0]
        .timestamp = now - Duration::minutes(10);
    f.db.insert_attendance(&attendance).await.unwrap();

    let results = f.monitor.tick(now).await;
    assert_eq!(results.len(), 1);
}

/// No working area means no enforcement at all.
#[tokio::test]
async fn missing_working_area_is_skipped() {
    let now = fixed_now();
    let f = fixture();

    let mut worker = employee("e1", "u1", Some("1001"), "");
    worker.current_location = Some(live_location(100.0, 50.0, now - Duration::minutes(1)));
    f.db.insert_employee(&worker).await.unwrap();
    f.db.insert_attendance(&attendance_clocked_in("att-1", "u1", now - Duration::hours(1)))
        .await
        .unwrap();

    let results = f.monitor.tick(now).await;
    assert!(results.is_empty());
    assert!(f.db.attendance("att-1").await.unwrap().last_clock_in_timestamp.is_some());
    assert!(f.transport.sent().await.is_empty());
}

/// NO_LOCATION and BAD_WORKING_AREA are observed but never actioned.
#[tokio::test]
async fn non_actionable_verdicts_do_not_clock_out() {
    let now = fixed_now();
    let f = fixture();

    // No location at all.
    let no_location = employee("e1", "u1", Some("1001"), NAIROBI_SQUARE);
    f.db.insert_employee(&no_location).await.unwrap();
    f.db.insert_attendance(&attendance_clocked_in("att-1", "u1", now - Duration::hours(1)))
        .await
        .unwrap();

    // Unparseable working area with a live location.
    let mut bad_area = employee("e2", "u2", Some("1002"), "not json");
    bad_area.current_location = Some(live_location(36.81, -1.28, now - Duration::minutes(1)));
    f.db.insert_employee(&bad_area).await.unwrap();
    f.db.insert_attendance(&attendance_clocked_in("att-2", "u2", now - Duration::hours(1)))
        .await
        .unwrap();

    let results = f.monitor.tick(now).await;
    assert!(results.is_empty());
    assert!(f.db.attendance("att-1").await.unwrap().last_clock_in_timestamp.is_some());
    assert!(f.db.attendance("att-2").await.unwrap().last_clock_in_timestamp.is_some());
}

/// A valid live location inside the area is left alone.
#[tokio::test]
async fn valid_location_is_left_alone() {
    let now = fixed_now();
    let f = fixture();

    let mut worker = employee("e1", "u1", Some("1001"), NAIROBI_SQUARE);
    worker.current_location = Some(live_location(36.81, -1.28, now - Duration::minutes(2)));
    f.db.insert_employee(&worker).await.unwrap();
    f.db.insert_attendance(&attendance_clocked_in("att-1", "u1", now - Duration::hours(1)))
        .await
        .unwrap();

    let results = f.monitor.tick(now).await;
    assert!(results.is_empty());
    assert!(f.db.attendance("att-1").await.unwrap().last_clock_in_timestamp.is_some());
}

/// A store write failure isolates the employee and leaves the document
/// untouched for the next tick.
#[tokio::test(start_paused = true)]
async fn write_failure_leaves_document_for_next_tick() {
    let now = fixed_now();
    let f = fixture();

    let mut worker = employee("e1", "u1", Some("1001"), NAIROBI_SQUARE);
    worker.current_location = Some(live_location(36.78, -1.29, now - Duration::minutes(2)));
    f.db.insert_employee(&worker).await.unwrap();
    f.db.insert_attendance(&attendance_clocked_in("att-1", "u1", now - Duration::hours(2)))
        .await
        .unwrap();

    f.db.set_fail_writes(true);
    let results = f.monitor.tick(now).await;
    assert!(results.is_empty());
    assert!(f.transport.sent().await.is_empty());
    assert!(f.db.attendance("att-1").await.unwrap().last_clock_in_timestamp.is_some());

    f.db.set_fail_writes(false);
    let results = f.monitor.tick(now).await;
    assert_eq!(results.len(), 1);
}

/// Notifications are suppressed globally when the flag is off, while
/// clock-outs still apply.
#[tokio::test]
async fn notifications_flag_suppresses_messages() {
    let now = fixed_now();
    let db = Arc::new(MemoryDatabase::new("alpha"));
    let databases = registry_with(Arc::clone(&db));
    let transport = Arc::new(RecordingTransport::default());
    let notifier = Arc::new(Notifier::new(
        Arc::clone(&transport) as Arc<dyn ChatTransport>,
        Arc::clone(&databases),
    ));
    let config = MonitorConfig {
        notifications_enabled: false,
        ..MonitorConfig::default()
    };
    let monitor = LocationMonitor::new(config, databases, notifier);

    let mut worker = employee("e1", "u1", Some("1001"), NAIROBI_SQUARE);
    worker.current_location = Some(live_location(36.78, -1.29, now - Duration::minutes(2)));
    db.insert_employee(&worker).await.unwrap();
    db.insert_attendance(&attendance_clocked_in("att-1", "u1", now - Duration::hours(1)))
        .await
        .unwrap();

    let results = monitor.tick(now).await;
    assert_eq!(results.len(), 1);
    assert!(transport.sent().await.is_empty());
}

/// Map-shaped stored `values` are normalized on read and written back as
/// a dense array that still holds the untouched day.
#[tokio::test]
async fn sparse_values_shape_is_preserved_through_clock_out() {
    let now = fixed_now();
    let f = fixture();

    let mut worker = employee("e1", "u1", Some("1001"), NAIROBI_SQUARE);
    worker.current_location = Some(live_location(36.78, -1.29, now - Duration::minutes(2)));
    f.db.insert_employee(&worker).await.unwrap();

    let clock_in = now - Duration::hours(2);
    f.db.insert_attendance_raw(
        "att-1",
        serde_json::json!({
            "id": "att-1",
            "uid": "u1",
            "year": now.year(),
            "month": geoclock_core::attendance::month_name(now.month()),
            "monthlyWorkedHours": 8.0,
            "lastClockInTimestamp": clock_in,
            "values": {"0": {
                "id": "d1", "day": 1, "value": "P", "status": "Submitted",
                "dailyWorkedHours": 8.0, "workedHours": [],
            }},
        }),
    )
    .await;

    let results = f.monitor.tick(now).await;
    assert_eq!(results.len(), 1);

    let raw = f.db.attendance_raw("att-1").await.unwrap();
    let values = raw["values"].as_array().expect("values written as array");
    let day_index = (clock_in.day() - 1) as usize;
    assert_eq!(values.len(), day_index + 1);
    // Day 1 survives at its original index.
    assert_eq!(values[0]["value"], "P");
    assert_eq!(values[day_index]["value"], VALUE_ABSENT);
}

/// Start is idempotent and stop is safe to repeat.
#[tokio::test(start_paused = true)]
async fn start_and_stop_lifecycle() {
    let f = fixture();
    let monitor = Arc::new(f.monitor);

    assert!(!monitor.is_running().await);
    monitor.start().await;
    assert!(monitor.is_running().await);
    // Second start is a no-op.
    monitor.start().await;
    assert!(monitor.is_running().await);

    monitor.stop().await;
    assert!(!monitor.is_running().await);
    // Stopping again is safe.
    monitor.stop().await;
}
