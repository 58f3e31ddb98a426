//! End-to-end ingest tests: raw payload -> driver -> store -> query facade.

use crate::test_utils::{numbered_reading, payload};
use redap_core::{BrokerConfig, Config};
use redap_telemetry::{
    LevelStatus, LevelThresholds, SensorQuery, SubscriptionDriver, TelemetryStore,
};
use std::sync::Arc;

fn pipeline(max_history: usize) -> (SubscriptionDriver, SensorQuery) {
    let store = Arc::new(TelemetryStore::with_max_history(max_history));
    let driver = SubscriptionDriver::new(BrokerConfig::default(), Arc::clone(&store));
    let query = SensorQuery::new(store, LevelThresholds::default());
    (driver, query)
}

#[test]
fn test_fifty_two_messages_keep_readings_three_to_fifty_two() {
    let _ = tracing_subscriber::fmt::try_init();
    let (driver, query) = pipeline(50);

    for n in 1..=52 {
        let n = f64::from(n);
        driver
            .ingest("sensors/s1", &payload("s1", n, n + 100.0, n / 2.0))
            .unwrap();
    }

    let history = query.sensor("s1").unwrap();
    assert_eq!(history.len(), 50);
    assert!(history.is_consistent());
    assert_eq!(history.temp.first(), Some(&3.0));
    assert_eq!(history.temp.last(), Some(&52.0));
    assert_eq!(history.hum.first(), Some(&103.0));
    assert_eq!(history.nivel.last(), Some(&26.0));
}

#[test]
fn test_malformed_messages_are_dropped_without_side_effects() {
    let (driver, query) = pipeline(50);

    driver.ingest("sensors/s1", &payload("s1", 21.5, 60.0, 3.0)).unwrap();
    assert!(driver
        .ingest("sensors/s1", br#"{"id":"s1","hum":60,"nivel":3}"#)
        .is_err());
    assert!(driver.ingest("sensors/s1", b"\xff\xfe").is_err());
    driver.ingest("sensors/s1", &payload("s1", 22.0, 61.0, 4.0)).unwrap();

    let history = query.sensor("s1").unwrap();
    assert_eq!(history.temp, vec![21.5, 22.0]);

    let counters = driver.stats().counters();
    assert_eq!(counters.messages_received, 4);
    assert_eq!(counters.messages_dropped, 2);
}

#[test]
fn test_all_sensors_json_omits_never_seen_sensors() {
    let (driver, query) = pipeline(50);
    for n in 0..3 {
        driver
            .ingest("sensors/s1", &payload("s1", 20.0 + f64::from(n), 55.0, 1.0))
            .unwrap();
    }

    let json = serde_json::to_value(query.all_sensors()).unwrap();
    let sensors = json.as_object().unwrap();
    assert_eq!(sensors.len(), 1);
    assert!(!sensors.contains_key("s2"));
    for key in ["labels", "temp", "hum", "nivel"] {
        assert_eq!(json["s1"][key].as_array().unwrap().len(), 3);
    }
    assert!(query.sensor("s2").is_none());
}

#[test]
fn test_configured_cap_flows_into_store() {
    let mut config = Config::default_config();
    config.store.max_history = 5;
    config.validate().unwrap();

    let store = Arc::new(TelemetryStore::with_max_history(config.store.max_history));
    for n in 1..=8 {
        store.append(numbered_reading("p1", n));
    }

    let query = SensorQuery::new(store, LevelThresholds::from_config(&config.store));
    assert_eq!(query.sensor("p1").unwrap().temp, vec![4.0, 5.0, 6.0, 7.0, 8.0]);
}

#[test]
fn test_overview_tracks_worst_sensor() {
    let (driver, query) = pipeline(50);
    driver.ingest("sensors/a", &payload("a", 25.0, 70.0, 12.0)).unwrap();
    driver.ingest("sensors/b", &payload("b", 26.0, 71.0, 31.0)).unwrap();
    driver.ingest("sensors/b", &payload("b", 26.0, 71.0, 18.0)).unwrap();

    let overview = query.status_overview();
    assert_eq!(overview.active_sensors, 2);
    // Only the newest reading counts: b dropped back to alert.
    assert_eq!(overview.global_alert, LevelStatus::Alert);
}
