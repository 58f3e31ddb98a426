//! Test utilities for cross-crate integration tests

use chrono::{DateTime, Duration, Local, TimeZone};
use redap_telemetry::SensorReading;

/// Fixed base time so labels are predictable (`06:00:00` + offset).
pub fn base_time() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 5, 20, 6, 0, 0)
        .single()
        .unwrap_or_else(Local::now)
}

/// Reading number `n` for `sensor_id`; every field encodes `n`.
pub fn numbered_reading(sensor_id: &str, n: u32) -> SensorReading {
    SensorReading::new(
        sensor_id,
        base_time() + Duration::seconds(i64::from(n)),
        f64::from(n),
        f64::from(n) + 0.5,
        f64::from(n) / 4.0,
    )
}

/// JSON payload in the sensor wire format.
pub fn payload(sensor_id: &str, temp: f64, hum: f64, nivel: f64) -> Vec<u8> {
    serde_json::json!({ "id": sensor_id, "temp": temp, "hum": hum, "nivel": nivel })
        .to_string()
        .into_bytes()
}
