//! Read-only query facade over the telemetry store.
//!
//! Handlers hold a [`SensorQuery`]; it exposes no way to mutate the store.

use crate::history::HistorySnapshot;
use crate::level::{LevelStatus, LevelThresholds};
use crate::store::TelemetryStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

/// CSV header emitted by [`SensorQuery::export_csv`].
pub const CSV_HEADER: &str = "sensor,time,temp,hum,nivel,status";

/// Current values and status of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStatus {
    pub id: String,
    pub label: String,
    pub temp: f64,
    pub hum: f64,
    pub nivel: f64,
    pub status: LevelStatus,
}

/// Dashboard summary across all sensors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusOverview {
    /// Sensors that have reported at least once
    pub active_sensors: usize,
    /// Worst status across all sensors
    pub global_alert: LevelStatus,
    /// Label of the most recently received reading
    pub last_update: Option<String>,
    pub sensors: Vec<SensorStatus>,
}

/// Read-only accessor handed to request handlers.
#[derive(Clone)]
pub struct SensorQuery {
    store: Arc<TelemetryStore>,
    thresholds: LevelThresholds,
}

impl SensorQuery {
    pub fn new(store: Arc<TelemetryStore>, thresholds: LevelThresholds) -> Self {
        Self { store, thresholds }
    }

    /// History of every known sensor.
    pub fn all_sensors(&self) -> BTreeMap<String, HistorySnapshot> {
        self.store.snapshot_all()
    }

    /// History of one sensor, `None` when it has never reported.
    pub fn sensor(&self, sensor_id: &str) -> Option<HistorySnapshot> {
        self.store.snapshot(sensor_id)
    }

    pub fn sensor_count(&self) -> usize {
        self.store.sensor_count()
    }

    pub fn status_overview(&self) -> StatusOverview {
        let latest = self.store.latest_all();
        let last_update = latest
            .values()
            .max_by_key(|reading| reading.recorded_at)
            .map(|reading| reading.label.clone());

        let sensors: Vec<SensorStatus> = latest
            .into_iter()
            .map(|(id, latest)| SensorStatus {
                status: self.thresholds.classify(latest.nivel),
                id,
                label: latest.label,
                temp: latest.temp,
                hum: latest.hum,
                nivel: latest.nivel,
            })
            .collect();

        let global_alert = sensors
            .iter()
            .map(|sensor| sensor.status)
            .max()
            .unwrap_or(LevelStatus::Normal);

        StatusOverview {
            active_sensors: sensors.len(),
            global_alert,
            last_update,
            sensors,
        }
    }

    /// Export every retained entry as CSV, sensors in id order.
    pub fn export_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        csv.push('\n');

        for (id, history) in self.store.snapshot_all() {
            let id = csv_field(&id);
            for i in 0..history.len() {
                let status = self.thresholds.classify(history.nivel[i]);
                // Writing into a String cannot fail.
                let _ = writeln!(
                    csv,
                    "{},{},{},{},{},{}",
                    id, history.labels[i], history.temp[i], history.hum[i], history.nivel[i], status
                );
            }
        }
        csv
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
