//! Concurrent telemetry store.
//!
//! One coarse `RwLock` guards the sensor map. `append` holds the write guard
//! for the whole evict-and-push step, so readers never see a half-applied
//! append. The guard is never held across I/O or an `.await`.

use crate::history::{HistorySnapshot, LatestReading, SensorHistory};
use crate::reading::SensorReading;
use redap_core::DEFAULT_MAX_HISTORY;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Process-wide store of per-sensor histories.
pub struct TelemetryStore {
    histories: RwLock<HashMap<String, SensorHistory>>,
    max_history: usize,
    appends: AtomicU64,
    evictions: AtomicU64,
}

/// Store counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Known sensors
    pub sensors: usize,
    /// Readings appended since start
    pub total_appends: u64,
    /// Entries evicted by the retention cap
    pub total_evictions: u64,
}

impl TelemetryStore {
    /// Create a store retaining the default 50 readings per sensor
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    /// Create a store with a custom per-sensor retention cap (minimum 1)
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
            max_history: max_history.max(1),
            appends: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Record a reading, creating the sensor's history on first sight.
    pub fn append(&self, reading: SensorReading) {
        let (created, evicted) = {
            let mut histories = self.write();
            let created = !histories.contains_key(reading.sensor_id());
            if created {
                histories.insert(
                    reading.sensor_id().to_string(),
                    SensorHistory::new(self.max_history),
                );
            }
            let evicted = histories
                .get_mut(reading.sensor_id())
                .map_or(0, |history| history.push(&reading));
            (created, evicted)
        };

        if created {
            info!(sensor_id = %reading.sensor_id(), "Registered new sensor");
        }
        self.appends.fetch_add(1, Ordering::Relaxed);
        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        }
        debug!(
            sensor_id = %reading.sensor_id(),
            temp = reading.temperature(),
            hum = reading.humidity(),
            nivel = reading.level(),
            evicted,
            "Reading appended"
        );
    }

    /// Copy of one sensor's history, or `None` for an unknown sensor.
    pub fn snapshot(&self, sensor_id: &str) -> Option<HistorySnapshot> {
        self.read().get(sensor_id).map(SensorHistory::snapshot)
    }

    /// Copy of every sensor's history, keyed and ordered by sensor id.
    pub fn snapshot_all(&self) -> BTreeMap<String, HistorySnapshot> {
        self.read()
            .iter()
            .map(|(id, history)| (id.clone(), history.snapshot()))
            .collect()
    }

    /// Newest entry for a sensor.
    pub fn latest(&self, sensor_id: &str) -> Option<LatestReading> {
        self.read().get(sensor_id).and_then(SensorHistory::latest)
    }

    /// Newest entry for every sensor, ordered by sensor id.
    pub fn latest_all(&self) -> BTreeMap<String, LatestReading> {
        self.read()
            .iter()
            .filter_map(|(id, history)| history.latest().map(|latest| (id.clone(), latest)))
            .collect()
    }

    /// Sorted ids of every known sensor.
    pub fn sensor_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn sensor_count(&self) -> usize {
        self.read().len()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            sensors: self.sensor_count(),
            total_appends: self.appends.load(Ordering::Relaxed),
            total_evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    // A panic while holding the guard cannot leave a history half-written:
    // every mutation is a single pop/push on one ring. Recover the map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SensorHistory>> {
        self.histories.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SensorHistory>> {
        self.histories.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}
