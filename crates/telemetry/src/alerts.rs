//! Log of sensors entering risk or critical status.
//!
//! An event is recorded when a sensor's newest level crosses into `Risk` or
//! `Critical` from a calmer status (or on its first reading). Moving between
//! `Risk` and `Critical` is not a new event.

use crate::level::{LevelStatus, LevelThresholds};
use crate::reading::SensorReading;
use redap_core::DEFAULT_MAX_ALERTS;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// One recorded transition into a dangerous status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub sensor_id: String,
    /// Receipt time of the triggering reading (`HH:MM:SS`)
    pub label: String,
    pub status: LevelStatus,
    pub nivel: f64,
}

#[derive(Debug, Default)]
struct AlertState {
    last_status: HashMap<String, LevelStatus>,
    /// Newest first
    events: VecDeque<AlertEvent>,
}

/// Bounded, newest-first alert log.
#[derive(Debug)]
pub struct AlertLog {
    thresholds: LevelThresholds,
    capacity: usize,
    state: Mutex<AlertState>,
}

fn is_dangerous(status: LevelStatus) -> bool {
    status >= LevelStatus::Risk
}

impl AlertLog {
    /// Create a log keeping at most `capacity` events (minimum 1).
    pub fn new(thresholds: LevelThresholds, capacity: usize) -> Self {
        Self {
            thresholds,
            capacity: capacity.max(1),
            state: Mutex::new(AlertState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Classify a reading and record an event if it enters a dangerous status.
    pub fn observe(&self, reading: &SensorReading) -> Option<AlertEvent> {
        let status = self.thresholds.classify(reading.level());
        let event = {
            let mut state = self.lock();
            let previous = state
                .last_status
                .insert(reading.sensor_id().to_string(), status);

            if !is_dangerous(status) || previous.is_some_and(is_dangerous) {
                return None;
            }

            let event = AlertEvent {
                sensor_id: reading.sensor_id().to_string(),
                label: reading.label(),
                status,
                nivel: reading.level(),
            };
            state.events.push_front(event.clone());
            state.events.truncate(self.capacity);
            event
        };

        warn!(
            sensor_id = %event.sensor_id,
            status = %event.status,
            nivel = event.nivel,
            "Sensor entered {} status",
            event.status
        );
        Some(event)
    }

    /// Copy of the retained events, newest first.
    pub fn recent(&self) -> Vec<AlertEvent> {
        self.lock().events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, AlertState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(LevelThresholds::default(), DEFAULT_MAX_ALERTS)
    }
}
