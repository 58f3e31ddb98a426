//! Bounded per-sensor history.
//!
//! A history keeps its entries in a single ring, so the four parallel
//! sequences handed out in a [`HistorySnapshot`] always have equal length.

use crate::reading::SensorReading;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
struct HistoryEntry {
    recorded_at: DateTime<Local>,
    label: String,
    temperature: f64,
    humidity: f64,
    level: f64,
}

/// Bounded FIFO retention buffer for one sensor.
#[derive(Debug, Clone)]
pub struct SensorHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl SensorHistory {
    /// Create an empty history holding at most `capacity` entries.
    ///
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest entries first when full.
    ///
    /// Returns the number of evicted entries.
    pub fn push(&mut self, reading: &SensorReading) -> usize {
        let mut evicted = 0;
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
            evicted += 1;
        }
        self.entries.push_back(HistoryEntry {
            recorded_at: reading.recorded_at(),
            label: reading.label(),
            temperature: reading.temperature(),
            humidity: reading.humidity(),
            level: reading.level(),
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Option<LatestReading> {
        self.entries.back().map(|entry| LatestReading {
            recorded_at: entry.recorded_at,
            label: entry.label.clone(),
            temp: entry.temperature,
            hum: entry.humidity,
            nivel: entry.level,
        })
    }

    /// Copy the history out as four parallel sequences.
    pub fn snapshot(&self) -> HistorySnapshot {
        let len = self.entries.len();
        let mut snapshot = HistorySnapshot {
            labels: Vec::with_capacity(len),
            temp: Vec::with_capacity(len),
            hum: Vec::with_capacity(len),
            nivel: Vec::with_capacity(len),
        };
        for entry in &self.entries {
            snapshot.labels.push(entry.label.clone());
            snapshot.temp.push(entry.temperature);
            snapshot.hum.push(entry.humidity);
            snapshot.nivel.push(entry.level);
        }
        snapshot
    }
}

/// Point-in-time copy of a sensor history, in the HTTP wire shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Recording timestamps (`HH:MM:SS`)
    pub labels: Vec<String>,
    /// Temperatures
    pub temp: Vec<f64>,
    /// Relative humidities
    pub hum: Vec<f64>,
    /// Water levels
    pub nivel: Vec<f64>,
}

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// True when all four sequences have the same length.
    pub fn is_consistent(&self) -> bool {
        let len = self.labels.len();
        self.temp.len() == len && self.hum.len() == len && self.nivel.len() == len
    }
}

/// The newest entry of a history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestReading {
    /// Full receipt time; labels alone do not order across midnight
    #[serde(skip)]
    pub recorded_at: DateTime<Local>,
    pub label: String,
    pub temp: f64,
    pub hum: f64,
    pub nivel: f64,
}
