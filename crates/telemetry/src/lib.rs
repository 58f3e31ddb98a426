//! REDAP Telemetry
//!
//! Sensor telemetry ingestion: payload decoding, the bounded concurrent
//! history store, the read-only query facade and the MQTT subscription
//! driver that feeds it.

pub mod alerts;
pub mod backoff;
pub mod error;
pub mod history;
pub mod level;
pub mod query;
pub mod reading;
pub mod store;
pub mod subscriber;

pub use alerts::{AlertEvent, AlertLog};
pub use backoff::Backoff;
pub use error::{ConnectionError, DecodeError, TelemetryError, TelemetryResult};
pub use history::{HistorySnapshot, LatestReading, SensorHistory};
pub use level::{LevelStatus, LevelThresholds};
pub use query::{SensorQuery, SensorStatus, StatusOverview};
pub use reading::{decode, decode_at, SensorReading};
pub use store::{StoreStats, TelemetryStore};
pub use subscriber::{ConnectionState, DriverCounters, DriverStats, SubscriptionDriver};
