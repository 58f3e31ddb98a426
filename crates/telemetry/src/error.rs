//! Error types for REDAP telemetry ingestion.
//!
//! Ingest failures never reach query callers: decode errors drop one message,
//! connection errors trigger a reconnect.

use thiserror::Error;

/// Reasons an inbound payload could not be turned into a reading.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid JSON
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Payload parsed but is not a JSON object
    #[error("Payload is not a JSON object")]
    NotAnObject,

    /// A required field is absent
    #[error("Missing field `{0}`")]
    MissingField(&'static str),

    /// A measurement field cannot be read as a number
    #[error("Field `{field}` is not numeric: {value}")]
    NonNumeric {
        /// Field name
        field: &'static str,
        /// Offending JSON value, rendered
        value: String,
    },

    /// The `id` field is empty or of an unsupported type
    #[error("Invalid sensor id: {0}")]
    InvalidId(String),
}

/// Broker connectivity failures.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Transport or protocol error reported by the MQTT event loop
    #[error("Broker connection error: {0}")]
    Broker(#[from] rumqttc::ConnectionError),

    /// Connection attempt did not complete within the configured bound
    #[error("Connect timed out after {0}ms")]
    Timeout(u64),

    /// Subscribe request could not be queued
    #[error("Subscribe failed: {0}")]
    Subscribe(#[from] rumqttc::ClientError),
}

/// Errors that can occur in telemetry operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Payload decoding errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Broker connectivity errors
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
