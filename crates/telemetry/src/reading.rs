//! Sensor readings and the inbound payload decoder.
//!
//! Sensors publish JSON objects of the form
//! `{"id": "s1", "temp": 21.5, "hum": 60, "nivel": 3}`. The receipt time is
//! stamped locally; nothing time-related is read from the payload.

use crate::error::DecodeError;
use chrono::{DateTime, Local};
use serde_json::{Map, Value};

/// Label format for recording timestamps.
pub const LABEL_FORMAT: &str = "%H:%M:%S";

/// One decoded measurement event for one sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    sensor_id: String,
    recorded_at: DateTime<Local>,
    temperature: f64,
    humidity: f64,
    level: f64,
}

impl SensorReading {
    pub fn new(
        sensor_id: impl Into<String>,
        recorded_at: DateTime<Local>,
        temperature: f64,
        humidity: f64,
        level: f64,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            recorded_at,
            temperature,
            humidity,
            level,
        }
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn recorded_at(&self) -> DateTime<Local> {
        self.recorded_at
    }

    /// Receipt time rendered as `HH:MM:SS`.
    pub fn label(&self) -> String {
        self.recorded_at.format(LABEL_FORMAT).to_string()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn level(&self) -> f64 {
        self.level
    }
}

/// Decode a raw payload, stamping it with the current local time.
pub fn decode(raw: &[u8]) -> Result<SensorReading, DecodeError> {
    decode_at(raw, Local::now())
}

/// Decode a raw payload with a caller-supplied receipt time.
pub fn decode_at(raw: &[u8], recorded_at: DateTime<Local>) -> Result<SensorReading, DecodeError> {
    let value: Value = serde_json::from_slice(raw)?;
    let fields = value.as_object().ok_or(DecodeError::NotAnObject)?;

    let sensor_id = sensor_id(fields)?;
    let temperature = number(fields, "temp")?;
    let humidity = number(fields, "hum")?;
    let level = number(fields, "nivel")?;

    Ok(SensorReading {
        sensor_id,
        recorded_at,
        temperature,
        humidity,
        level,
    })
}

fn sensor_id(fields: &Map<String, Value>) -> Result<String, DecodeError> {
    match fields.get("id") {
        None | Some(Value::Null) => Err(DecodeError::MissingField("id")),
        Some(Value::String(id)) if id.trim().is_empty() => {
            Err(DecodeError::InvalidId("empty string".into()))
        }
        Some(Value::String(id)) => Ok(id.clone()),
        // Some firmware publishes numeric station ids.
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        Some(other) => Err(DecodeError::InvalidId(other.to_string())),
    }
}

fn number(fields: &Map<String, Value>, field: &'static str) -> Result<f64, DecodeError> {
    let value = match fields.get(field) {
        None | Some(Value::Null) => return Err(DecodeError::MissingField(field)),
        Some(value) => value,
    };

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(DecodeError::NonNumeric {
            field,
            value: value.to_string(),
        }),
    }
}
