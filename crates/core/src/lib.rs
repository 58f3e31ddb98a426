//! Core functionality for the REDAP telemetry gateway.
//!
//! This crate provides the configuration model, logging bootstrap and the
//! shared error type used across the workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    BrokerConfig, Config, HttpConfig, LogFormat, LoggingConfig, StoreConfig, DEFAULT_MAX_ALERTS,
    DEFAULT_MAX_HISTORY,
};
pub use error::{CoreError, Result};
