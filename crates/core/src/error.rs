//! Core error types

use thiserror::Error;

/// Core error type for the REDAP gateway
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An environment override carried a value of the wrong shape
    #[error("Invalid value {value:?} for {key}")]
    InvalidEnv {
        /// Environment variable name
        key: &'static str,
        /// Raw value as found in the environment
        value: String,
    },

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
