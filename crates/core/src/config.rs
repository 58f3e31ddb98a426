//! Configuration management for the REDAP gateway.
//!
//! Values are layered: built-in defaults, then an optional TOML file named by
//! `REDAP_CONFIG`, then individual `REDAP_*` environment overrides.

use crate::error::{CoreError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "REDAP_CONFIG";

/// Default number of readings retained per sensor.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Default number of alert events retained.
pub const DEFAULT_MAX_ALERTS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub broker: BrokerConfig,
    pub http: HttpConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Wildcard topic covering every sensor channel.
    pub topic: String,
    /// Prefix for the MQTT client id; a random suffix is added per process.
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub connect_timeout_ms: u64,
    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,
    /// Request channel capacity handed to the MQTT client.
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Directory holding the landing `index.html`.
    pub static_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub max_history: usize,
    pub alert_level: f64,
    pub risk_level: f64,
    pub critical_level: f64,
    /// Risk/critical transitions kept in the alert log.
    pub max_alerts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            topic: "sensors/#".to_string(),
            client_id: "redap-gateway".to_string(),
            keep_alive_secs: 60,
            connect_timeout_ms: 5_000,
            reconnect_initial_ms: 500,
            reconnect_max_ms: 30_000,
            channel_capacity: 64,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: "frontend".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            alert_level: 15.0,
            risk_level: 20.0,
            critical_level: 25.0,
            max_alerts: DEFAULT_MAX_ALERTS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load defaults, the optional `REDAP_CONFIG` file and environment
    /// overrides, then validate the result.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default_config(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Apply `REDAP_*` overrides using `lookup` to resolve variable names.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("REDAP_BROKER_HOST") {
            self.broker.host = host;
        }
        if let Some(port) = lookup("REDAP_BROKER_PORT") {
            self.broker.port = parse_env("REDAP_BROKER_PORT", port)?;
        }
        if let Some(topic) = lookup("REDAP_BROKER_TOPIC") {
            self.broker.topic = topic;
        }
        if let Some(bind) = lookup("REDAP_HTTP_BIND") {
            self.http.bind_addr = bind;
        }
        if let Some(port) = lookup("REDAP_HTTP_PORT") {
            self.http.port = parse_env("REDAP_HTTP_PORT", port)?;
        }
        if let Some(dir) = lookup("REDAP_STATIC_DIR") {
            self.http.static_dir = dir;
        }
        if let Some(cap) = lookup("REDAP_MAX_HISTORY") {
            self.store.max_history = parse_env("REDAP_MAX_HISTORY", cap)?;
        }
        if let Some(format) = lookup("REDAP_LOG_FORMAT") {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => {
                    return Err(CoreError::InvalidEnv {
                        key: "REDAP_LOG_FORMAT",
                        value: format,
                    })
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.broker.host.trim().is_empty() {
            return Err(CoreError::InvalidConfig("broker.host is empty".into()));
        }
        if self.broker.port == 0 {
            return Err(CoreError::InvalidConfig("broker.port must be non-zero".into()));
        }
        let client_id = &self.broker.client_id;
        if client_id.trim().is_empty() || client_id.starts_with(char::is_whitespace) {
            return Err(CoreError::InvalidConfig(format!(
                "broker.client_id {client_id:?} must be non-blank and not start with whitespace"
            )));
        }
        if self.broker.topic.trim().is_empty() {
            return Err(CoreError::InvalidConfig("broker.topic is empty".into()));
        }
        if self.broker.channel_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "broker.channel_capacity must be at least 1".into(),
            ));
        }
        if self.broker.reconnect_initial_ms == 0
            || self.broker.reconnect_initial_ms > self.broker.reconnect_max_ms
        {
            return Err(CoreError::InvalidConfig(format!(
                "reconnect backoff must satisfy 0 < initial ({}) <= max ({})",
                self.broker.reconnect_initial_ms, self.broker.reconnect_max_ms
            )));
        }
        if self.http.port == 0 {
            return Err(CoreError::InvalidConfig("http.port must be non-zero".into()));
        }
        if self.store.max_history == 0 {
            return Err(CoreError::InvalidConfig(
                "store.max_history must be at least 1".into(),
            ));
        }
        if self.store.max_alerts == 0 {
            return Err(CoreError::InvalidConfig(
                "store.max_alerts must be at least 1".into(),
            ));
        }
        let store = &self.store;
        if !(store.alert_level < store.risk_level && store.risk_level < store.critical_level) {
            return Err(CoreError::InvalidConfig(format!(
                "level thresholds must ascend: alert {} < risk {} < critical {}",
                store.alert_level, store.risk_level, store.critical_level
            )));
        }
        Ok(())
    }

    /// `host:port` the HTTP listener binds to.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http.bind_addr, self.http.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CoreError::InvalidEnv { key, value })
}
