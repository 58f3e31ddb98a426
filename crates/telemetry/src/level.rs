//! Water-level status classification.

use redap_core::StoreConfig;
use serde::{Deserialize, Serialize};

/// Flood status derived from a level reading, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelStatus {
    Normal,
    Alert,
    Risk,
    Critical,
}

impl LevelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelStatus::Normal => "normal",
            LevelStatus::Alert => "alert",
            LevelStatus::Risk => "risk",
            LevelStatus::Critical => "critical",
        }
    }
}

impl std::fmt::Display for LevelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exclusive lower bounds for each status above `Normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThresholds {
    pub alert: f64,
    pub risk: f64,
    pub critical: f64,
}

impl LevelThresholds {
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            alert: config.alert_level,
            risk: config.risk_level,
            critical: config.critical_level,
        }
    }

    pub fn classify(&self, level: f64) -> LevelStatus {
        if level > self.critical {
            LevelStatus::Critical
        } else if level > self.risk {
            LevelStatus::Risk
        } else if level > self.alert {
            LevelStatus::Alert
        } else {
            LevelStatus::Normal
        }
    }
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_exclusive() {
        let thresholds = LevelThresholds::default();
        assert_eq!(thresholds.classify(0.0), LevelStatus::Normal);
        assert_eq!(thresholds.classify(15.0), LevelStatus::Normal);
        assert_eq!(thresholds.classify(15.1), LevelStatus::Alert);
        assert_eq!(thresholds.classify(20.0), LevelStatus::Alert);
        assert_eq!(thresholds.classify(20.5), LevelStatus::Risk);
        assert_eq!(thresholds.classify(25.0), LevelStatus::Risk);
        assert_eq!(thresholds.classify(34.9), LevelStatus::Critical);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(LevelStatus::Critical > LevelStatus::Risk);
        assert!(LevelStatus::Risk > LevelStatus::Alert);
        assert!(LevelStatus::Alert > LevelStatus::Normal);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = LevelThresholds {
            alert: 1.0,
            risk: 2.0,
            critical: 3.0,
        };
        assert_eq!(thresholds.classify(2.5), LevelStatus::Risk);
        assert_eq!(serde_json::to_string(&LevelStatus::Critical).unwrap(), "\"critical\"");
    }
}
