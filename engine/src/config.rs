//! Engine configuration loaded from `engine.toml`
//!
//! Values missing from the file fall back to defaults. The sweep token can
//! be supplied through the `SWEEP_TOKEN` environment variable (a `.env`
//! file is honored), which takes precedence over the file.

use chrono::Duration;
use serde::Deserialize;
use std::path::Path;

use shared::AlgorithmWeights;

use crate::error::{EngineError, EngineResult};

/// Top-level configuration for the matching engine
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Minutes a cleaner has to respond before a pending offer expires.
    #[serde(default = "default_offer_timeout_minutes")]
    pub offer_timeout_minutes: i64,

    /// Minutes past the scheduled start before a missing check-in counts
    /// as a no-show.
    #[serde(default = "default_no_show_grace_minutes")]
    pub no_show_grace_minutes: i64,

    /// Period of the recovery sweeper.
    #[serde(default = "default_sweep_interval_minutes")]
    pub sweep_interval_minutes: u64,

    /// Consecutive failed offers before a booking is flagged for an
    /// operator instead of retried.
    #[serde(default = "default_max_offer_attempts")]
    pub max_offer_attempts: u32,

    /// Two bookings within this window count as a scheduling conflict for
    /// one cleaner.
    #[serde(default = "default_conflict_window_minutes")]
    pub conflict_window_minutes: i64,

    /// Shared secret required by the sweep entry point.
    #[serde(default = "default_sweep_token")]
    pub sweep_token: String,

    /// Initial scoring weights; hot-reloadable at runtime through the
    /// validated update path.
    #[serde(default)]
    pub weights: AlgorithmWeights,
}

fn default_offer_timeout_minutes() -> i64 {
    15
}

fn default_no_show_grace_minutes() -> i64 {
    30
}

fn default_sweep_interval_minutes() -> u64 {
    5
}

fn default_max_offer_attempts() -> u32 {
    5
}

fn default_conflict_window_minutes() -> i64 {
    120
}

fn default_sweep_token() -> String {
    "local-dev-token".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            offer_timeout_minutes: default_offer_timeout_minutes(),
            no_show_grace_minutes: default_no_show_grace_minutes(),
            sweep_interval_minutes: default_sweep_interval_minutes(),
            max_offer_attempts: default_max_offer_attempts(),
            conflict_window_minutes: default_conflict_window_minutes(),
            sweep_token: default_sweep_token(),
            weights: AlgorithmWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Storage {
                detail: format!("reading {}: {e}", path.display()),
            })?;
            toml::from_str::<EngineConfig>(&contents).map_err(|e| EngineError::ConfigInvalid {
                detail: e.to_string(),
            })?
        } else {
            Self::default()
        };

        // Environment takes precedence over the file for the sweep secret.
        let _ = dotenv::dotenv();
        if let Ok(token) = std::env::var("SWEEP_TOKEN") {
            if !token.is_empty() {
                config.sweep_token = token;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde defaults cannot express.
    pub fn validate(&self) -> EngineResult<()> {
        if self.offer_timeout_minutes <= 0 {
            return Err(EngineError::ConfigInvalid {
                detail: format!("offer_timeout_minutes must be positive, got {}", self.offer_timeout_minutes),
            });
        }
        if self.no_show_grace_minutes <= 0 {
            return Err(EngineError::ConfigInvalid {
                detail: format!("no_show_grace_minutes must be positive, got {}", self.no_show_grace_minutes),
            });
        }
        if self.max_offer_attempts == 0 {
            return Err(EngineError::ConfigInvalid {
                detail: "max_offer_attempts must be at least 1".to_string(),
            });
        }
        if self.sweep_token.is_empty() {
            return Err(EngineError::ConfigInvalid {
                detail: "sweep_token must not be empty".to_string(),
            });
        }
        self.weights.validate().map_err(|e| EngineError::ConfigInvalid {
            detail: e.to_string(),
        })
    }

    pub fn offer_timeout(&self) -> Duration {
        Duration::minutes(self.offer_timeout_minutes)
    }

    pub fn no_show_grace(&self) -> Duration {
        Duration::minutes(self.no_show_grace_minutes)
    }

    pub fn conflict_window(&self) -> Duration {
        Duration::minutes(self.conflict_window_minutes)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_minutes * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.offer_timeout_minutes, 15);
        assert_eq!(config.no_show_grace_minutes, 30);
        assert_eq!(config.sweep_interval_minutes, 5);
        assert_eq!(config.max_offer_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            max_offer_attempts = 3
            no_show_grace_minutes = 45
        "#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_offer_attempts, 3);
        assert_eq!(config.no_show_grace_minutes, 45);
        assert_eq!(config.offer_timeout_minutes, 15);
    }

    #[test]
    fn load_reads_weights_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[weights]\nrating = 0.25\ndistance = 0.25\nacceptance = 0.25\npunctuality = 0.25"
        )
        .unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.weights.rating, 0.25);
        assert!(config.weights.is_valid());
    }

    #[test]
    fn invalid_weights_in_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[weights]\nrating = 0.5\ndistance = 0.3\nacceptance = 0.3\npunctuality = 0.3"
        )
        .unwrap();

        let result = EngineConfig::load(file.path());
        assert!(matches!(result, Err(EngineError::ConfigInvalid { .. })));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = EngineConfig {
            offer_timeout_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
