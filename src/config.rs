//! Configuration for the Wellbeing Risk Engine.

use crate::core::aggregate::{Dispatch, EngineSettings};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "wellbeing-risk-engine";

/// Main configuration for the engine and its CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the per-user JSON history exports
    pub data_path: PathBuf,

    /// Root of the stored assessments
    pub store_path: PathBuf,

    /// Daily step target used for goal achievement
    pub step_target: u32,

    /// IANA timezone used to decide calendar days
    pub timezone: String,

    /// Days of step history used for fall risk
    pub weekly_window_days: u32,

    /// Days of step history used for frailty risk
    pub monthly_window_days: u32,

    /// Days considered when counting app usage
    pub app_usage_window_days: u32,

    /// Interval between scheduled reassessments
    #[serde(with = "duration_serde")]
    pub reassessment_interval: Duration,

    /// Run the three analyzers on separate threads
    pub parallel_analyzers: bool,

    /// Raise alerts for medium and high assessments
    pub alerts_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            data_path: data_dir.join("history"),
            store_path: data_dir.join("assessments"),
            step_target: 5000,
            timezone: "Asia/Tokyo".to_string(),
            weekly_window_days: 7,
            monthly_window_days: 30,
            app_usage_window_days: 7,
            reassessment_interval: Duration::from_secs(7 * 24 * 60 * 60),
            parallel_analyzers: true,
            alerts_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.store_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reassessment_interval.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        self.tz()?;
        Ok(())
    }

    /// Parse the configured timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Path of the persisted audit counters.
    pub fn audit_log_path(&self) -> PathBuf {
        self.store_path.join("audit.json")
    }

    /// Engine windows and target derived from this configuration.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            step_target: self.step_target,
            weekly_window_days: self.weekly_window_days,
            monthly_window_days: self.monthly_window_days,
            app_usage_window_days: self.app_usage_window_days,
            dispatch: if self.parallel_analyzers {
                Dispatch::Parallel
            } else {
                Dispatch::Sequential
            },
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
    #[error("reassessment_interval must be at least one second")]
    InvalidInterval,
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
