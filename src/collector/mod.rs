//! Data sources feeding the risk engine.
//!
//! A [`HealthDataSource`] answers the three history queries the engine needs.
//! Two implementations are provided: an in-memory source for embedding and
//! tests, and a JSON-file source reading per-user exports from disk.

pub mod file;
pub mod memory;

use crate::core::types::{DailyStepRecord, MoodRecord};

pub use file::JsonFileSource;
pub use memory::InMemorySource;

/// Errors raised while fetching history from a data source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}

/// Read access to a user's activity, mood, and engagement history.
pub trait HealthDataSource {
    /// Daily step records for the last `days` days, oldest first.
    fn step_history(&self, user_id: &str, days: u32) -> Result<Vec<DailyStepRecord>, SourceError>;

    /// Mood check-ins from the last `days` days, oldest first.
    fn mood_history(&self, user_id: &str, days: u32) -> Result<Vec<MoodRecord>, SourceError>;

    /// Number of distinct days the app was used within the last `window_days` days.
    fn app_usage_day_count(&self, user_id: &str, window_days: u32) -> Result<u32, SourceError>;
}

impl<T: HealthDataSource + ?Sized> HealthDataSource for &T {
    fn step_history(&self, user_id: &str, days: u32) -> Result<Vec<DailyStepRecord>, SourceError> {
        (**self).step_history(user_id, days)
    }

    fn mood_history(&self, user_id: &str, days: u32) -> Result<Vec<MoodRecord>, SourceError> {
        (**self).mood_history(user_id, days)
    }

    fn app_usage_day_count(&self, user_id: &str, window_days: u32) -> Result<u32, SourceError> {
        (**self).app_usage_day_count(user_id, window_days)
    }
}
