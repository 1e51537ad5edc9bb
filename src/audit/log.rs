//! Running counters of engine activity.
//!
//! Counts only; user identifiers, scores, and recommendations are never
//! written here.

use crate::core::types::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Counters for the current process, optionally persisted across runs.
#[derive(Debug)]
pub struct AssessmentLog {
    /// Assessments computed, by overall level
    low: AtomicU64,
    medium: AtomicU64,
    high: AtomicU64,
    /// Assessments that could not be computed (fetch failures)
    failed: AtomicU64,
    /// Successful saves
    saves_succeeded: AtomicU64,
    /// Saves reported as failed by the store
    saves_failed: AtomicU64,
    /// Alerts handed to the sink
    alerts_raised: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl AssessmentLog {
    pub fn new() -> Self {
        Self {
            low: AtomicU64::new(0),
            medium: AtomicU64::new(0),
            high: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            saves_succeeded: AtomicU64::new(0),
            saves_failed: AtomicU64::new(0),
            alerts_raised: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that loads previous totals from `path` and saves back to it.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            debug!(error = %e, "could not load previous audit stats");
        }

        log
    }

    /// Record a computed assessment.
    pub fn record_assessment(&self, level: RiskLevel) {
        let counter = match level {
            RiskLevel::Low => &self.low,
            RiskLevel::Medium => &self.medium,
            RiskLevel::High => &self.high,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an assessment that could not be computed.
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a save.
    pub fn record_save(&self, success: bool) {
        if success {
            self.saves_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.saves_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a delivered alert.
    pub fn record_alert(&self) {
        self.alerts_raised.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> AuditStats {
        let low = self.low.load(Ordering::Relaxed);
        let medium = self.medium.load(Ordering::Relaxed);
        let high = self.high.load(Ordering::Relaxed);
        AuditStats {
            assessments_computed: low + medium + high,
            low,
            medium,
            high,
            failed: self.failed.load(Ordering::Relaxed),
            saves_succeeded: self.saves_succeeded.load(Ordering::Relaxed),
            saves_failed: self.saves_failed.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Assessment Statistics:\n\
             - Assessments computed: {} (low {}, medium {}, high {})\n\
             - Assessments failed: {}\n\
             - Saves succeeded: {}\n\
             - Saves failed: {}\n\
             - Alerts raised: {}\n\
             - Session duration: {} seconds",
            stats.assessments_computed,
            stats.low,
            stats.medium,
            stats.high,
            stats.failed,
            stats.saves_succeeded,
            stats.saves_failed,
            stats.alerts_raised,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                low: stats.low,
                medium: stats.medium,
                high: stats.high,
                failed: stats.failed,
                saves_succeeded: stats.saves_succeeded,
                saves_failed: stats.saves_failed,
                alerts_raised: stats.alerts_raised,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.low.store(persisted.low, Ordering::Relaxed);
                self.medium.store(persisted.medium, Ordering::Relaxed);
                self.high.store(persisted.high, Ordering::Relaxed);
                self.failed.store(persisted.failed, Ordering::Relaxed);
                self.saves_succeeded
                    .store(persisted.saves_succeeded, Ordering::Relaxed);
                self.saves_failed
                    .store(persisted.saves_failed, Ordering::Relaxed);
                self.alerts_raised
                    .store(persisted.alerts_raised, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for AssessmentLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of audit statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub assessments_computed: u64,
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub failed: u64,
    pub saves_succeeded: u64,
    pub saves_failed: u64,
    pub alerts_raised: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    low: u64,
    medium: u64,
    high: u64,
    failed: u64,
    saves_succeeded: u64,
    saves_failed: u64,
    alerts_raised: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared assessment log.
pub type SharedAssessmentLog = Arc<AssessmentLog>;

/// Create a new shared assessment log.
pub fn create_shared_log() -> SharedAssessmentLog {
    Arc::new(AssessmentLog::new())
}

/// Create a new shared assessment log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAssessmentLog {
    Arc::new(AssessmentLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_level() {
        let log = AssessmentLog::new();

        log.record_assessment(RiskLevel::Low);
        log.record_assessment(RiskLevel::High);
        log.record_assessment(RiskLevel::High);
        log.record_save(true);
        log.record_save(false);

        let stats = log.stats();
        assert_eq!(stats.assessments_computed, 3);
        assert_eq!(stats.low, 1);
        assert_eq!(stats.high, 2);
        assert_eq!(stats.saves_succeeded, 1);
        assert_eq!(stats.saves_failed, 1);
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("wellbeing-audit-{}", uuid::Uuid::new_v4()))
            .join("audit.json");

        let log = AssessmentLog::with_persistence(path.clone());
        log.record_assessment(RiskLevel::Medium);
        log.record_alert();
        log.save().unwrap();

        let reloaded = AssessmentLog::with_persistence(path.clone());
        let stats = reloaded.stats();
        assert_eq!(stats.medium, 1);
        assert_eq!(stats.alerts_raised, 1);

        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn test_summary_format() {
        let log = AssessmentLog::new();
        let summary = log.summary();

        assert!(summary.contains("Assessments computed"));
        assert!(summary.contains("Saves failed"));
        assert!(summary.contains("Alerts raised"));
    }
}
