//! Wellbeing Risk Engine - risk scoring for elderly activity and mood signals.
//!
//! This library turns daily step counts, mood check-ins, and app engagement
//! into three independent risk sub-scores (fall, frailty, mental health) and
//! a combined assessment with recommendations.
//!
//! # Guarantees
//!
//! - **Pure scoring**: Analyzers never perform I/O and never panic on well-typed input
//! - **Bounded scores**: Every sub-score is clamped to 0-100
//! - **Dominant level**: The overall level is always the highest sub-level
//! - **No substitution**: A failed mood fetch aborts the assessment instead of guessing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Wellbeing Risk Engine                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Collector  │──▶│  Analyzers  │──▶│  Aggregate  │       │
//! │  │  (history)  │   │ fall/frailty│   │ level + recs│       │
//! │  └─────────────┘   │   /mental   │   └─────────────┘       │
//! │                    └─────────────┘          │              │
//! │                                    ┌────────┴────────┐     │
//! │                                    ▼                 ▼     │
//! │                             ┌─────────────┐   ┌──────────┐ │
//! │                             │    Store    │   │  Alerts  │ │
//! │                             └─────────────┘   └──────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use wellbeing_risk_engine::{collector::InMemorySource, core::{EngineSettings, RiskEngine}};
//!
//! let source = InMemorySource::new();
//! let engine = RiskEngine::new(source, EngineSettings::default());
//!
//! let assessment = engine.assess("user-1").expect("history fetch failed");
//! println!("overall: {}", assessment.overall_level);
//! ```

pub mod alert;
pub mod audit;
pub mod collector;
pub mod config;
pub mod core;
pub mod store;

#[cfg(feature = "gateway")]
pub mod gateway;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use alert::{alert_for, Alert, AlertSink, TracingAlertSink};
pub use audit::{AssessmentLog, AuditStats, SharedAssessmentLog};
pub use collector::{HealthDataSource, InMemorySource, JsonFileSource, SourceError};
pub use config::Config;
pub use crate::core::{
    calculate_fall_risk, calculate_frailty_risk, calculate_mental_health_risk,
    calculate_overall_risk, determine_risk_level, AssessmentError, DailyStepRecord, MoodRecord,
    OverallRiskAssessment, RiskEngine, RiskLevel,
};
pub use store::{validate_user_id, AssessmentStore, JsonFileStore, MemoryStore, SaveResult};

// Gateway re-exports (when enabled)
#[cfg(feature = "gateway")]
pub use gateway::{BlockingGatewayClient, GatewayClient, GatewayConfig, GatewayError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice shown alongside assessments.
pub const ASSESSMENT_DISCLAIMER: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║          WELLBEING RISK ENGINE - ABOUT THESE ASSESSMENTS         ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Assessments are screening signals, not a medical diagnosis.     ║
║                                                                  ║
║  ✓ WHAT IS USED:                                                 ║
║    • Daily step counts (last 7 and 30 days)                      ║
║    • Mood check-ins (last 7 days)                                ║
║    • Number of days the app was opened (last 7 days)             ║
║                                                                  ║
║  ✗ WHAT IS NEVER USED:                                           ║
║    • Location or GPS traces                                      ║
║    • Conversation content                                        ║
║    • Contacts or messages                                        ║
║                                                                  ║
║  Scores are recomputed from scratch every time; nothing is       ║
║  carried over between assessments except what is stored.         ║
║                                                                  ║
║  If you feel unwell, contact your doctor or caregiver.           ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disclaimer_contents() {
        assert!(ASSESSMENT_DISCLAIMER.contains("not a medical diagnosis"));
        assert!(ASSESSMENT_DISCLAIMER.contains("NEVER USED"));
        assert!(ASSESSMENT_DISCLAIMER.contains("Mood check-ins"));
    }
}
