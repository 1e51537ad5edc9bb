//! Audit module for the Wellbeing Risk Engine.
//!
//! This module keeps running counts of what the engine has computed,
//! stored, and alerted on, without retaining any assessment content.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, AssessmentLog, AuditStats,
    SharedAssessmentLog,
};
