//! Core risk calculation for the Wellbeing Risk Engine.
//!
//! This module contains:
//! - Input records and assessment value types
//! - The fall, frailty, and mental health analyzers
//! - Aggregation into an overall assessment with recommendations

pub mod aggregate;
pub mod fall;
pub mod frailty;
pub mod mental;
mod stats;
pub mod types;

// Re-export commonly used types
pub use aggregate::{
    aggregate, calculate_overall_risk, generate_recommendations, AssessmentError,
    AssessmentInputs, Dispatch, EngineSettings, RiskEngine,
};
pub use fall::calculate_fall_risk;
pub use frailty::calculate_frailty_risk;
pub use mental::calculate_mental_health_risk;
pub use types::{
    determine_risk_level, DailyStepRecord, FallIndicators, FallRiskAssessment,
    FrailtyIndicators, FrailtyRiskAssessment, MentalHealthIndicators,
    MentalHealthRiskAssessment, MonthlyTrend, MoodRecord, OverallRiskAssessment, RiskLevel,
    RiskType, SocialActivity, SubRiskAssessment,
};
