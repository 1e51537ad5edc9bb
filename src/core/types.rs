//! Input records and assessment values for the risk engine.
//!
//! Inputs are plain records handed over by the data collaborators. Outputs are
//! immutable assessment values; storage and ownership belong to the caller.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Step count for a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStepRecord {
    /// Calendar date (serialized as `YYYY-MM-DD`)
    pub date: NaiveDate,
    /// Steps walked on that date
    pub steps: u32,
}

impl DailyStepRecord {
    pub fn new(date: NaiveDate, steps: u32) -> Self {
        Self { date, steps }
    }
}

/// A single mood check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodRecord {
    pub id: String,
    pub user_id: String,
    /// Self-reported intensity, 1 (worst) to 5 (best)
    pub intensity: i32,
    pub created_at: DateTime<Utc>,
}

impl MoodRecord {
    /// Create a mood record with a fresh id.
    pub fn new(user_id: impl Into<String>, intensity: i32, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            intensity,
            created_at,
        }
    }
}

/// Risk classification. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score below which a domain is classified as low risk.
pub const MEDIUM_RISK_THRESHOLD: u8 = 30;

/// Score at or above which a domain is classified as high risk.
pub const HIGH_RISK_THRESHOLD: u8 = 60;

/// Classify a 0-100 score. Shared by all three analyzers.
pub fn determine_risk_level(score: u8) -> RiskLevel {
    if score < MEDIUM_RISK_THRESHOLD {
        RiskLevel::Low
    } else if score < HIGH_RISK_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// Clamp a raw additive score into `0..=100` and round it.
pub(crate) fn finalize_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return if raw == f64::INFINITY { 100 } else { 0 };
    }
    raw.clamp(0.0, 100.0).round() as u8
}

/// Domain of a sub-assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskType {
    Fall,
    Frailty,
    MentalHealth,
}

/// Direction of the month-over-month activity trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthlyTrend {
    Improving,
    Stable,
    Declining,
}

/// Social activity bucket derived from app usage days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialActivity {
    High,
    Moderate,
    Low,
}

/// Step-pattern indicators behind the fall risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallIndicators {
    pub step_decline: bool,
    pub irregular_pattern: bool,
    pub low_activity: bool,
    /// 0-100, higher = more regular
    pub consistency_score: f64,
}

/// Long-term trend indicators behind the frailty risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrailtyIndicators {
    pub weekly_average: f64,
    pub monthly_trend: MonthlyTrend,
    pub activity_days: u32,
    /// Percentage of the last 7 days meeting the target, 0-100
    pub goal_achievement_rate: u8,
}

/// Mood and engagement indicators behind the mental health risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentalHealthIndicators {
    pub mood_score: f64,
    pub social_activity: SocialActivity,
    pub engagement_level: u8,
}

/// Risk assessment for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubRiskAssessment<I> {
    #[serde(rename = "type")]
    pub risk_type: RiskType,
    pub level: RiskLevel,
    /// 0-100
    pub score: u8,
    /// Reasons in detection order; empty when nothing fired
    pub factors: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub indicators: I,
}

impl<I> SubRiskAssessment<I> {
    pub(crate) fn new(
        risk_type: RiskType,
        raw_score: f64,
        factors: Vec<String>,
        last_updated: DateTime<Utc>,
        indicators: I,
    ) -> Self {
        let score = finalize_score(raw_score);
        Self {
            risk_type,
            level: determine_risk_level(score),
            score,
            factors,
            last_updated,
            indicators,
        }
    }
}

pub type FallRiskAssessment = SubRiskAssessment<FallIndicators>;
pub type FrailtyRiskAssessment = SubRiskAssessment<FrailtyIndicators>;
pub type MentalHealthRiskAssessment = SubRiskAssessment<MentalHealthIndicators>;

/// Combined assessment across all three domains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallRiskAssessment {
    pub user_id: String,
    pub assessment_date: DateTime<Utc>,
    pub fall_risk: FallRiskAssessment,
    pub frailty_risk: FrailtyRiskAssessment,
    pub mental_health_risk: MentalHealthRiskAssessment,
    /// Maximum of the three sub-levels
    pub overall_level: RiskLevel,
    pub recommendations: Vec<String>,
    pub next_assessment_date: DateTime<Utc>,
}

impl OverallRiskAssessment {
    /// Sub-assessment levels in fall, frailty, mental health order.
    pub fn sub_levels(&self) -> [RiskLevel; 3] {
        [
            self.fall_risk.level,
            self.frailty_risk.level,
            self.mental_health_risk.level,
        ]
    }

    /// Whether the assessment should be surfaced to an alerting collaborator.
    pub fn requires_attention(&self) -> bool {
        self.overall_level >= RiskLevel::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_boundaries() {
        assert_eq!(determine_risk_level(0), RiskLevel::Low);
        assert_eq!(determine_risk_level(29), RiskLevel::Low);
        assert_eq!(determine_risk_level(30), RiskLevel::Medium);
        assert_eq!(determine_risk_level(59), RiskLevel::Medium);
        assert_eq!(determine_risk_level(60), RiskLevel::High);
        assert_eq!(determine_risk_level(100), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        let max = [RiskLevel::Medium, RiskLevel::High, RiskLevel::Low]
            .into_iter()
            .max();
        assert_eq!(max, Some(RiskLevel::High));
    }

    #[test]
    fn test_finalize_score_clamps() {
        assert_eq!(finalize_score(-20.0), 0);
        assert_eq!(finalize_score(130.0), 100);
        assert_eq!(finalize_score(29.4), 29);
        assert_eq!(finalize_score(29.5), 30);
        assert_eq!(finalize_score(f64::NAN), 0);
    }

    #[test]
    fn test_serialized_field_names() {
        let record = DailyStepRecord::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 4200);
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["steps"], 4200);

        assert_eq!(
            serde_json::to_value(RiskType::MentalHealth).unwrap(),
            "mentalHealth"
        );
        assert_eq!(serde_json::to_value(RiskLevel::Medium).unwrap(), "medium");
    }
}
