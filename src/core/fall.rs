//! Fall risk from a weekly step series.
//!
//! Three independent step-pattern signals feed an additive score:
//! a sharp drop between the start and end of the week, day-to-day
//! irregularity, and a low overall level. A continuous penalty for
//! inconsistency is always added on top.

use crate::core::stats::{coefficient_of_variation, mean, step_values};
use crate::core::types::{DailyStepRecord, FallIndicators, FallRiskAssessment, RiskType};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Daily average below which activity counts as low.
pub const LOW_ACTIVITY_THRESHOLD: f64 = 2000.0;

/// Number of days compared at each end of the week for decline detection.
const DECLINE_WINDOW: usize = 3;

/// Recent mean below this fraction of the early mean counts as a decline.
const DECLINE_RATIO: f64 = 0.5;

/// Coefficient of variation above which the pattern is irregular.
const IRREGULAR_CV_THRESHOLD: f64 = 0.5;

const STEP_DECLINE_POINTS: f64 = 35.0;
const IRREGULAR_PATTERN_POINTS: f64 = 25.0;
const LOW_ACTIVITY_POINTS: f64 = 30.0;
const INCONSISTENCY_WEIGHT: f64 = 0.1;

pub const FACTOR_STEP_DECLINE: &str = "急激な活動量の減少";
pub const FACTOR_IRREGULAR_PATTERN: &str = "不規則な活動パターン";
pub const FACTOR_LOW_ACTIVITY: &str = "全体的な活動量不足";

/// Compute fall risk for a chronologically ordered weekly step series.
pub fn calculate_fall_risk(weekly_steps: &[DailyStepRecord]) -> FallRiskAssessment {
    calculate_fall_risk_at(weekly_steps, Utc::now())
}

/// Compute fall risk, stamping the result with `assessed_at`.
pub fn calculate_fall_risk_at(
    weekly_steps: &[DailyStepRecord],
    assessed_at: DateTime<Utc>,
) -> FallRiskAssessment {
    let indicators = compute_fall_indicators(weekly_steps);

    let mut score = 0.0;
    let mut factors = Vec::new();

    if indicators.step_decline {
        score += STEP_DECLINE_POINTS;
        factors.push(FACTOR_STEP_DECLINE.to_string());
    }
    if indicators.irregular_pattern {
        score += IRREGULAR_PATTERN_POINTS;
        factors.push(FACTOR_IRREGULAR_PATTERN.to_string());
    }
    if indicators.low_activity {
        score += LOW_ACTIVITY_POINTS;
        factors.push(FACTOR_LOW_ACTIVITY.to_string());
    }
    score += (100.0 - indicators.consistency_score).max(0.0) * INCONSISTENCY_WEIGHT;

    let assessment =
        FallRiskAssessment::new(RiskType::Fall, score, factors, assessed_at, indicators);
    debug!(
        days = weekly_steps.len(),
        score = assessment.score,
        level = %assessment.level,
        "fall risk computed"
    );
    assessment
}

/// Derive the step-pattern indicators.
pub fn compute_fall_indicators(weekly_steps: &[DailyStepRecord]) -> FallIndicators {
    let values = step_values(weekly_steps);
    let average = mean(&values);
    let cv = coefficient_of_variation(&values);

    FallIndicators {
        step_decline: detect_step_decline(&values),
        irregular_pattern: values.len() >= 3
            && cv.map(|cv| cv > IRREGULAR_CV_THRESHOLD).unwrap_or(false),
        low_activity: average < LOW_ACTIVITY_THRESHOLD,
        consistency_score: cv
            .map(|cv| (100.0 - cv * 100.0).clamp(0.0, 100.0))
            .unwrap_or(0.0),
    }
}

/// Compare the mean of the last days against the mean of the first days.
fn detect_step_decline(values: &[f64]) -> bool {
    if values.len() < 2 {
        return false;
    }
    let window = DECLINE_WINDOW.min(values.len());
    let early = mean(&values[..window]);
    let recent = mean(&values[values.len() - window..]);
    recent < early * DECLINE_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RiskLevel;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn week(steps: &[u32]) -> Vec<DailyStepRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        steps
            .iter()
            .enumerate()
            .map(|(i, &s)| DailyStepRecord::new(start + Duration::days(i as i64), s))
            .collect()
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 8, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_stable_week_is_low_risk() {
        let steps = week(&[5000, 5500, 5200, 5800, 6000, 5300, 5400]);
        let risk = calculate_fall_risk_at(&steps, fixed_time());

        assert!(!risk.indicators.step_decline);
        assert!(!risk.indicators.low_activity);
        assert!(!risk.indicators.irregular_pattern);
        assert_eq!(risk.level, RiskLevel::Low);
        assert!(risk.score < 40);
        assert!(risk.factors.is_empty());
    }

    #[test]
    fn test_declining_week_is_high_risk() {
        let steps = week(&[5000, 5200, 5100, 2000, 1500, 1800, 2000]);
        let risk = calculate_fall_risk_at(&steps, fixed_time());

        assert!(risk.indicators.step_decline);
        assert_eq!(risk.level, RiskLevel::High);
        assert_eq!(risk.factors[0], FACTOR_STEP_DECLINE);
    }

    #[test]
    fn test_empty_week() {
        let risk = calculate_fall_risk_at(&[], fixed_time());

        assert!(!risk.indicators.step_decline);
        assert!(!risk.indicators.irregular_pattern);
        assert!(risk.indicators.low_activity);
        assert_eq!(risk.indicators.consistency_score, 0.0);
        // 30 for low activity + 10 inconsistency penalty
        assert_eq!(risk.score, 40);
        assert_eq!(risk.level, RiskLevel::Medium);
        assert_eq!(risk.factors, vec![FACTOR_LOW_ACTIVITY.to_string()]);
    }

    #[test]
    fn test_single_day_never_declines() {
        let indicators = compute_fall_indicators(&week(&[100]));
        assert!(!indicators.step_decline);
        assert!(!indicators.irregular_pattern);
    }

    #[test]
    fn test_two_days_cannot_be_irregular() {
        let indicators = compute_fall_indicators(&week(&[10000, 100]));
        assert!(!indicators.irregular_pattern);
    }

    #[test]
    fn test_factor_order_follows_detection_order() {
        // Decline, irregular, and low activity all fire
        let steps = week(&[3000, 3200, 3100, 200, 100, 150, 100]);
        let risk = calculate_fall_risk_at(&steps, fixed_time());

        assert_eq!(
            risk.factors,
            vec![
                FACTOR_STEP_DECLINE.to_string(),
                FACTOR_IRREGULAR_PATTERN.to_string(),
                FACTOR_LOW_ACTIVITY.to_string(),
            ]
        );
        assert_eq!(risk.score, 100);
    }

    #[test]
    fn test_idempotent() {
        let steps = week(&[4000, 800, 6500, 1200, 7000, 300, 5000]);
        let a = calculate_fall_risk_at(&steps, fixed_time());
        let b = calculate_fall_risk_at(&steps, fixed_time());
        assert_eq!(a, b);
    }
}
