//! Frailty risk from up to a month of daily steps and a daily target.

use crate::core::stats::{mean, step_values};
use crate::core::types::{
    DailyStepRecord, FrailtyIndicators, FrailtyRiskAssessment, MonthlyTrend, RiskType,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Days counted as "the last week".
const RECENT_WINDOW: usize = 7;

/// Minimum series length for a half-over-half trend.
const MIN_TREND_RECORDS: usize = 14;

const IMPROVING_RATIO: f64 = 1.1;
const DECLINING_RATIO: f64 = 0.9;

/// A day with fewer steps than this is not an activity day.
pub const VERY_LOW_ACTIVITY_THRESHOLD: u32 = 1000;

pub const FACTOR_VERY_LOW_ACTIVITY: &str = "極めて低い活動量";
pub const FACTOR_LOW_ACTIVITY: &str = "低い活動量";
pub const FACTOR_DECLINING_TREND: &str = "活動量の減少傾向";
pub const FACTOR_FEW_ACTIVITY_DAYS: &str = "活動日数が少ない";
pub const FACTOR_SOMEWHAT_FEW_ACTIVITY_DAYS: &str = "活動日数がやや少ない";
pub const FACTOR_LOW_GOAL_ACHIEVEMENT: &str = "目標達成率が低い";

/// Compute frailty risk for a chronologically ordered monthly series.
pub fn calculate_frailty_risk(
    monthly_steps: &[DailyStepRecord],
    step_target: u32,
) -> FrailtyRiskAssessment {
    calculate_frailty_risk_at(monthly_steps, step_target, Utc::now())
}

/// Compute frailty risk, stamping the result with `assessed_at`.
///
/// Adjustments are summed without intermediate clamping; the total is
/// clamped to 0-100 once at the end.
pub fn calculate_frailty_risk_at(
    monthly_steps: &[DailyStepRecord],
    step_target: u32,
    assessed_at: DateTime<Utc>,
) -> FrailtyRiskAssessment {
    let indicators = compute_frailty_indicators(monthly_steps, step_target);

    let mut score = 0.0;
    let mut factors = Vec::new();

    if indicators.weekly_average < 1000.0 {
        score += 40.0;
        factors.push(FACTOR_VERY_LOW_ACTIVITY.to_string());
    } else if indicators.weekly_average < 2000.0 {
        score += 30.0;
        factors.push(FACTOR_LOW_ACTIVITY.to_string());
    } else if indicators.weekly_average < 4000.0 {
        score += 15.0;
    }

    match indicators.monthly_trend {
        MonthlyTrend::Declining => {
            score += 25.0;
            factors.push(FACTOR_DECLINING_TREND.to_string());
        }
        MonthlyTrend::Improving => score -= 10.0,
        MonthlyTrend::Stable => {}
    }

    if indicators.activity_days < 3 {
        score += 30.0;
        factors.push(FACTOR_FEW_ACTIVITY_DAYS.to_string());
    } else if indicators.activity_days < 5 {
        score += 15.0;
        factors.push(FACTOR_SOMEWHAT_FEW_ACTIVITY_DAYS.to_string());
    }

    if indicators.goal_achievement_rate < 30 {
        score += 20.0;
        factors.push(FACTOR_LOW_GOAL_ACHIEVEMENT.to_string());
    } else if indicators.goal_achievement_rate > 70 {
        score -= 10.0;
    }

    let assessment =
        FrailtyRiskAssessment::new(RiskType::Frailty, score, factors, assessed_at, indicators);
    debug!(
        days = monthly_steps.len(),
        trend = ?assessment.indicators.monthly_trend,
        score = assessment.score,
        level = %assessment.level,
        "frailty risk computed"
    );
    assessment
}

/// Derive the frailty indicators.
pub fn compute_frailty_indicators(
    monthly_steps: &[DailyStepRecord],
    step_target: u32,
) -> FrailtyIndicators {
    let recent = last_days(monthly_steps, RECENT_WINDOW);
    let recent_values = step_values(recent);

    let activity_days = recent
        .iter()
        .filter(|r| r.steps >= VERY_LOW_ACTIVITY_THRESHOLD)
        .count() as u32;

    FrailtyIndicators {
        weekly_average: mean(&recent_values),
        monthly_trend: monthly_trend(&step_values(monthly_steps)),
        activity_days,
        goal_achievement_rate: goal_achievement_rate(recent, step_target),
    }
}

/// The trailing `n` records (or all of them when shorter).
fn last_days(records: &[DailyStepRecord], n: usize) -> &[DailyStepRecord] {
    &records[records.len().saturating_sub(n)..]
}

/// Compare the first half of the series against the second half.
fn monthly_trend(values: &[f64]) -> MonthlyTrend {
    if values.len() < MIN_TREND_RECORDS {
        return MonthlyTrend::Stable;
    }
    let mid = values.len() / 2;
    let first_half = mean(&values[..mid]);
    let second_half = mean(&values[mid..]);

    if second_half > first_half * IMPROVING_RATIO {
        MonthlyTrend::Improving
    } else if second_half < first_half * DECLINING_RATIO {
        MonthlyTrend::Declining
    } else {
        MonthlyTrend::Stable
    }
}

/// Rounded percentage of days meeting the target. 0 for a zero target or no data.
pub fn goal_achievement_rate(records: &[DailyStepRecord], step_target: u32) -> u8 {
    if step_target == 0 || records.is_empty() {
        return 0;
    }
    let achieved = records.iter().filter(|r| r.steps >= step_target).count();
    ((achieved as f64 / records.len() as f64) * 100.0).round() as u8
}
