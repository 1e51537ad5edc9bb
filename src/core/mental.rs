//! Mental health risk from recent mood check-ins and app engagement.

use crate::core::types::{
    MentalHealthIndicators, MentalHealthRiskAssessment, MoodRecord, RiskType, SocialActivity,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Mood score used when there are no check-ins.
pub const NEUTRAL_MOOD_SCORE: f64 = 50.0;

/// Length of the engagement window in days.
pub const ENGAGEMENT_WINDOW_DAYS: u32 = 7;

const MIN_INTENSITY: i32 = 1;
const MAX_INTENSITY: i32 = 5;

pub const FACTOR_PERSISTENT_NEGATIVE_MOOD: &str = "継続的なネガティブ気分";
pub const FACTOR_LOWERED_MOOD: &str = "気分の低下傾向";
pub const FACTOR_LOW_APP_USAGE: &str = "アプリ利用頻度が低い";
pub const FACTOR_SOMEWHAT_LOW_APP_USAGE: &str = "アプリ利用頻度がやや低い";
pub const FACTOR_FEW_SOCIAL_CONNECTIONS: &str = "社会的つながりが少ない";

/// Compute mental health risk from the last week's moods and app usage day count.
pub fn calculate_mental_health_risk(
    mood_history: &[MoodRecord],
    app_usage_days: u32,
) -> MentalHealthRiskAssessment {
    calculate_mental_health_risk_at(mood_history, app_usage_days, Utc::now())
}

/// Compute mental health risk, stamping the result with `assessed_at`.
pub fn calculate_mental_health_risk_at(
    mood_history: &[MoodRecord],
    app_usage_days: u32,
    assessed_at: DateTime<Utc>,
) -> MentalHealthRiskAssessment {
    let indicators = compute_mental_health_indicators(mood_history, app_usage_days);

    let mut score = 0.0;
    let mut factors = Vec::new();

    if indicators.mood_score <= 40.0 {
        score += 40.0;
        factors.push(FACTOR_PERSISTENT_NEGATIVE_MOOD.to_string());
    } else if indicators.mood_score < 60.0 {
        score += 25.0;
        factors.push(FACTOR_LOWERED_MOOD.to_string());
    } else if indicators.mood_score > 80.0 {
        score -= 10.0;
    }

    if indicators.engagement_level < 20 {
        score += 30.0;
        factors.push(FACTOR_LOW_APP_USAGE.to_string());
    } else if indicators.engagement_level < 40 {
        score += 15.0;
        factors.push(FACTOR_SOMEWHAT_LOW_APP_USAGE.to_string());
    }

    if indicators.social_activity == SocialActivity::Low {
        score += 20.0;
        factors.push(FACTOR_FEW_SOCIAL_CONNECTIONS.to_string());
    }

    let assessment = MentalHealthRiskAssessment::new(
        RiskType::MentalHealth,
        score,
        factors,
        assessed_at,
        indicators,
    );
    debug!(
        moods = mood_history.len(),
        app_usage_days,
        score = assessment.score,
        level = %assessment.level,
        "mental health risk computed"
    );
    assessment
}

/// Derive the mood and engagement indicators.
///
/// Intensities outside 1-5 and day counts above 7 are clamped.
pub fn compute_mental_health_indicators(
    mood_history: &[MoodRecord],
    app_usage_days: u32,
) -> MentalHealthIndicators {
    let days = app_usage_days.min(ENGAGEMENT_WINDOW_DAYS);

    let mood_score = if mood_history.is_empty() {
        NEUTRAL_MOOD_SCORE
    } else {
        let total: i32 = mood_history
            .iter()
            .map(|m| m.intensity.clamp(MIN_INTENSITY, MAX_INTENSITY) * 20)
            .sum();
        total as f64 / mood_history.len() as f64
    };

    let social_activity = if days >= 5 {
        SocialActivity::High
    } else if days >= 3 {
        SocialActivity::Moderate
    } else {
        SocialActivity::Low
    };

    let engagement_level =
        ((days as f64 / ENGAGEMENT_WINDOW_DAYS as f64) * 100.0).round() as u8;

    MentalHealthIndicators {
        mood_score,
        social_activity,
        engagement_level,
    }
}
