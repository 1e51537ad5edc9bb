//! Combining the three domain assessments into one overall assessment.
//!
//! The analyzers are independent and side-effect free, so they can run on
//! scoped threads or one after another with identical results.

use crate::collector::{HealthDataSource, SourceError};
use crate::core::fall::calculate_fall_risk_at;
use crate::core::frailty::calculate_frailty_risk_at;
use crate::core::mental::calculate_mental_health_risk_at;
use crate::core::types::{
    DailyStepRecord, FallRiskAssessment, FrailtyRiskAssessment, MentalHealthRiskAssessment,
    MonthlyTrend, MoodRecord, OverallRiskAssessment, RiskLevel, SocialActivity,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

/// Days between an assessment and the next scheduled one.
pub const REASSESSMENT_INTERVAL_DAYS: i64 = 7;

/// Window of mood history consumed by the mental health analyzer.
pub const MOOD_HISTORY_DAYS: u32 = 7;

pub const REC_FALL_HIGH: &str =
    "転倒リスクが高い状態です。住環境の段差や障害物を見直し、手すりの設置を検討してください";
pub const REC_FALL_MEDIUM: &str = "転倒予防のため、バランス運動や筋力トレーニングを取り入れましょう";
pub const REC_STEP_DECLINE: &str = "活動量が急に減っています。体調に変化がないか確認しましょう";
pub const REC_IRREGULAR_PATTERN: &str =
    "毎日決まった時間に散歩するなど、規則的な活動を心がけましょう";
pub const REC_FRAILTY_HIGH: &str = "フレイルの兆候があります。かかりつけ医への相談をお勧めします";
pub const REC_FRAILTY_MEDIUM: &str = "無理のない範囲で毎日の歩数を少しずつ増やしましょう";
pub const REC_DECLINING_TREND: &str = "活動量が減少傾向にあります。日々の散歩を習慣にしましょう";
pub const REC_LOW_GOAL_ACHIEVEMENT: &str = "達成しやすい目標歩数から始めてみましょう";
pub const REC_MENTAL_HIGH: &str =
    "気分の落ち込みが続いています。家族や専門家に相談することをお勧めします";
pub const REC_MENTAL_MEDIUM: &str = "気分転換に趣味や外出の時間を作りましょう";
pub const REC_LOW_SOCIAL: &str = "家族や友人との会話の時間を増やしましょう";
pub const REC_MAINTAIN_ACTIVITY: &str = "現在の活動レベルを維持しましょう";
pub const REC_REGULAR_CHECKS: &str = "定期的な健康チェックを続けましょう";

/// Errors that prevent an overall assessment from being produced.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("failed to fetch mood history: {0}")]
    MoodHistory(#[source] SourceError),
    #[error("failed to fetch step history: {0}")]
    StepHistory(#[source] SourceError),
    #[error("failed to fetch app usage: {0}")]
    AppUsage(#[source] SourceError),
}

/// How the three analyzers are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    #[default]
    Sequential,
    /// One scoped thread per analyzer, joined before aggregation.
    Parallel,
}

/// Inputs for one assessment, fully materialized.
#[derive(Debug, Clone, Copy)]
pub struct AssessmentInputs<'a> {
    pub weekly_steps: &'a [DailyStepRecord],
    pub monthly_steps: &'a [DailyStepRecord],
    pub step_target: u32,
    pub mood_history: &'a [MoodRecord],
    pub app_usage_days: u32,
}

/// Build an overall assessment from already-fetched inputs.
pub fn aggregate(
    user_id: &str,
    inputs: AssessmentInputs<'_>,
    assessed_at: DateTime<Utc>,
    dispatch: Dispatch,
) -> OverallRiskAssessment {
    let (fall_risk, frailty_risk, mental_health_risk) = match dispatch {
        Dispatch::Sequential => (
            calculate_fall_risk_at(inputs.weekly_steps, assessed_at),
            calculate_frailty_risk_at(inputs.monthly_steps, inputs.step_target, assessed_at),
            calculate_mental_health_risk_at(inputs.mood_history, inputs.app_usage_days, assessed_at),
        ),
        Dispatch::Parallel => run_parallel(inputs, assessed_at),
    };

    let overall_level = fall_risk
        .level
        .max(frailty_risk.level)
        .max(mental_health_risk.level);

    let recommendations = generate_recommendations(&fall_risk, &frailty_risk, &mental_health_risk);

    let assessment = OverallRiskAssessment {
        user_id: user_id.to_string(),
        assessment_date: assessed_at,
        fall_risk,
        frailty_risk,
        mental_health_risk,
        overall_level,
        recommendations,
        next_assessment_date: assessed_at + Duration::days(REASSESSMENT_INTERVAL_DAYS),
    };

    info!(
        user_id,
        overall = %assessment.overall_level,
        fall = assessment.fall_risk.score,
        frailty = assessment.frailty_risk.score,
        mental_health = assessment.mental_health_risk.score,
        "risk assessment computed"
    );
    assessment
}

fn run_parallel(
    inputs: AssessmentInputs<'_>,
    assessed_at: DateTime<Utc>,
) -> (
    FallRiskAssessment,
    FrailtyRiskAssessment,
    MentalHealthRiskAssessment,
) {
    std::thread::scope(|scope| {
        let fall = scope.spawn(|| calculate_fall_risk_at(inputs.weekly_steps, assessed_at));
        let frailty = scope.spawn(|| {
            calculate_frailty_risk_at(inputs.monthly_steps, inputs.step_target, assessed_at)
        });
        let mental = calculate_mental_health_risk_at(
            inputs.mood_history,
            inputs.app_usage_days,
            assessed_at,
        );

        // Analyzers are panic-free on every input; a join failure means a bug
        // inside one of them, so re-raise it on this thread.
        let fall = fall
            .join()
            .unwrap_or_else(|e| std::panic::resume_unwind(e));
        let frailty = frailty
            .join()
            .unwrap_or_else(|e| std::panic::resume_unwind(e));
        (fall, frailty, mental)
    })
}

/// Build the recommendation list: fall, then frailty, then mental health.
///
/// Falls back to two maintenance lines so the list is never empty.
pub fn generate_recommendations(
    fall: &FallRiskAssessment,
    frailty: &FrailtyRiskAssessment,
    mental: &MentalHealthRiskAssessment,
) -> Vec<String> {
    let mut recs: Vec<&str> = Vec::new();

    match fall.level {
        RiskLevel::High => recs.push(REC_FALL_HIGH),
        RiskLevel::Medium => recs.push(REC_FALL_MEDIUM),
        RiskLevel::Low => {}
    }
    if fall.indicators.step_decline {
        recs.push(REC_STEP_DECLINE);
    }
    if fall.indicators.irregular_pattern {
        recs.push(REC_IRREGULAR_PATTERN);
    }

    match frailty.level {
        RiskLevel::High => recs.push(REC_FRAILTY_HIGH),
        RiskLevel::Medium => recs.push(REC_FRAILTY_MEDIUM),
        RiskLevel::Low => {}
    }
    if frailty.indicators.monthly_trend == MonthlyTrend::Declining {
        recs.push(REC_DECLINING_TREND);
    }
    if frailty.indicators.goal_achievement_rate < 30 {
        recs.push(REC_LOW_GOAL_ACHIEVEMENT);
    }

    match mental.level {
        RiskLevel::High => recs.push(REC_MENTAL_HIGH),
        RiskLevel::Medium => recs.push(REC_MENTAL_MEDIUM),
        RiskLevel::Low => {}
    }
    if mental.indicators.social_activity == SocialActivity::Low {
        recs.push(REC_LOW_SOCIAL);
    }

    if recs.is_empty() {
        recs.push(REC_MAINTAIN_ACTIVITY);
        recs.push(REC_REGULAR_CHECKS);
    }

    recs.into_iter().map(str::to_string).collect()
}

/// Assess a user from caller-supplied step series, fetching the last week
/// of mood history from `source`.
///
/// A mood fetch failure aborts the assessment; no score is substituted.
pub fn calculate_overall_risk<S: HealthDataSource + ?Sized>(
    source: &S,
    user_id: &str,
    weekly_steps: &[DailyStepRecord],
    monthly_steps: &[DailyStepRecord],
    step_target: u32,
    app_usage_days: u32,
) -> Result<OverallRiskAssessment, AssessmentError> {
    let mood_history = source
        .mood_history(user_id, MOOD_HISTORY_DAYS)
        .map_err(|e| {
            error!(user_id, error = %e, "mood history fetch failed");
            AssessmentError::MoodHistory(e)
        })?;

    Ok(aggregate(
        user_id,
        AssessmentInputs {
            weekly_steps,
            monthly_steps,
            step_target,
            mood_history: &mood_history,
            app_usage_days,
        },
        Utc::now(),
        Dispatch::Sequential,
    ))
}

/// Windows and target used when fetching everything from a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub step_target: u32,
    pub weekly_window_days: u32,
    pub monthly_window_days: u32,
    pub app_usage_window_days: u32,
    pub dispatch: Dispatch,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            step_target: 5000,
            weekly_window_days: 7,
            monthly_window_days: 30,
            app_usage_window_days: 7,
            dispatch: Dispatch::Sequential,
        }
    }
}

/// Assesses users by pulling every input from a data source.
pub struct RiskEngine<S> {
    source: S,
    settings: EngineSettings,
}

impl<S: HealthDataSource> RiskEngine<S> {
    pub fn new(source: S, settings: EngineSettings) -> Self {
        Self { source, settings }
    }

    /// Fetch all inputs for `user_id` and assess them now.
    pub fn assess(&self, user_id: &str) -> Result<OverallRiskAssessment, AssessmentError> {
        self.assess_at(user_id, Utc::now())
    }

    /// Fetch all inputs for `user_id` and assess them at `assessed_at`.
    pub fn assess_at(
        &self,
        user_id: &str,
        assessed_at: DateTime<Utc>,
    ) -> Result<OverallRiskAssessment, AssessmentError> {
        let s = &self.settings;

        let weekly_steps = self
            .source
            .step_history(user_id, s.weekly_window_days)
            .map_err(AssessmentError::StepHistory)?;
        let monthly_steps = self
            .source
            .step_history(user_id, s.monthly_window_days)
            .map_err(AssessmentError::StepHistory)?;
        let app_usage_days = self
            .source
            .app_usage_day_count(user_id, s.app_usage_window_days)
            .map_err(AssessmentError::AppUsage)?;
        let mood_history = self
            .source
            .mood_history(user_id, MOOD_HISTORY_DAYS)
            .map_err(|e| {
                error!(user_id, error = %e, "mood history fetch failed");
                AssessmentError::MoodHistory(e)
            })?;

        Ok(aggregate(
            user_id,
            AssessmentInputs {
                weekly_steps: &weekly_steps,
                monthly_steps: &monthly_steps,
                step_target: s.step_target,
                mood_history: &mood_history,
                app_usage_days,
            },
            assessed_at,
            s.dispatch,
        ))
    }
}
