//! End-to-end tests for the risk engine through the public API

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::path::PathBuf;
use wellbeing_risk_engine::core::{
    aggregate, AssessmentInputs, Dispatch, EngineSettings, MonthlyTrend, RiskEngine,
};
use wellbeing_risk_engine::store::AssessmentStore;
use wellbeing_risk_engine::{
    calculate_fall_risk, calculate_frailty_risk, calculate_mental_health_risk,
    calculate_overall_risk, AssessmentError, DailyStepRecord, InMemorySource, JsonFileSource,
    JsonFileStore, MoodRecord, RiskLevel,
};

fn series(start: NaiveDate, steps: &[u32]) -> Vec<DailyStepRecord> {
    steps
        .iter()
        .enumerate()
        .map(|(i, &s)| DailyStepRecord::new(start + Duration::days(i as i64), s))
        .collect()
}

fn july(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
}

// 12:00 on 2024-07-31 in Tokyo
fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 31, 3, 0, 0).unwrap()
}

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wellbeing-{label}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_stable_week_is_low_fall_risk() {
    let week = series(july(1), &[5000, 5500, 5200, 5800, 6000, 5300, 5400]);
    let risk = calculate_fall_risk(&week);

    assert!(!risk.indicators.step_decline);
    assert!(!risk.indicators.low_activity);
    assert_eq!(risk.level, RiskLevel::Low);
    assert!(risk.score < 40);
}

#[test]
fn test_sudden_drop_is_high_fall_risk() {
    let week = series(july(1), &[5000, 5200, 5100, 2000, 1500, 1800, 2000]);
    let risk = calculate_fall_risk(&week);

    assert!(risk.indicators.step_decline);
    assert_eq!(risk.level, RiskLevel::High);
    assert!(risk.factors.iter().any(|f| f == "急激な活動量の減少"));
}

#[test]
fn test_flat_month_meeting_target_is_low_frailty_risk() {
    let month = series(july(1), &[5500; 30]);
    let risk = calculate_frailty_risk(&month, 5000);

    assert_eq!(risk.level, RiskLevel::Low);
    assert_eq!(risk.indicators.monthly_trend, MonthlyTrend::Stable);
    assert_eq!(risk.indicators.goal_achievement_rate, 100);
}

#[test]
fn test_zero_step_target_does_not_divide_by_zero() {
    let month = series(july(1), &[5500; 30]);
    let risk = calculate_frailty_risk(&month, 0);

    assert_eq!(risk.indicators.goal_achievement_rate, 0);
    assert!(risk.score <= 100);
}

#[test]
fn test_scores_stay_in_bounds_for_extreme_inputs() {
    let moods: Vec<MoodRecord> = (0..20)
        .map(|_| MoodRecord::new("u1", -3, reference_time()))
        .collect();
    let mental = calculate_mental_health_risk(&moods, 0);
    assert_eq!(mental.score, 90);
    assert_eq!(mental.level, RiskLevel::High);

    let frailty = calculate_frailty_risk(&series(july(1), &[0; 30]), u32::MAX);
    assert!(frailty.score <= 100);

    let fall = calculate_fall_risk(&series(july(1), &[u32::MAX, 0, u32::MAX, 0]));
    assert!(fall.score <= 100);
}

#[test]
fn test_overall_level_is_highest_sub_level() {
    let weekly = series(july(25), &[5000, 5200, 5100, 2000, 1500, 1800, 2000]);
    let monthly = series(july(2), &[5500; 30]);
    let assessment = aggregate(
        "u1",
        AssessmentInputs {
            weekly_steps: &weekly,
            monthly_steps: &monthly,
            step_target: 5000,
            mood_history: &[],
            app_usage_days: 7,
        },
        reference_time(),
        Dispatch::Sequential,
    );

    let highest = assessment.sub_levels().into_iter().max().unwrap();
    assert_eq!(assessment.overall_level, highest);
    assert_eq!(assessment.overall_level, RiskLevel::High);
    assert!(assessment.requires_attention());
    assert!(!assessment.recommendations.is_empty());
    assert_eq!(
        assessment.next_assessment_date,
        reference_time() + Duration::days(7)
    );
}

#[test]
fn test_parallel_and_sequential_dispatch_agree() {
    let weekly = series(july(25), &[3000, 800, 4000, 200, 3500, 900, 2500]);
    let monthly = series(july(2), &[2500; 30]);
    let moods = vec![
        MoodRecord::new("u1", 2, reference_time()),
        MoodRecord::new("u1", 3, reference_time()),
    ];
    let inputs = AssessmentInputs {
        weekly_steps: &weekly,
        monthly_steps: &monthly,
        step_target: 5000,
        mood_history: &moods,
        app_usage_days: 2,
    };

    let sequential = aggregate("u1", inputs, reference_time(), Dispatch::Sequential);
    let parallel = aggregate("u1", inputs, reference_time(), Dispatch::Parallel);
    assert_eq!(sequential, parallel);
}

#[test]
fn test_overall_risk_uses_source_mood_history() {
    let mut source = InMemorySource::new();
    source.insert_moods(
        "u1",
        (1..=3).map(|h| MoodRecord::new("u1", 1, Utc::now() - Duration::hours(h))),
    );

    let weekly = series(july(25), &[5500; 7]);
    let monthly = series(july(2), &[5500; 30]);
    let assessment = calculate_overall_risk(&source, "u1", &weekly, &monthly, 5000, 7).unwrap();

    assert_eq!(assessment.mental_health_risk.indicators.mood_score, 20.0);
    assert!(assessment
        .mental_health_risk
        .factors
        .iter()
        .any(|f| f == "継続的なネガティブ気分"));
}

#[test]
fn test_engine_reads_json_history_end_to_end() {
    let root = temp_dir("history");
    let user_dir = root.join("u1");
    std::fs::create_dir_all(&user_dir).unwrap();

    let steps = series(july(2), &[5500; 30]);
    std::fs::write(
        user_dir.join("steps.json"),
        serde_json::to_string(&steps).unwrap(),
    )
    .unwrap();

    let moods: Vec<MoodRecord> = (1..=3)
        .map(|h| MoodRecord::new("u1", 5, reference_time() - Duration::hours(h)))
        .collect();
    std::fs::write(
        user_dir.join("moods.json"),
        serde_json::to_string(&moods).unwrap(),
    )
    .unwrap();

    let usage: Vec<NaiveDate> = (25..=31).map(july).collect();
    std::fs::write(
        user_dir.join("app_usage.json"),
        serde_json::to_string(&usage).unwrap(),
    )
    .unwrap();

    let source = JsonFileSource::new(&root, chrono_tz::Asia::Tokyo)
        .with_reference_time(reference_time());
    let engine = RiskEngine::new(source, EngineSettings::default());
    let assessment = engine.assess_at("u1", reference_time()).unwrap();

    assert_eq!(assessment.fall_risk.level, RiskLevel::Low);
    assert_eq!(assessment.frailty_risk.level, RiskLevel::Low);
    assert_eq!(assessment.mental_health_risk.level, RiskLevel::Low);
    assert_eq!(assessment.overall_level, RiskLevel::Low);
    assert_eq!(assessment.mental_health_risk.indicators.engagement_level, 100);
    assert_eq!(assessment.recommendations.len(), 2);

    // Same inputs, same output
    let again = engine.assess_at("u1", reference_time()).unwrap();
    assert_eq!(assessment, again);

    let store_root = temp_dir("store");
    let store = JsonFileStore::new(&store_root);
    let saved = store.save_assessment(&assessment);
    assert!(saved.success);

    let latest = store.latest_assessment("u1").unwrap().unwrap();
    assert_eq!(latest.user_id, "u1");
    assert_eq!(latest.overall_level, RiskLevel::Low);
    assert_eq!(latest.recommendations, assessment.recommendations);

    let _ = std::fs::remove_dir_all(&root);
    let _ = std::fs::remove_dir_all(&store_root);
}

#[test]
fn test_corrupt_mood_file_aborts_assessment() {
    let root = temp_dir("corrupt");
    let user_dir = root.join("u1");
    std::fs::create_dir_all(&user_dir).unwrap();
    std::fs::write(user_dir.join("moods.json"), "{not json").unwrap();

    let source = JsonFileSource::new(&root, chrono_tz::Asia::Tokyo)
        .with_reference_time(reference_time());
    let engine = RiskEngine::new(source, EngineSettings::default());

    let result = engine.assess_at("u1", reference_time());
    assert!(matches!(result, Err(AssessmentError::MoodHistory(_))));

    let _ = std::fs::remove_dir_all(&root);
}
