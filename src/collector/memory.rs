//! In-memory data source.

use crate::collector::{HealthDataSource, SourceError};
use crate::core::types::{DailyStepRecord, MoodRecord};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
struct UserHistory {
    steps: Vec<DailyStepRecord>,
    moods: Vec<MoodRecord>,
    app_usage: BTreeSet<NaiveDate>,
}

/// A data source holding per-user history in memory.
///
/// Step queries return the trailing `days` records. Mood and app-usage
/// queries are windowed relative to the reference time (now, unless pinned
/// with [`InMemorySource::with_reference_time`]).
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    users: HashMap<String, UserHistory>,
    reference_time: Option<DateTime<Utc>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin "now" for windowed queries.
    pub fn with_reference_time(mut self, at: DateTime<Utc>) -> Self {
        self.reference_time = Some(at);
        self
    }

    /// Add step records for a user. Records are kept sorted by date.
    pub fn insert_steps(&mut self, user_id: &str, records: impl IntoIterator<Item = DailyStepRecord>) {
        let history = self.users.entry(user_id.to_string()).or_default();
        history.steps.extend(records);
        history.steps.sort_by_key(|r| r.date);
    }

    /// Add mood check-ins for a user.
    pub fn insert_moods(&mut self, user_id: &str, records: impl IntoIterator<Item = MoodRecord>) {
        let history = self.users.entry(user_id.to_string()).or_default();
        history.moods.extend(records);
        history.moods.sort_by_key(|m| m.created_at);
    }

    /// Record days on which the user opened the app.
    pub fn insert_app_usage(&mut self, user_id: &str, days: impl IntoIterator<Item = NaiveDate>) {
        let history = self.users.entry(user_id.to_string()).or_default();
        history.app_usage.extend(days);
    }

    fn now(&self) -> DateTime<Utc> {
        self.reference_time.unwrap_or_else(Utc::now)
    }
}

impl HealthDataSource for InMemorySource {
    fn step_history(&self, user_id: &str, days: u32) -> Result<Vec<DailyStepRecord>, SourceError> {
        let Some(history) = self.users.get(user_id) else {
            return Ok(Vec::new());
        };
        let skip = history.steps.len().saturating_sub(days as usize);
        Ok(history.steps[skip..].to_vec())
    }

    fn mood_history(&self, user_id: &str, days: u32) -> Result<Vec<MoodRecord>, SourceError> {
        let Some(history) = self.users.get(user_id) else {
            return Ok(Vec::new());
        };
        let now = self.now();
        let since = now - Duration::days(days as i64);
        Ok(history
            .moods
            .iter()
            .filter(|m| m.created_at >= since && m.created_at <= now)
            .cloned()
            .collect())
    }

    fn app_usage_day_count(&self, user_id: &str, window_days: u32) -> Result<u32, SourceError> {
        let Some(history) = self.users.get(user_id) else {
            return Ok(0);
        };
        if window_days == 0 {
            return Ok(0);
        }
        let today = self.now().date_naive();
        let first = today - Duration::days(window_days as i64 - 1);
        Ok(history.app_usage.range(first..=today).count() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 31, 10, 0, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    #[test]
    fn test_step_history_returns_trailing_records() {
        let mut source = InMemorySource::new();
        source.insert_steps("u1", (1..=31).map(|d| DailyStepRecord::new(day(d), d * 100)));

        let week = source.step_history("u1", 7).unwrap();
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day(25));
        assert_eq!(week[6].date, day(31));
    }

    #[test]
    fn test_unknown_user_is_empty() {
        let source = InMemorySource::new();
        assert!(source.step_history("nobody", 7).unwrap().is_empty());
        assert!(source.mood_history("nobody", 7).unwrap().is_empty());
        assert_eq!(source.app_usage_day_count("nobody", 7).unwrap(), 0);
    }

    #[test]
    fn test_mood_window() {
        let mut source = InMemorySource::new().with_reference_time(reference());
        source.insert_moods(
            "u1",
            vec![
                MoodRecord::new("u1", 3, reference() - Duration::days(10)),
                MoodRecord::new("u1", 4, reference() - Duration::days(2)),
            ],
        );
        let moods = source.mood_history("u1", 7).unwrap();
        assert_eq!(moods.len(), 1);
        assert_eq!(moods[0].intensity, 4);
    }

    #[test]
    fn test_app_usage_counts_distinct_days_in_window() {
        let mut source = InMemorySource::new().with_reference_time(reference());
        source.insert_app_usage("u1", vec![day(20), day(25), day(25), day(30), day(31)]);
        // 25..=31
        assert_eq!(source.app_usage_day_count("u1", 7).unwrap(), 3);
    }
}
