//! JSON-file data source.
//!
//! Reads per-user exports laid out as:
//!
//! ```text
//! <root>/<user_id>/steps.json      [{"date": "2024-07-01", "steps": 4200}, ...]
//! <root>/<user_id>/moods.json      [{"id": ..., "userId": ..., "intensity": 3, "createdAt": ...}, ...]
//! <root>/<user_id>/app_usage.json  ["2024-07-01", "2024-07-03", ...]
//! ```
//!
//! Calendar windows are anchored on "today" in the configured timezone.
//! A missing file means no data; an unreadable or malformed file is an error.

use crate::collector::{HealthDataSource, SourceError};
use crate::core::types::{DailyStepRecord, MoodRecord};
use crate::store::validate_user_id;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const STEPS_FILE: &str = "steps.json";
const MOODS_FILE: &str = "moods.json";
const APP_USAGE_FILE: &str = "app_usage.json";

/// Data source backed by JSON files on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    root: PathBuf,
    timezone: Tz,
    reference_time: Option<DateTime<Utc>>,
}

impl JsonFileSource {
    /// Create a source rooted at `root`, computing calendar days in `timezone`.
    pub fn new(root: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            root: root.into(),
            timezone,
            reference_time: None,
        }
    }

    /// Pin "now" for windowed queries.
    pub fn with_reference_time(mut self, at: DateTime<Utc>) -> Self {
        self.reference_time = Some(at);
        self
    }

    /// Directory holding a user's files. The id must be a single path component.
    pub fn user_dir(&self, user_id: &str) -> Result<PathBuf, SourceError> {
        validate_user_id(user_id).map_err(|e| SourceError::Unavailable(e.to_string()))?;
        Ok(self.root.join(user_id))
    }

    fn now(&self) -> DateTime<Utc> {
        self.reference_time.unwrap_or_else(Utc::now)
    }

    /// Today's calendar date in the configured timezone.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.timezone).date_naive()
    }

    /// First date of a window of `days` days ending today.
    fn window_start(&self, days: u32) -> NaiveDate {
        self.today() - Duration::days((days as i64 - 1).max(0))
    }

    fn read_list<T: DeserializeOwned>(&self, user_id: &str, file: &str) -> Result<Vec<T>, SourceError> {
        read_json_list(&self.user_dir(user_id)?.join(file))
    }
}

fn read_json_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| SourceError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

impl HealthDataSource for JsonFileSource {
    fn step_history(&self, user_id: &str, days: u32) -> Result<Vec<DailyStepRecord>, SourceError> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let start = self.window_start(days);
        let today = self.today();

        let mut records: Vec<DailyStepRecord> = self
            .read_list::<DailyStepRecord>(user_id, STEPS_FILE)?
            .into_iter()
            .filter(|r| r.date >= start && r.date <= today)
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    fn mood_history(&self, user_id: &str, days: u32) -> Result<Vec<MoodRecord>, SourceError> {
        let now = self.now();
        let since = now - Duration::days(days as i64);

        let mut records: Vec<MoodRecord> = self
            .read_list::<MoodRecord>(user_id, MOODS_FILE)?
            .into_iter()
            .filter(|m| m.created_at >= since && m.created_at <= now)
            .collect();
        records.sort_by_key(|m| m.created_at);
        Ok(records)
    }

    fn app_usage_day_count(&self, user_id: &str, window_days: u32) -> Result<u32, SourceError> {
        if window_days == 0 {
            return Ok(0);
        }
        let start = self.window_start(window_days);
        let today = self.today();

        let days: BTreeSet<NaiveDate> = self
            .read_list::<NaiveDate>(user_id, APP_USAGE_FILE)?
            .into_iter()
            .filter(|d| *d >= start && *d <= today)
            .collect();
        Ok(days.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("wellbeing-source-test-{}", uuid::Uuid::new_v4()))
    }

    fn write(root: &Path, user: &str, file: &str, content: &str) {
        let dir = root.join(user);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_missing_files_are_empty() {
        let source = JsonFileSource::new(temp_root(), chrono_tz::Asia::Tokyo);
        assert!(source.step_history("u1", 7).unwrap().is_empty());
        assert!(source.mood_history("u1", 7).unwrap().is_empty());
        assert_eq!(source.app_usage_day_count("u1", 7).unwrap(), 0);
    }

    #[test]
    fn test_path_like_user_id_is_unavailable() {
        let base = temp_root();
        let root = base.join("history");
        write(&base, "outside", "moods.json", "[]");

        let source = JsonFileSource::new(&root, chrono_tz::Asia::Tokyo);
        assert!(matches!(
            source.mood_history("../outside", 7),
            Err(SourceError::Unavailable(_))
        ));
        assert!(matches!(
            source.step_history("a/b", 7),
            Err(SourceError::Unavailable(_))
        ));
        assert!(matches!(
            source.app_usage_day_count("/etc", 7),
            Err(SourceError::Unavailable(_))
        ));

        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn test_step_window_uses_local_date() {
        let root = temp_root();
        write(
            &root,
            "u1",
            STEPS_FILE,
            r#"[
                {"date": "2024-07-25", "steps": 100},
                {"date": "2024-07-27", "steps": 300},
                {"date": "2024-07-26", "steps": 200},
                {"date": "2024-08-01", "steps": 900}
            ]"#,
        );

        // 2024-07-31 20:00 UTC is already 2024-08-01 in Tokyo
        let at = Utc.with_ymd_and_hms(2024, 7, 31, 20, 0, 0).unwrap();
        let source = JsonFileSource::new(&root, chrono_tz::Asia::Tokyo).with_reference_time(at);

        let steps = source.step_history("u1", 7).unwrap();
        let values: Vec<u32> = steps.iter().map(|r| r.steps).collect();
        assert_eq!(values, vec![200, 300, 900]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let root = temp_root();
        write(&root, "u1", MOODS_FILE, "not json");
        let source = JsonFileSource::new(&root, chrono_tz::UTC);

        let err = source.mood_history("u1", 7).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_app_usage_deduplicates_days() {
        let root = temp_root();
        write(
            &root,
            "u1",
            APP_USAGE_FILE,
            r#"["2024-07-30", "2024-07-30", "2024-07-31", "2024-07-01"]"#,
        );
        let at = Utc.with_ymd_and_hms(2024, 7, 31, 12, 0, 0).unwrap();
        let source = JsonFileSource::new(&root, chrono_tz::UTC).with_reference_time(at);

        assert_eq!(source.app_usage_day_count("u1", 7).unwrap(), 2);

        let _ = std::fs::remove_dir_all(&root);
    }
}
