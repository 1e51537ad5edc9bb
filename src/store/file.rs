//! JSON-file assessment store.
//!
//! Layout: `<root>/<user_id>/<id>.json` for every saved assessment plus
//! `<root>/<user_id>/latest.json` mirroring the most recent one.

use crate::core::types::OverallRiskAssessment;
use crate::store::{
    new_assessment_id, validate_user_id, AssessmentStore, SaveResult, StoreError,
};
use std::path::{Path, PathBuf};
use tracing::warn;

const LATEST_FILE: &str = "latest.json";

/// Assessment store writing pretty-printed JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a user's assessments. The id must be a single path component.
    fn user_dir(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        validate_user_id(user_id)?;
        Ok(self.root.join(user_id))
    }

    fn write(&self, assessment: &OverallRiskAssessment) -> Result<String, StoreError> {
        let dir = self.user_dir(&assessment.user_id)?;
        std::fs::create_dir_all(&dir)?;

        let id = new_assessment_id(assessment);
        let json = serde_json::to_string_pretty(assessment)?;

        std::fs::write(dir.join(format!("{id}.json")), &json)?;
        std::fs::write(dir.join(LATEST_FILE), &json)?;
        Ok(id)
    }

    /// Every stored assessment for a user, oldest first.
    pub fn history(&self, user_id: &str) -> Result<Vec<OverallRiskAssessment>, StoreError> {
        let dir = self.user_dir(user_id)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut assessments = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
            let is_latest = path.file_name().map(|n| n == LATEST_FILE).unwrap_or(false);
            if !is_json || is_latest {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            assessments.push(serde_json::from_str::<OverallRiskAssessment>(&content)?);
        }
        assessments.sort_by_key(|a| a.assessment_date);
        Ok(assessments)
    }
}

impl AssessmentStore for JsonFileStore {
    fn save_assessment(&self, assessment: &OverallRiskAssessment) -> SaveResult {
        match self.write(assessment) {
            Ok(id) => SaveResult::saved(id),
            Err(e) => {
                warn!(user_id = %assessment.user_id, error = %e, "failed to save assessment");
                SaveResult::failed(e)
            }
        }
    }

    fn latest_assessment(&self, user_id: &str) -> Result<Option<OverallRiskAssessment>, StoreError> {
        let path = self.user_dir(user_id)?.join(LATEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}
