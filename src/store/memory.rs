//! In-memory assessment store.

use crate::core::types::OverallRiskAssessment;
use crate::store::{new_assessment_id, AssessmentStore, SaveResult, StoreError};
use std::collections::HashMap;
use std::sync::RwLock;

/// Keeps every saved assessment in memory, grouped by user.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<(String, OverallRiskAssessment)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assessments saved for a user.
    pub fn count(&self, user_id: &str) -> usize {
        self.entries
            .read()
            .map(|e| e.get(user_id).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

impl AssessmentStore for MemoryStore {
    fn save_assessment(&self, assessment: &OverallRiskAssessment) -> SaveResult {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(e) => return SaveResult::failed(format!("store lock poisoned: {e}")),
        };
        let id = new_assessment_id(assessment);
        entries
            .entry(assessment.user_id.clone())
            .or_default()
            .push((id.clone(), assessment.clone()));
        SaveResult::saved(id)
    }

    fn latest_assessment(&self, user_id: &str) -> Result<Option<OverallRiskAssessment>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::Remote(format!("store lock poisoned: {e}")))?;
        Ok(entries
            .get(user_id)
            .and_then(|list| list.iter().max_by_key(|(_, a)| a.assessment_date))
            .map(|(_, a)| a.clone()))
    }
}
