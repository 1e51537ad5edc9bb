//! Persistence of computed assessments.
//!
//! Saving never fails loudly: a failed save is reported in the returned
//! [`SaveResult`] and the assessment itself remains valid. Callers retry the
//! save independently of recomputation.

pub mod file;
pub mod memory;

use crate::core::types::OverallRiskAssessment;
use serde::{Deserialize, Serialize};

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Outcome of a save operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResult {
    pub success: bool,
    /// Identifier assigned by the store on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResult {
    pub fn saved(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: Some(id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error.to_string()),
        }
    }
}

/// Errors raised when reading stored assessments.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Remote store error: {0}")]
    Remote(String),
    #[error(transparent)]
    InvalidUserId(#[from] InvalidUserId),
}

/// A user id that cannot be used as a single path component.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid user id {user_id:?}: {reason}")]
pub struct InvalidUserId {
    pub user_id: String,
    pub reason: &'static str,
}

/// Check that `user_id` is safe to use as a directory name under a store
/// or source root.
///
/// Rejects empty or blank ids, path separators, `..`, and NUL.
pub fn validate_user_id(user_id: &str) -> Result<(), InvalidUserId> {
    let reason = if user_id.trim().is_empty() {
        "must not be empty"
    } else if user_id.contains(['/', '\\']) {
        "must not contain path separators"
    } else if user_id.contains("..") {
        "must not contain '..'"
    } else if user_id.contains('\0') {
        "must not contain NUL"
    } else {
        return Ok(());
    };
    Err(InvalidUserId {
        user_id: user_id.to_string(),
        reason,
    })
}

/// Where assessments are kept once computed.
pub trait AssessmentStore: Send + Sync {
    /// Persist an assessment.
    fn save_assessment(&self, assessment: &OverallRiskAssessment) -> SaveResult;

    /// Most recently saved assessment for a user, if any.
    fn latest_assessment(&self, user_id: &str) -> Result<Option<OverallRiskAssessment>, StoreError>;
}

/// Generate an identifier for a newly stored assessment.
pub(crate) fn new_assessment_id(assessment: &OverallRiskAssessment) -> String {
    format!(
        "{}_{}",
        assessment.assessment_date.format("%Y%m%d_%H%M%S"),
        &uuid::Uuid::new_v4().to_string()[..8]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_user_ids_are_accepted() {
        for id in ["u1", "user-42", "田中_花子", "a.b"] {
            assert!(validate_user_id(id).is_ok(), "{id} rejected");
        }
    }

    #[test]
    fn test_path_like_user_ids_are_rejected() {
        for id in ["", "   ", "../x", "..", "a/b", "/etc", "a\\b", "..\\x", "a\0b"] {
            assert!(validate_user_id(id).is_err(), "{id:?} accepted");
        }
    }

    #[test]
    fn test_rejection_names_the_id() {
        let err = validate_user_id("../x").unwrap_err();
        assert_eq!(err.user_id, "../x");
        assert!(err.to_string().contains("../x"));
    }
}
