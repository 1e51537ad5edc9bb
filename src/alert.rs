//! Alerts derived from overall assessments.
//!
//! Only `high` and `medium` assessments produce an alert. Delivery is left
//! to an [`AlertSink`]; the bundled [`TracingAlertSink`] just logs.

use crate::core::types::{OverallRiskAssessment, RiskLevel};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::warn;

pub const HIGH_RISK_TITLE: &str = "要注意: 健康リスクが高まっています";
pub const MEDIUM_RISK_TITLE: &str = "注意: 健康状態の変化があります";

/// A notification to hand to the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub user_id: String,
    pub level: RiskLevel,
    pub title: String,
    /// First recommendation of the assessment
    pub body: String,
    pub recommendations: Vec<String>,
}

/// Build the alert for an assessment, if its overall level warrants one.
pub fn alert_for(assessment: &OverallRiskAssessment) -> Option<Alert> {
    let title = match assessment.overall_level {
        RiskLevel::High => HIGH_RISK_TITLE,
        RiskLevel::Medium => MEDIUM_RISK_TITLE,
        RiskLevel::Low => return None,
    };

    Some(Alert {
        user_id: assessment.user_id.clone(),
        level: assessment.overall_level,
        title: title.to_string(),
        body: assessment
            .recommendations
            .first()
            .cloned()
            .unwrap_or_default(),
        recommendations: assessment.recommendations.clone(),
    })
}

/// Alert delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Alert delivery failed: {0}")]
    Delivery(String),
}

/// Receives alerts for delivery.
pub trait AlertSink: Send + Sync {
    fn notify(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Logs alerts through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn notify(&self, alert: &Alert) -> Result<(), AlertError> {
        warn!(
            user_id = %alert.user_id,
            level = %alert.level,
            title = %alert.title,
            body = %alert.body,
            "risk alert raised"
        );
        Ok(())
    }
}

/// Keeps alerts in memory; useful for embedding and tests.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts received so far.
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl AlertSink for RecordingAlertSink {
    fn notify(&self, alert: &Alert) -> Result<(), AlertError> {
        self.alerts
            .lock()
            .map_err(|e| AlertError::Delivery(e.to_string()))?
            .push(alert.clone());
        Ok(())
    }
}

/// Derive and deliver the alert for an assessment.
///
/// Returns whether an alert was delivered.
pub fn dispatch_alert<S: AlertSink + ?Sized>(
    sink: &S,
    assessment: &OverallRiskAssessment,
) -> Result<bool, AlertError> {
    match alert_for(assessment) {
        Some(alert) => {
            sink.notify(&alert)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
