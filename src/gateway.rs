//! Gateway client for storing assessments on a remote service.
//!
//! The remote side is the app backend's assessment endpoint. The blocking
//! wrapper implements [`AssessmentStore`] so it can stand in for a local store.

use crate::core::types::OverallRiskAssessment;
use crate::store::{AssessmentStore, SaveResult, StoreError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host (default: 127.0.0.1)
    pub host: String,
    /// Gateway port
    pub port: u16,
    /// Bearer authentication token
    pub token: String,
}

impl GatewayConfig {
    /// Create a new gateway configuration.
    pub fn new(host: impl Into<String>, port: u16, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            token: token.into(),
        }
    }

    /// Get the full gateway URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Endpoint accepting new assessments.
    pub fn assessments_url(&self) -> String {
        format!("{}/v1/assessments", self.url())
    }

    /// Endpoint returning a user's latest assessment.
    pub fn latest_url(&self, user_id: &str) -> String {
        format!("{}/v1/users/{}/assessments/latest", self.url(), user_id)
    }

    /// Get the health check endpoint URL.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.url())
    }
}

/// Gateway client error types.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway config error: {0}")]
    Config(String),
    #[error("Gateway network error: {0}")]
    Network(String),
    #[error("Gateway server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Gateway serialization error: {0}")]
    Serialization(String),
}

/// Response from the assessment endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAssessment {
    /// Identifier assigned by the remote store
    pub id: String,
}

/// Async client for the remote assessment store.
pub struct GatewayClient {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl GatewayClient {
    /// Create a new gateway client.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Test connection to the gateway.
    pub async fn test_connection(&self) -> Result<bool, GatewayError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Upload an assessment, returning the id the remote side assigned.
    pub async fn upload(
        &self,
        assessment: &OverallRiskAssessment,
    ) -> Result<StoredAssessment, GatewayError> {
        let response = self
            .client
            .post(self.config.assessments_url())
            .header("Authorization", format!("Bearer {}", self.config.token))
            .json(assessment)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Serialization(e.to_string()))
    }

    /// Fetch the latest assessment for a user. A 404 means none is stored.
    pub async fn fetch_latest(
        &self,
        user_id: &str,
    ) -> Result<Option<OverallRiskAssessment>, GatewayError> {
        let response = self
            .client
            .get(self.config.latest_url(user_id))
            .header("Authorization", format!("Bearer {}", self.config.token))
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| GatewayError::Serialization(e.to_string()))
    }
}

/// Blocking gateway client for use in synchronous contexts.
pub struct BlockingGatewayClient {
    inner: GatewayClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingGatewayClient {
    /// Create a new blocking gateway client.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: GatewayClient::new(config)?,
            runtime,
        })
    }

    /// Test connection to the gateway.
    pub fn test_connection(&self) -> Result<bool, GatewayError> {
        self.runtime.block_on(self.inner.test_connection())
    }

    /// Upload an assessment.
    pub fn upload(
        &self,
        assessment: &OverallRiskAssessment,
    ) -> Result<StoredAssessment, GatewayError> {
        self.runtime.block_on(self.inner.upload(assessment))
    }
}

impl AssessmentStore for BlockingGatewayClient {
    fn save_assessment(&self, assessment: &OverallRiskAssessment) -> SaveResult {
        match self.upload(assessment) {
            Ok(stored) => SaveResult::saved(stored.id),
            Err(e) => {
                warn!(user_id = %assessment.user_id, error = %e, "remote save failed");
                SaveResult::failed(e)
            }
        }
    }

    fn latest_assessment(&self, user_id: &str) -> Result<Option<OverallRiskAssessment>, StoreError> {
        self.runtime
            .block_on(self.inner.fetch_latest(user_id))
            .map_err(|e| StoreError::Remote(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{aggregate, AssessmentInputs, Dispatch};
    use chrono::Utc;

    #[test]
    fn test_gateway_config_urls() {
        let config = GatewayConfig::new("127.0.0.1", 8080, "test-token");
        assert_eq!(config.url(), "http://127.0.0.1:8080");
        assert_eq!(config.assessments_url(), "http://127.0.0.1:8080/v1/assessments");
        assert_eq!(
            config.latest_url("u1"),
            "http://127.0.0.1:8080/v1/users/u1/assessments/latest"
        );
        assert_eq!(config.health_url(), "http://127.0.0.1:8080/health");
    }

    #[test]
    fn test_unreachable_gateway_reports_failed_save() {
        // Port 9 (discard) is not expected to run an HTTP server
        let client = BlockingGatewayClient::new(GatewayConfig::new("127.0.0.1", 9, "t")).unwrap();
        let assessment = aggregate(
            "u1",
            AssessmentInputs {
                weekly_steps: &[],
                monthly_steps: &[],
                step_target: 5000,
                mood_history: &[],
                app_usage_days: 0,
            },
            Utc::now(),
            Dispatch::Sequential,
        );

        let result = client.save_assessment(&assessment);
        assert!(!result.success);
        assert!(result.error.is_some());
    }
}
