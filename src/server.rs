//! HTTP server for on-demand risk assessments.
//!
//! This module provides an HTTP server that:
//! - Accepts materialized history via POST /v1/assess and returns the assessment
//! - Persists each assessment through the configured store
//! - Serves the last stored assessment via GET /v1/users/:user_id/assessments/latest
//!
//! # Architecture
//!
//! ```text
//! App backend ──→ POST /v1/assess ──→ engine ──→ store
//!                                        ↓
//!                                   [alert sink]
//! ```

use crate::alert::{dispatch_alert, AlertSink};
use crate::audit::SharedAssessmentLog;
use crate::core::aggregate::{aggregate, AssessmentInputs, Dispatch};
use crate::core::types::{DailyStepRecord, MoodRecord, OverallRiskAssessment};
use crate::store::{validate_user_id, AssessmentStore, SaveResult};
use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Where computed assessments are saved
    pub store: Arc<dyn AssessmentStore>,
    /// Receives alerts for medium and high assessments
    pub alert_sink: Option<Arc<dyn AlertSink>>,
    /// Running counters
    pub log: SharedAssessmentLog,
    /// Step target used when a request omits one
    pub default_step_target: u32,
    /// Analyzer dispatch mode
    pub dispatch: Dispatch,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, store: Arc<dyn AssessmentStore>, log: SharedAssessmentLog) -> Self {
        Self {
            port,
            store,
            alert_sink: None,
            log,
            default_step_target: 5000,
            dispatch: Dispatch::Sequential,
        }
    }

    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sink = Some(sink);
        self
    }
}

/// Shared server state
struct ServerState {
    config: ServerConfig,
}

/// Request body for POST /v1/assess
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessRequest {
    pub user_id: String,
    #[serde(default)]
    pub weekly_steps: Vec<DailyStepRecord>,
    #[serde(default)]
    pub monthly_steps: Vec<DailyStepRecord>,
    #[serde(default)]
    pub step_target: Option<u32>,
    #[serde(default)]
    pub mood_history: Vec<MoodRecord>,
    #[serde(default)]
    pub app_usage_days: u32,
}

/// Response from the assess endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessResponse {
    pub assessment: OverallRiskAssessment,
    pub save: SaveResult,
    pub alert_raised: bool,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /v1/assess
///
/// Computes an assessment from the supplied history, saves it, and raises
/// an alert when warranted. Counters are persisted after every request. A failed save is reported in the body; the
/// assessment is still returned.
async fn assess(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<AssessRequest>,
) -> Result<Json<AssessResponse>, ApiError> {
    validate_user_id(&request.user_id)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", e.to_string()))?;

    let worker_state = Arc::clone(&state);
    let response = tokio::task::spawn_blocking(move || {
        let config = &worker_state.config;
        let assessment = aggregate(
            &request.user_id,
            AssessmentInputs {
                weekly_steps: &request.weekly_steps,
                monthly_steps: &request.monthly_steps,
                step_target: request.step_target.unwrap_or(config.default_step_target),
                mood_history: &request.mood_history,
                app_usage_days: request.app_usage_days,
            },
            Utc::now(),
            config.dispatch,
        );
        config.log.record_assessment(assessment.overall_level);

        let save = config.store.save_assessment(&assessment);
        config.log.record_save(save.success);

        let alert_raised = match &config.alert_sink {
            Some(sink) => match dispatch_alert(sink.as_ref(), &assessment) {
                Ok(raised) => raised,
                Err(e) => {
                    tracing::warn!(error = %e, "alert delivery failed");
                    false
                }
            },
            None => false,
        };
        if alert_raised {
            config.log.record_alert();
        }
        if let Err(e) = config.log.save() {
            tracing::warn!(error = %e, "failed to persist audit counters");
        }

        AssessResponse {
            assessment,
            save,
            alert_raised,
        }
    })
    .await
    .map_err(|e| {
        tracing::error!("Assessment task failed: {}", e);
        state.config.log.record_failure();
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "ASSESSMENT_ERROR",
            format!("Assessment failed: {e}"),
        )
    })?;

    Ok(Json(response))
}

/// GET /v1/users/:user_id/assessments/latest
async fn latest(
    State(state): State<Arc<ServerState>>,
    Path(user_id): Path<String>,
) -> Result<Json<OverallRiskAssessment>, ApiError> {
    validate_user_id(&user_id)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", e.to_string()))?;

    let worker_state = Arc::clone(&state);
    let lookup_id = user_id.clone();
    let result = tokio::task::spawn_blocking(move || {
        worker_state.config.store.latest_assessment(&lookup_id)
    })
    .await
    .map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORE_ERROR",
            format!("Lookup failed: {e}"),
        )
    })?;

    match result {
        Ok(Some(assessment)) => Ok(Json(assessment)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("No assessment stored for {user_id}"),
        )),
        Err(e) => {
            tracing::error!("Failed to read latest assessment: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                e.to_string(),
            ))
        }
    }
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let port = config.port;
    let state = Arc::new(ServerState { config });

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/assess", post(assess))
        .route("/v1/users/:user_id/assessments/latest", get(latest))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Risk engine server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
