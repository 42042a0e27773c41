//! HTTP handler for the Artifact Audit Agent
//!
//! Edge function entry point: run a live audit over posted block specs,
//! expose liveness and Prometheus metrics.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::client::{ArtifactClient, ClientConfig};
use crate::contracts::{AuditLimits, AuditReport, BlockSpec};
use crate::engine::{AuditEngine, LiveAuditor};
use crate::error::AuditError;
use crate::telemetry::AuditMetricsRegistry;
use crate::{AGENT_ID, AGENT_VERSION};

/// Application state
pub struct AppState {
    pub telemetry: AuditMetricsRegistry,
}

impl AppState {
    pub fn new() -> Result<Self, AuditError> {
        let telemetry = AuditMetricsRegistry::new()
            .map_err(|e| AuditError::InternalError(e.to_string()))?;
        Ok(Self { telemetry })
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/v1/audit", post(run_audit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the handler
pub async fn serve(port: u16) -> Result<(), AuditError> {
    let state = Arc::new(AppState::new()?);
    let router = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!(addr = %addr, "starting audit handler");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AuditError::InternalError(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, router)
        .await
        .map_err(|e| AuditError::InternalError(e.to_string()))
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        agent_id: AGENT_ID.to_string(),
        agent_version: AGENT_VERSION.to_string(),
    })
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.telemetry.gather() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encoding failed: {}", e),
        ),
    }
}

/// Run a live audit over the posted contract
async fn run_audit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuditRequest>,
) -> Result<Json<ApiResponse<AuditReport>>, (StatusCode, Json<ApiError>)> {
    if request.features.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "InvalidInput".to_string(),
                message: "At least one feature must be specified".to_string(),
                request_id: None,
            }),
        ));
    }

    let limits = request.options.unwrap_or_default();
    let client = ArtifactClient::new(ClientConfig {
        timeout_ms: limits.timeout_ms,
        ..Default::default()
    });
    let auditor = LiveAuditor::new(AuditEngine::new(limits), client, &request.base_url);

    let report = auditor.run(request.features, Vec::new()).await;
    state.telemetry.metrics().record_report(&report);

    Ok(Json(ApiResponse {
        success: !report.summary.has_critical(),
        request_id: report.report_id,
        data: report,
    }))
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent_id: String,
    pub agent_version: String,
}

/// Audit request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    pub base_url: String,
    pub features: Vec<BlockSpec>,
    pub options: Option<AuditLimits>,
}

/// API response wrapper
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub request_id: Uuid,
}

/// API error
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub request_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_request_deserializes() {
        let request: AuditRequest = serde_json::from_str(
            r#"{
                "baseUrl": "http://artifacts.internal",
                "features": [{"blockId": "m", "mirrorPath": "m.json"}],
                "options": {"timeoutMs": 500}
            }"#,
        )
        .unwrap();
        assert_eq!(request.base_url, "http://artifacts.internal");
        assert_eq!(request.features.len(), 1);
        assert_eq!(request.options.unwrap().timeout_ms, 500);
    }

    #[test]
    fn test_router_builds() {
        let state = Arc::new(AppState::new().unwrap());
        let _router = create_router(state);
    }
}
