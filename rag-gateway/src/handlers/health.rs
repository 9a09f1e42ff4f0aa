use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Readiness includes the upstream dependency: 503 when the RAG service
/// cannot be reached within the probe timeout.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    match state.rag_client.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "rag_service": "reachable" })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe: RAG service unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "rag_service": "unreachable" })),
            )
        }
    }
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "rag-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
