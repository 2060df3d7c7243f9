//! Liveness handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
    pending_orders: usize,
    attempts: usize,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let summary = state.book.summary();
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        pending_orders: summary.pending,
        attempts: summary.attempts,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tempfile::TempDir;

    use crate::handlers::tests::{send, test_state};

    #[tokio::test]
    async fn test_health_reports_ok() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let (status, body) = send(&state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["pending_orders"], 0);
    }
}
