use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub database: &'static str,
}

/// Liveness plus a database ping. 503 when the pool cannot reach Postgres.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                success: true,
                status: "ok",
                database: "up",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    success: false,
                    status: "degraded",
                    database: "down",
                }),
            )
        }
    }
}
