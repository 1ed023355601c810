use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::InternalErrorDetail;
use crate::AppState;

/// Outside production, replace the generic 500 body with one that carries
/// the underlying error.
pub async fn expose_error_detail(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if state.config.is_production() {
        return response;
    }

    match response.extensions().get::<InternalErrorDetail>().cloned() {
        Some(InternalErrorDetail(detail)) => {
            let status = response.status();
            (
                status,
                Json(serde_json::json!({
                    "success": false,
                    "message": "Internal server error",
                    "error": detail,
                })),
            )
                .into_response()
        }
        None => response,
    }
}
