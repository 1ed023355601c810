use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_token, Claims};
use crate::AppState;

/// Claims from the Authorization header. `Ok(None)` when the header is absent.
fn bearer_claims(headers: &HeaderMap, secret: &str) -> AppResult<Option<Claims>> {
    if !headers.contains_key(AUTHORIZATION) {
        return Ok(None);
    }

    let auth = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::InvalidToken("Expected a Bearer token".to_string()))?;

    verify_token(auth.token(), secret).map(Some)
}

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let claims = bearer_claims(request.headers(), &state.config.jwt_secret)?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Attach identity when a valid token is present; otherwise continue as a guest.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match bearer_claims(request.headers(), &state.config.jwt_secret) {
        Ok(Some(claims)) => {
            request.extensions_mut().insert(claims);
        }
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "Ignoring unusable token on public route"),
    }
    next.run(request).await
}

fn require(request: &Request, role: UserRole, message: &str) -> AppResult<()> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))?;

    if claims.role != role {
        return Err(AppError::Forbidden(message.to_string()));
    }

    Ok(())
}

/// Require admin role
pub async fn require_admin(request: Request, next: Next) -> AppResult<Response> {
    require(&request, UserRole::Admin, "Admin access required")?;
    Ok(next.run(request).await)
}

/// Require traveler role
pub async fn require_traveler(request: Request, next: Next) -> AppResult<Response> {
    require(&request, UserRole::Traveler, "Only travelers can create bookings")?;
    Ok(next.run(request).await)
}

/// Require driver role
pub async fn require_driver(request: Request, next: Next) -> AppResult<Response> {
    require(&request, UserRole::Driver, "Driver access required")?;
    Ok(next.run(request).await)
}

/// Require tour guide role
pub async fn require_tour_guide(request: Request, next: Next) -> AppResult<Response> {
    require(&request, UserRole::TourGuide, "Tour guide access required")?;
    Ok(next.run(request).await)
}
