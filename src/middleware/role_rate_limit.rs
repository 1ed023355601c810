use axum::http::Request;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::KeyExtractor,
    GovernorError, GovernorLayer,
};
use uuid::Uuid;

use crate::middleware::rate_limit::rate_limit_error_handler;
use crate::utils::jwt::Claims;

/// Custom key extractor that extracts user ID from JWT claims in request extensions
#[derive(Debug, Clone, Copy)]
pub struct UserIdExtractor;

impl KeyExtractor for UserIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        // Set by auth_middleware
        let claims = req
            .extensions()
            .get::<Claims>()
            .ok_or(GovernorError::UnableToExtractKey)?;

        Ok(claims.sub)
    }
}

pub type UserGovernorLayer = GovernorLayer<
    UserIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Per-user budgets for authenticated write paths.
/// - Booking: 100 requests per minute
/// - Upload: 20 requests per minute
pub enum RateLimitedRoute {
    Booking,
    Upload,
}

pub fn create_user_governor(route: RateLimitedRoute) -> UserGovernorLayer {
    let (per_ms, burst) = match route {
        RateLimitedRoute::Booking => (600, 100),
        RateLimitedRoute::Upload => (3000, 20),
    };

    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(burst)
            .key_extractor(UserIdExtractor)
            .finish()
            .expect("static governor config is valid"),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}
