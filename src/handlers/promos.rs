use axum::extract::State;
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::promo::{self, PromoRejection};
use crate::entities::promo_code::{self, DiscountType};
use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ValidatePromoRequest {
    #[validate(length(min = 1, max = 50, message = "code must be 1-50 characters"))]
    pub code: String,
    #[validate(range(min = 0, message = "subtotal cannot be negative"))]
    pub subtotal: i64,
}

#[derive(Debug, Serialize)]
pub struct PromoAccepted {
    pub valid: bool,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub discount: i64,
}

#[derive(Debug, Serialize)]
pub struct PromoDeclined {
    pub valid: bool,
    #[serde(flatten)]
    pub rejection: PromoRejection,
    pub message: String,
}

impl From<PromoRejection> for PromoDeclined {
    fn from(rejection: PromoRejection) -> Self {
        Self {
            valid: false,
            message: rejection.message(),
            rejection,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PromoValidation {
    Valid(PromoAccepted),
    Invalid(PromoDeclined),
}

impl PromoValidation {
    pub fn evaluate(found: Option<&promo_code::Model>, subtotal: i64) -> Self {
        let checked = promo::check(found, subtotal, Utc::now());
        match (checked, found) {
            (Ok(()), Some(code)) => PromoValidation::Valid(PromoAccepted {
                valid: true,
                code: code.code.clone(),
                discount_type: code.discount_type,
                discount_value: code.discount_value,
                discount: promo::calculate_discount(code, subtotal),
            }),
            (Err(rejection), _) => PromoValidation::Invalid(rejection.into()),
            (Ok(()), None) => PromoValidation::Invalid(PromoRejection::NotFound.into()),
        }
    }
}

/// Check a code against a subtotal without consuming a use.
pub async fn validate_promo(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ValidatePromoRequest>,
) -> AppResult<ApiResponse<PromoValidation>> {
    let found = promo_code::Entity::find()
        .filter(promo_code::Column::Code.eq(promo::normalize_code(&payload.code)))
        .one(&state.db)
        .await?;

    Ok(ApiResponse::ok(PromoValidation::evaluate(
        found.as_ref(),
        payload.subtotal,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn welcome() -> promo_code::Model {
        let now = Utc::now();
        promo_code::Model {
            id: Uuid::new_v4(),
            code: "WELCOME10".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            max_discount: None,
            min_subtotal: 1000,
            usage_limit: None,
            used_count: 0,
            valid_from: (now - Duration::days(1)).into(),
            valid_until: (now + Duration::days(30)).into(),
            created_at: now.into(),
        }
    }

    #[test]
    fn test_valid_code_reports_discount() {
        let code = welcome();
        let result = PromoValidation::evaluate(Some(&code), 4500);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["valid"], true);
        assert_eq!(json["discount"], 450);
        assert_eq!(json["discount_type"], "percentage");
    }

    #[test]
    fn test_unknown_code() {
        let json = serde_json::to_value(PromoValidation::evaluate(None, 4500)).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["reason"], "not_found");
    }

    #[test]
    fn test_below_minimum_reports_threshold() {
        let code = welcome();
        let json = serde_json::to_value(PromoValidation::evaluate(Some(&code), 999)).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["reason"], "below_minimum");
        assert_eq!(json["minimum"], 1000);
    }
}
