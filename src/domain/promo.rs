use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::promo_code::{self, DiscountType};

/// Why a code cannot be applied. Checks run in declaration order and the
/// first failure wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PromoRejection {
    NotFound,
    NotYetValid,
    Expired,
    UsageLimitReached,
    BelowMinimum { minimum: i64 },
}

impl PromoRejection {
    pub fn message(&self) -> String {
        match self {
            PromoRejection::NotFound => "Promo code not found".to_string(),
            PromoRejection::NotYetValid => "Promo code is not active yet".to_string(),
            PromoRejection::Expired => "Promo code has expired".to_string(),
            PromoRejection::UsageLimitReached => "Promo code usage limit reached".to_string(),
            PromoRejection::BelowMinimum { minimum } => {
                format!("Subtotal must be at least {} to use this code", minimum)
            }
        }
    }
}

/// Codes are stored uppercase without surrounding whitespace.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn check(
    promo: Option<&promo_code::Model>,
    subtotal: i64,
    now: DateTime<Utc>,
) -> Result<(), PromoRejection> {
    let promo = promo.ok_or(PromoRejection::NotFound)?;

    if now < promo.valid_from.with_timezone(&Utc) {
        return Err(PromoRejection::NotYetValid);
    }
    if now > promo.valid_until.with_timezone(&Utc) {
        return Err(PromoRejection::Expired);
    }

    if let Some(limit) = promo.usage_limit {
        if promo.used_count >= limit {
            return Err(PromoRejection::UsageLimitReached);
        }
    }

    if subtotal < promo.min_subtotal {
        return Err(PromoRejection::BelowMinimum {
            minimum: promo.min_subtotal,
        });
    }

    Ok(())
}

/// Always within `[0, subtotal]`.
pub fn calculate_discount(promo: &promo_code::Model, subtotal: i64) -> i64 {
    if subtotal <= 0 || !promo.discount_value.is_finite() {
        return 0;
    }

    let amount = match promo.discount_type {
        DiscountType::Percentage => {
            let raw = (subtotal as f64 * promo.discount_value / 100.0).round() as i64;
            match promo.max_discount {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        }
        DiscountType::Fixed => promo.discount_value.round() as i64,
    };

    amount.clamp(0, subtotal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn promo(discount_type: DiscountType, value: f64, min_subtotal: i64) -> promo_code::Model {
        let now = Utc::now();
        promo_code::Model {
            id: Uuid::new_v4(),
            code: "WELCOME10".to_string(),
            description: None,
            discount_type,
            discount_value: value,
            max_discount: None,
            min_subtotal,
            usage_limit: Some(100),
            used_count: 0,
            valid_from: (now - Duration::days(1)).into(),
            valid_until: (now + Duration::days(30)).into(),
            created_at: now.into(),
        }
    }

    #[test]
    fn test_ten_percent_on_4500() {
        let p = promo(DiscountType::Percentage, 10.0, 1000);
        assert_eq!(check(Some(&p), 4500, Utc::now()), Ok(()));
        assert_eq!(calculate_discount(&p, 4500), 450);
    }

    #[test]
    fn test_percentage_rounds_and_caps() {
        let mut p = promo(DiscountType::Percentage, 12.5, 0);
        assert_eq!(calculate_discount(&p, 1003), 125); // 125.375
        p.max_discount = Some(100);
        assert_eq!(calculate_discount(&p, 1003), 100);
        p.discount_value = 250.0;
        p.max_discount = None;
        assert_eq!(calculate_discount(&p, 1003), 1003);
    }

    #[test]
    fn test_fixed_never_exceeds_subtotal() {
        let p = promo(DiscountType::Fixed, 500.0, 0);
        assert_eq!(calculate_discount(&p, 4500), 500);
        assert_eq!(calculate_discount(&p, 300), 300);
    }

    #[test]
    fn test_discount_always_in_range() {
        let values = [-20.0, 0.0, 0.4, 5.0, 33.3, 100.0, 150.0, 1e9, f64::NAN];
        let subtotals = [0, 1, 99, 1000, 4500, 1_000_000];
        for discount_type in [DiscountType::Percentage, DiscountType::Fixed] {
            for value in values {
                for subtotal in subtotals {
                    let d = calculate_discount(&promo(discount_type, value, 0), subtotal);
                    assert!((0..=subtotal).contains(&d), "{:?} {} {}", discount_type, value, subtotal);
                }
            }
        }
    }

    #[test]
    fn test_check_order() {
        // Expired and over the limit and below minimum: the window wins.
        let mut p = promo(DiscountType::Fixed, 100.0, 10_000);
        p.valid_until = (Utc::now() - Duration::hours(1)).into();
        p.used_count = 100;
        assert_eq!(check(Some(&p), 50, Utc::now()), Err(PromoRejection::Expired));

        p.valid_until = (Utc::now() + Duration::days(1)).into();
        assert_eq!(
            check(Some(&p), 50, Utc::now()),
            Err(PromoRejection::UsageLimitReached)
        );

        p.used_count = 3;
        assert_eq!(
            check(Some(&p), 50, Utc::now()),
            Err(PromoRejection::BelowMinimum { minimum: 10_000 })
        );
    }

    #[test]
    fn test_not_found_and_not_yet_valid() {
        assert_eq!(check(None, 5000, Utc::now()), Err(PromoRejection::NotFound));

        let mut p = promo(DiscountType::Fixed, 100.0, 0);
        p.valid_from = (Utc::now() + Duration::days(2)).into();
        assert_eq!(check(Some(&p), 5000, Utc::now()), Err(PromoRejection::NotYetValid));
    }

    #[test]
    fn test_unlimited_usage() {
        let mut p = promo(DiscountType::Fixed, 100.0, 0);
        p.usage_limit = None;
        p.used_count = 1_000_000;
        assert_eq!(check(Some(&p), 5000, Utc::now()), Ok(()));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  welcome10 "), "WELCOME10");
    }
}
