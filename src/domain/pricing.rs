use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{AppError, AppResult};

pub const MIN_SERVICE_CHARGE: i64 = 100;
pub const SERVICE_CHARGE_PERCENT: i64 = 5;

/// Amounts are whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub units: i64,
    pub subtotal: i64,
    pub discount: i64,
    pub service_charge: i64,
    pub total: i64,
}

/// Days (or nights) charged for a range. The end date is the checkout day
/// and is not charged; a same-day range counts as one.
pub fn billable_units(start: NaiveDate, end: NaiveDate) -> AppResult<i64> {
    if end < start {
        return Err(AppError::validation(
            "end_date",
            "end_date must be on or after start_date",
        ));
    }
    Ok((end - start).num_days().max(1))
}

pub fn subtotal(unit_price: i64, units: i64, quantity: i64) -> AppResult<i64> {
    unit_price
        .checked_mul(units)
        .and_then(|v| v.checked_mul(quantity))
        .ok_or_else(|| AppError::BadRequest("Booking amount is too large".to_string()))
}

/// `max(100, round(5% of subtotal))`, rounding half up.
pub fn service_charge(subtotal: i64) -> i64 {
    let percent = subtotal
        .max(0)
        .saturating_mul(SERVICE_CHARGE_PERCENT)
        .saturating_add(50)
        / 100;
    percent.max(MIN_SERVICE_CHARGE)
}

impl Quote {
    /// The discount is clamped into `[0, subtotal]`; the service charge is
    /// taken on the undiscounted subtotal.
    pub fn new(units: i64, subtotal: i64, discount: i64) -> Self {
        let discount = discount.clamp(0, subtotal.max(0));
        let service_charge = service_charge(subtotal);
        Self {
            units,
            subtotal,
            discount,
            service_charge,
            total: (subtotal - discount).saturating_add(service_charge),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_billable_units() {
        assert_eq!(billable_units(date("2026-11-01"), date("2026-11-04")).unwrap(), 3);
        assert_eq!(billable_units(date("2026-11-01"), date("2026-11-01")).unwrap(), 1);
        assert_eq!(billable_units(date("2026-12-30"), date("2027-01-02")).unwrap(), 3);
    }

    #[test]
    fn test_end_before_start_is_validation_error() {
        let err = billable_units(date("2026-11-04"), date("2026-11-01")).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref errs) if errs[0].field == "end_date"));
    }

    #[test]
    fn test_service_charge() {
        assert_eq!(service_charge(4500), 225);
        assert_eq!(service_charge(1000), 100);
        assert_eq!(service_charge(0), 100);
        assert_eq!(service_charge(2010), 101); // 100.5 rounds up
        assert_eq!(service_charge(2009), 100); // 100.45 rounds down
    }

    #[test]
    fn test_three_day_driver_booking_without_promo() {
        let units = billable_units(date("2026-11-01"), date("2026-11-04")).unwrap();
        let quote = Quote::new(units, subtotal(1500, units, 1).unwrap(), 0);
        assert_eq!(quote.subtotal, 4500);
        assert_eq!(quote.service_charge, 225);
        assert_eq!(quote.total, 4725);
    }

    #[test]
    fn test_discount_applied_before_service_charge() {
        let quote = Quote::new(3, 4500, 450);
        assert_eq!(quote.discount, 450);
        assert_eq!(quote.service_charge, 225);
        assert_eq!(quote.total, 4275);
    }

    #[test]
    fn test_discount_clamped() {
        assert_eq!(Quote::new(1, 300, 1000).discount, 300);
        assert_eq!(Quote::new(1, 300, -5).discount, 0);
    }

    #[test]
    fn test_hotel_rooms_multiply() {
        assert_eq!(subtotal(2000, 2, 3).unwrap(), 12000);
        assert!(subtotal(i64::MAX, 2, 1).is_err());
    }
}
