use serde::Deserialize;
use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::entities::{driver_profile, hotel, tour_guide_profile, vehicle};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Vehicle,
    Hotel,
    Driver,
    TourGuide,
}

impl ResourceKind {
    /// The only role allowed to create and manage this kind of resource.
    pub fn owner_role(self) -> UserRole {
        match self {
            ResourceKind::Vehicle => UserRole::CarOwner,
            ResourceKind::Hotel => UserRole::HotelOwner,
            ResourceKind::Driver => UserRole::Driver,
            ResourceKind::TourGuide => UserRole::TourGuide,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Vehicle => "Vehicle",
            ResourceKind::Hotel => "Hotel",
            ResourceKind::Driver => "Driver profile",
            ResourceKind::TourGuide => "Tour guide profile",
        }
    }
}

/// Role check for creating a resource of `kind`.
pub fn ensure_can_create(claims: &Claims, kind: ResourceKind) -> AppResult<()> {
    if claims.role != kind.owner_role() {
        return Err(AppError::Forbidden(format!(
            "Only {} accounts can manage {} listings",
            kind.owner_role().as_str(),
            kind.label().to_lowercase()
        )));
    }
    Ok(())
}

/// Role and ownership check for updating or deleting an existing resource.
pub fn ensure_can_manage(claims: &Claims, kind: ResourceKind, owner_id: Uuid) -> AppResult<()> {
    ensure_can_create(claims, kind)?;
    if claims.sub != owner_id {
        return Err(AppError::Forbidden(format!(
            "You can only manage your own {} listings",
            kind.label().to_lowercase()
        )));
    }
    Ok(())
}

/// Fields shared by every bookable resource.
pub trait Listing {
    fn owner_id(&self) -> Uuid;
    fn city(&self) -> &str;
    fn unit_price(&self) -> i64;
    fn rating(&self) -> f64;
    fn is_available(&self) -> bool;

    fn languages(&self) -> Option<&str> {
        None
    }

    fn specialties(&self) -> Option<&str> {
        None
    }

    fn vehicle_type(&self) -> Option<&str> {
        None
    }
}

impl Listing for vehicle::Model {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
    fn city(&self) -> &str {
        &self.city
    }
    fn unit_price(&self) -> i64 {
        self.price_per_day
    }
    fn rating(&self) -> f64 {
        self.rating
    }
    fn is_available(&self) -> bool {
        self.is_available
    }
    fn vehicle_type(&self) -> Option<&str> {
        Some(&self.vehicle_type)
    }
}

impl Listing for hotel::Model {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
    fn city(&self) -> &str {
        &self.city
    }
    fn unit_price(&self) -> i64 {
        self.price_per_night
    }
    fn rating(&self) -> f64 {
        self.rating
    }
    fn is_available(&self) -> bool {
        self.is_available && self.available_rooms > 0
    }
}

impl Listing for driver_profile::Model {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
    fn city(&self) -> &str {
        &self.city
    }
    fn unit_price(&self) -> i64 {
        self.price_per_day
    }
    fn rating(&self) -> f64 {
        self.rating
    }
    fn is_available(&self) -> bool {
        self.is_available
    }
    fn languages(&self) -> Option<&str> {
        Some(&self.languages)
    }
}

impl Listing for tour_guide_profile::Model {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
    fn city(&self) -> &str {
        &self.city
    }
    fn unit_price(&self) -> i64 {
        self.price_per_day
    }
    fn rating(&self) -> f64 {
        self.rating
    }
    fn is_available(&self) -> bool {
        self.is_available
    }
    fn languages(&self) -> Option<&str> {
        Some(&self.languages)
    }
    fn specialties(&self) -> Option<&str> {
        Some(&self.specialties)
    }
}

/// Query-string filters for catalog listings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListingFilter {
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f64>,
    pub language: Option<String>,
    pub specialty: Option<String>,
    pub vehicle_type: Option<String>,
}

fn contains_ci(haystack: Option<&str>, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack
            .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
    }
}

impl ListingFilter {
    pub fn matches<L: Listing>(&self, item: &L) -> bool {
        contains_ci(Some(item.city()), &self.city)
            && self.min_price.is_none_or(|min| item.unit_price() >= min)
            && self.max_price.is_none_or(|max| item.unit_price() <= max)
            && self.min_rating.is_none_or(|min| item.rating() >= min)
            && contains_ci(item.languages(), &self.language)
            && contains_ci(item.specialties(), &self.specialty)
            && contains_ci(item.vehicle_type(), &self.vehicle_type)
    }

    /// Linear scan keeping matching items in their original order.
    pub fn apply<L: Listing>(&self, items: Vec<L>, available_only: bool) -> Vec<L> {
        items
            .into_iter()
            .filter(|item| !available_only || item.is_available())
            .filter(|item| self.matches(item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn driver(city: &str, price: i64, rating: f64, languages: &str, available: bool) -> driver_profile::Model {
        driver_profile::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            city: city.to_string(),
            languages: languages.to_string(),
            experience_years: 4,
            license_number: None,
            price_per_day: price,
            is_available: available,
            rating,
            total_rides: 0,
            bio: None,
            photo_url: None,
            created_at: Utc::now().into(),
        }
    }

    fn claims(role: UserRole) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: "x@example.com".to_string(),
            role,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_city_and_language_are_case_insensitive_substrings() {
        let drivers = vec![
            driver("Dhaka", 1500, 4.5, "Bangla, English", true),
            driver("Cox's Bazar", 1200, 4.0, "Bangla", true),
            driver("Dhaka North", 2000, 3.5, "English, Hindi", true),
        ];

        let filter = ListingFilter {
            city: Some("dhaka".to_string()),
            language: Some("ENGLISH".to_string()),
            ..Default::default()
        };
        let found = filter.apply(drivers, false);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|d| d.city.starts_with("Dhaka")));
    }

    #[test]
    fn test_price_and_rating_bounds_are_inclusive() {
        let drivers = vec![
            driver("Sylhet", 1000, 4.0, "Bangla", true),
            driver("Sylhet", 1500, 4.8, "Bangla", true),
            driver("Sylhet", 2500, 5.0, "Bangla", true),
        ];

        let filter = ListingFilter {
            min_price: Some(1000),
            max_price: Some(1500),
            min_rating: Some(4.0),
            ..Default::default()
        };
        let prices: Vec<i64> = filter.apply(drivers, false).iter().map(|d| d.price_per_day).collect();
        assert_eq!(prices, vec![1000, 1500]);
    }

    #[test]
    fn test_available_only() {
        let drivers = vec![
            driver("Khulna", 1000, 4.0, "Bangla", false),
            driver("Khulna", 1000, 4.0, "Bangla", true),
        ];
        assert_eq!(ListingFilter::default().apply(drivers.clone(), true).len(), 1);
        assert_eq!(ListingFilter::default().apply(drivers, false).len(), 2);
    }

    #[test]
    fn test_filter_on_missing_field_excludes() {
        // Drivers have no specialties.
        let filter = ListingFilter {
            specialty: Some("history".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&driver("Dhaka", 1, 1.0, "Bangla", true)));

        let blank = ListingFilter {
            specialty: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.matches(&driver("Dhaka", 1, 1.0, "Bangla", true)));
    }

    #[test]
    fn test_owner_role_required_to_create() {
        assert!(ensure_can_create(&claims(UserRole::CarOwner), ResourceKind::Vehicle).is_ok());
        for role in [UserRole::Traveler, UserRole::HotelOwner, UserRole::Admin] {
            assert!(matches!(
                ensure_can_create(&claims(role), ResourceKind::Vehicle),
                Err(AppError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn test_only_owner_can_manage() {
        let owner = claims(UserRole::HotelOwner);
        let other = claims(UserRole::HotelOwner);
        assert!(ensure_can_manage(&owner, ResourceKind::Hotel, owner.sub).is_ok());
        assert!(matches!(
            ensure_can_manage(&other, ResourceKind::Hotel, owner.sub),
            Err(AppError::Forbidden(_))
        ));
        // Right id, wrong role.
        let mut driver_claims = claims(UserRole::Driver);
        driver_claims.sub = owner.sub;
        assert!(ensure_can_manage(&driver_claims, ResourceKind::Hotel, owner.sub).is_err());
    }
}
