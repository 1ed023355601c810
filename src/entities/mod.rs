pub mod booking;
pub mod document;
pub mod driver_profile;
pub mod hotel;
pub mod promo_code;
pub mod tour_guide_profile;
pub mod user;
pub mod vehicle;
