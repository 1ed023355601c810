pub mod admin;
pub mod bookings;
pub mod catalog;
pub mod documents;
pub mod drivers;
pub mod health;
pub mod hotels;
pub mod promos;
pub mod tour_guides;
pub mod uploads;
pub mod users;
pub mod vehicles;
