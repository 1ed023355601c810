//! Marketplace rules that do not touch the database.

pub mod booking;
pub mod catalog;
pub mod document;
pub mod pricing;
pub mod promo;
