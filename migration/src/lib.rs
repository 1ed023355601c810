pub use sea_orm_migration::prelude::*;

mod m20241001_000001_create_users;
mod m20241001_000002_create_driver_profiles;
mod m20241001_000003_create_tour_guide_profiles;
mod m20241001_000004_create_vehicles;
mod m20241001_000005_create_hotels;
mod m20241001_000006_create_promo_codes;
mod m20241001_000007_create_bookings;
mod m20241001_000008_create_documents;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241001_000001_create_users::Migration),
            Box::new(m20241001_000002_create_driver_profiles::Migration),
            Box::new(m20241001_000003_create_tour_guide_profiles::Migration),
            Box::new(m20241001_000004_create_vehicles::Migration),
            Box::new(m20241001_000005_create_hotels::Migration),
            Box::new(m20241001_000006_create_promo_codes::Migration),
            Box::new(m20241001_000007_create_bookings::Migration),
            Box::new(m20241001_000008_create_documents::Migration),
        ]
    }
}
