use sea_orm_migration::{prelude::*, schema::*};

use super::m20241001_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vehicle::Table)
                    .if_not_exists()
                    .col(uuid(Vehicle::Id).primary_key())
                    .col(uuid(Vehicle::OwnerId).not_null())
                    .col(string_len(Vehicle::Name, 100).not_null())
                    .col(string_len(Vehicle::VehicleType, 50).not_null())
                    .col(integer(Vehicle::Seats).not_null())
                    .col(string_len(Vehicle::City, 100).not_null())
                    .col(big_integer(Vehicle::PricePerDay).not_null())
                    .col(boolean(Vehicle::IsAvailable).not_null().default(true))
                    .col(double(Vehicle::Rating).not_null().default(0.0))
                    .col(integer(Vehicle::TotalRides).not_null().default(0))
                    .col(text_null(Vehicle::Description))
                    .col(string_len_null(Vehicle::PhotoUrl, 512))
                    .col(
                        timestamp_with_time_zone(Vehicle::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_owner")
                            .from(Vehicle::Table, Vehicle::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicle::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vehicle {
    Table,
    Id,
    OwnerId,
    Name,
    VehicleType,
    Seats,
    City,
    PricePerDay,
    IsAvailable,
    Rating,
    TotalRides,
    Description,
    PhotoUrl,
    CreatedAt,
}
