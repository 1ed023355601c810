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
                    .table(Hotel::Table)
                    .if_not_exists()
                    .col(uuid(Hotel::Id).primary_key())
                    .col(uuid(Hotel::OwnerId).not_null())
                    .col(string_len(Hotel::Name, 150).not_null())
                    .col(string_len(Hotel::City, 100).not_null())
                    .col(string_len(Hotel::Address, 255).not_null())
                    .col(text_null(Hotel::Description))
                    .col(big_integer(Hotel::PricePerNight).not_null())
                    .col(integer(Hotel::TotalRooms).not_null())
                    .col(integer(Hotel::AvailableRooms).not_null())
                    .col(boolean(Hotel::IsAvailable).not_null().default(true))
                    .col(double(Hotel::Rating).not_null().default(0.0))
                    .col(string_len_null(Hotel::PhotoUrl, 512))
                    .col(
                        timestamp_with_time_zone(Hotel::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust("available_rooms >= 0 AND available_rooms <= total_rooms"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hotel_owner")
                            .from(Hotel::Table, Hotel::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Hotel::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Hotel {
    Table,
    Id,
    OwnerId,
    Name,
    City,
    Address,
    Description,
    PricePerNight,
    TotalRooms,
    AvailableRooms,
    IsAvailable,
    Rating,
    PhotoUrl,
    CreatedAt,
}
