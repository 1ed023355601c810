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
                    .table(TourGuideProfile::Table)
                    .if_not_exists()
                    .col(uuid(TourGuideProfile::Id).primary_key())
                    .col(uuid(TourGuideProfile::UserId).not_null().unique_key())
                    .col(string_len(TourGuideProfile::City, 100).not_null())
                    .col(string_len(TourGuideProfile::Languages, 255).not_null())
                    .col(string_len(TourGuideProfile::Specialties, 255).not_null())
                    .col(integer(TourGuideProfile::ExperienceYears).not_null().default(0))
                    .col(big_integer(TourGuideProfile::PricePerDay).not_null())
                    .col(boolean(TourGuideProfile::IsAvailable).not_null().default(true))
                    .col(double(TourGuideProfile::Rating).not_null().default(0.0))
                    .col(integer(TourGuideProfile::TotalTours).not_null().default(0))
                    .col(text_null(TourGuideProfile::Bio))
                    .col(string_len_null(TourGuideProfile::PhotoUrl, 512))
                    .col(
                        timestamp_with_time_zone(TourGuideProfile::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tour_guide_profile_user")
                            .from(TourGuideProfile::Table, TourGuideProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TourGuideProfile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TourGuideProfile {
    Table,
    Id,
    UserId,
    City,
    Languages,
    Specialties,
    ExperienceYears,
    PricePerDay,
    IsAvailable,
    Rating,
    TotalTours,
    Bio,
    PhotoUrl,
    CreatedAt,
}
