use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20241001_000001_create_users::User;
use super::m20241001_000002_create_driver_profiles::DriverProfile;
use super::m20241001_000003_create_tour_guide_profiles::TourGuideProfile;
use super::m20241001_000004_create_vehicles::Vehicle;
use super::m20241001_000005_create_hotels::Hotel;
use super::m20241001_000006_create_promo_codes::PromoCode;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(BookingType::Enum)
                    .values([
                        BookingType::Vehicle,
                        BookingType::Hotel,
                        BookingType::Driver,
                        BookingType::TourGuide,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(BookingStatus::Enum)
                    .values([
                        BookingStatus::Pending,
                        BookingStatus::Accepted,
                        BookingStatus::Rejected,
                        BookingStatus::Completed,
                        BookingStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(
                        ColumnDef::new(Booking::BookingType)
                            .custom(BookingType::Enum)
                            .not_null(),
                    )
                    .col(uuid_null(Booking::VehicleId))
                    .col(uuid_null(Booking::HotelId))
                    .col(uuid_null(Booking::DriverId))
                    .col(uuid_null(Booking::TourGuideId))
                    .col(uuid(Booking::TravelerId).not_null())
                    .col(date(Booking::StartDate).not_null())
                    .col(date(Booking::EndDate).not_null())
                    .col(integer(Booking::Rooms).not_null().default(1))
                    .col(big_integer(Booking::Subtotal).not_null())
                    .col(big_integer(Booking::DiscountAmount).not_null().default(0))
                    .col(big_integer(Booking::ServiceCharge).not_null())
                    .col(big_integer(Booking::TotalPrice).not_null())
                    .col(
                        ColumnDef::new(Booking::Status)
                            .custom(BookingStatus::Enum)
                            .not_null(),
                    )
                    .col(uuid_null(Booking::PromoCodeId))
                    .col(text_null(Booking::Notes))
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust(
                        "num_nonnulls(vehicle_id, hotel_id, driver_id, tour_guide_id) = 1",
                    ))
                    .check(Expr::cust("end_date >= start_date"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_traveler")
                            .from(Booking::Table, Booking::TravelerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_vehicle")
                            .from(Booking::Table, Booking::VehicleId)
                            .to(Vehicle::Table, Vehicle::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_hotel")
                            .from(Booking::Table, Booking::HotelId)
                            .to(Hotel::Table, Hotel::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_driver")
                            .from(Booking::Table, Booking::DriverId)
                            .to(DriverProfile::Table, DriverProfile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_tour_guide")
                            .from(Booking::Table, Booking::TourGuideId)
                            .to(TourGuideProfile::Table, TourGuideProfile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_promo_code")
                            .from(Booking::Table, Booking::PromoCodeId)
                            .to(PromoCode::Table, PromoCode::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    BookingType,
    VehicleId,
    HotelId,
    DriverId,
    TourGuideId,
    TravelerId,
    StartDate,
    EndDate,
    Rooms,
    Subtotal,
    DiscountAmount,
    ServiceCharge,
    TotalPrice,
    Status,
    PromoCodeId,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum BookingType {
    #[sea_orm(iden = "booking_type")]
    Enum,
    #[sea_orm(iden = "vehicle")]
    Vehicle,
    #[sea_orm(iden = "hotel")]
    Hotel,
    #[sea_orm(iden = "driver")]
    Driver,
    #[sea_orm(iden = "tour_guide")]
    TourGuide,
}

#[derive(DeriveIden)]
pub enum BookingStatus {
    #[sea_orm(iden = "booking_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "accepted")]
    Accepted,
    #[sea_orm(iden = "rejected")]
    Rejected,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}
