use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::booking::{self as lifecycle, Actor, BookingAction};
use crate::domain::catalog::Listing;
use crate::domain::pricing::{self, Quote};
use crate::domain::promo;
use crate::entities::booking::{self, BookingStatus, BookingType};
use crate::entities::user::UserRole;
use crate::entities::{driver_profile, hotel, promo_code, tour_guide_profile, vehicle};
use crate::error::{AppError, AppResult};
use crate::extract::{QueryParams, ValidatedJson};
use crate::response::ApiResponse;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub booking_type: BookingType,
    pub resource_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(range(min = 1, max = 50, message = "rooms must be between 1 and 50"))]
    pub rooms: Option<i32>,
    #[validate(length(min = 1, max = 50, message = "promo_code must be 1-50 characters"))]
    pub promo_code: Option<String>,
    /// Client-side total. Ignored; the server prices every booking.
    pub total_price: Option<i64>,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

impl CreateBookingRequest {
    /// Date rules, checked before anything is loaded.
    pub fn billable_units(&self, today: NaiveDate) -> AppResult<i64> {
        let units = pricing::billable_units(self.start_date, self.end_date)?;
        if self.start_date < today {
            return Err(AppError::validation(
                "start_date",
                "start_date cannot be in the past",
            ));
        }
        Ok(units)
    }

    pub fn rooms(&self) -> i32 {
        match self.booking_type {
            BookingType::Hotel => self.rooms.unwrap_or(1),
            _ => 1,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_type: BookingType,
    pub resource_id: Uuid,
    pub traveler_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rooms: i32,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub service_charge: i64,
    pub total_price: i64,
    pub status: BookingStatus,
    pub promo_code_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<booking::Model> for BookingResponse {
    type Error = AppError;

    fn try_from(b: booking::Model) -> AppResult<Self> {
        Ok(Self {
            resource_id: lifecycle::resource_id(&b)?,
            id: b.id,
            booking_type: b.booking_type,
            traveler_id: b.traveler_id,
            start_date: b.start_date,
            end_date: b.end_date,
            rooms: b.rooms,
            subtotal: b.subtotal,
            discount_amount: b.discount_amount,
            service_charge: b.service_charge,
            total_price: b.total_price,
            status: b.status,
            promo_code_id: b.promo_code_id,
            notes: b.notes,
            created_at: b.created_at.with_timezone(&Utc),
            updated_at: b.updated_at.with_timezone(&Utc),
        })
    }
}

pub fn to_responses(bookings: Vec<booking::Model>) -> AppResult<Vec<BookingResponse>> {
    bookings.into_iter().map(BookingResponse::try_from).collect()
}

/// What a booking needs to know about the booked resource.
struct ResourceInfo {
    owner_id: Uuid,
    unit_price: i64,
    is_available: bool,
    available_rooms: Option<i32>,
}

impl ResourceInfo {
    fn of<L: Listing>(item: &L) -> Self {
        Self {
            owner_id: item.owner_id(),
            unit_price: item.unit_price(),
            is_available: item.is_available(),
            available_rooms: None,
        }
    }
}

/// Load the booked resource, optionally with `SELECT ... FOR UPDATE`.
async fn load_resource<C: ConnectionTrait>(
    conn: &C,
    booking_type: BookingType,
    id: Uuid,
    lock: bool,
) -> AppResult<Option<ResourceInfo>> {
    let info = match booking_type {
        BookingType::Vehicle => {
            let mut query = vehicle::Entity::find_by_id(id);
            if lock {
                query = query.lock_exclusive();
            }
            query.one(conn).await?.map(|v| ResourceInfo::of(&v))
        }
        BookingType::Hotel => {
            let mut query = hotel::Entity::find_by_id(id);
            if lock {
                query = query.lock_exclusive();
            }
            query.one(conn).await?.map(|h| ResourceInfo {
                is_available: h.is_available,
                available_rooms: Some(h.available_rooms),
                ..ResourceInfo::of(&h)
            })
        }
        BookingType::Driver => {
            let mut query = driver_profile::Entity::find_by_id(id);
            if lock {
                query = query.lock_exclusive();
            }
            query.one(conn).await?.map(|d| ResourceInfo::of(&d))
        }
        BookingType::TourGuide => {
            let mut query = tour_guide_profile::Entity::find_by_id(id);
            if lock {
                query = query.lock_exclusive();
            }
            query.one(conn).await?.map(|t| ResourceInfo::of(&t))
        }
    };
    Ok(info)
}

fn resource_column(booking_type: BookingType) -> booking::Column {
    match booking_type {
        BookingType::Vehicle => booking::Column::VehicleId,
        BookingType::Hotel => booking::Column::HotelId,
        BookingType::Driver => booking::Column::DriverId,
        BookingType::TourGuide => booking::Column::TourGuideId,
    }
}

/// The booking type a business role receives bookings for.
fn owned_booking_type(role: UserRole) -> Option<BookingType> {
    match role {
        UserRole::CarOwner => Some(BookingType::Vehicle),
        UserRole::HotelOwner => Some(BookingType::Hotel),
        UserRole::Driver => Some(BookingType::Driver),
        UserRole::TourGuide => Some(BookingType::TourGuide),
        UserRole::Traveler | UserRole::Admin => None,
    }
}

async fn owned_resource_ids<C: ConnectionTrait>(
    conn: &C,
    booking_type: BookingType,
    owner_id: Uuid,
) -> AppResult<Vec<Uuid>> {
    let ids = match booking_type {
        BookingType::Vehicle => vehicle::Entity::find()
            .filter(vehicle::Column::OwnerId.eq(owner_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect(),
        BookingType::Hotel => hotel::Entity::find()
            .filter(hotel::Column::OwnerId.eq(owner_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|h| h.id)
            .collect(),
        BookingType::Driver => driver_profile::Entity::find()
            .filter(driver_profile::Column::UserId.eq(owner_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect(),
        BookingType::TourGuide => tour_guide_profile::Entity::find()
            .filter(tour_guide_profile::Column::UserId.eq(owner_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect(),
    };
    Ok(ids)
}

async fn hold_rooms<C: ConnectionTrait>(conn: &C, hotel_id: Uuid, rooms: i32) -> AppResult<()> {
    let result = hotel::Entity::update_many()
        .col_expr(
            hotel::Column::AvailableRooms,
            Expr::col(hotel::Column::AvailableRooms).sub(rooms),
        )
        .filter(hotel::Column::Id.eq(hotel_id))
        .filter(hotel::Column::AvailableRooms.gte(rooms))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict("Not enough rooms available".to_string()));
    }
    Ok(())
}

/// Give rooms back, never above the hotel's total.
pub(crate) async fn release_rooms<C: ConnectionTrait>(conn: &C, hotel_id: Uuid, rooms: i32) -> AppResult<()> {
    hotel::Entity::update_many()
        .col_expr(
            hotel::Column::AvailableRooms,
            Expr::cust(format!("LEAST(available_rooms + {}, total_rooms)", rooms)),
        )
        .filter(hotel::Column::Id.eq(hotel_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Bump the completed-engagement counter of the booked resource.
async fn record_completion<C: ConnectionTrait>(
    conn: &C,
    booking_type: BookingType,
    resource_id: Uuid,
) -> AppResult<()> {
    match booking_type {
        BookingType::Vehicle => {
            vehicle::Entity::update_many()
                .col_expr(
                    vehicle::Column::TotalRides,
                    Expr::col(vehicle::Column::TotalRides).add(1),
                )
                .filter(vehicle::Column::Id.eq(resource_id))
                .exec(conn)
                .await?;
        }
        BookingType::Driver => {
            driver_profile::Entity::update_many()
                .col_expr(
                    driver_profile::Column::TotalRides,
                    Expr::col(driver_profile::Column::TotalRides).add(1),
                )
                .filter(driver_profile::Column::Id.eq(resource_id))
                .exec(conn)
                .await?;
        }
        BookingType::TourGuide => {
            tour_guide_profile::Entity::update_many()
                .col_expr(
                    tour_guide_profile::Column::TotalTours,
                    Expr::col(tour_guide_profile::Column::TotalTours).add(1),
                )
                .filter(tour_guide_profile::Column::Id.eq(resource_id))
                .exec(conn)
                .await?;
        }
        BookingType::Hotel => {}
    }
    Ok(())
}

/// Create a booking
///
/// Runs in one transaction: resource row locked, rooms held for hotels,
/// promo usage counted, booking inserted.
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<CreateBookingRequest>,
) -> AppResult<ApiResponse<BookingResponse>> {
    let units = payload.billable_units(Utc::now().date_naive())?;
    let rooms = payload.rooms();

    let txn = state.db.begin().await?;

    let resource = load_resource(&txn, payload.booking_type, payload.resource_id, true)
        .await?
        .ok_or_else(|| AppError::NotFound("Resource not found".to_string()))?;

    if !resource.is_available {
        return Err(AppError::Conflict(
            "This resource is not available for booking".to_string(),
        ));
    }

    if let Some(available) = resource.available_rooms {
        if available < rooms {
            return Err(AppError::Conflict(format!(
                "Only {} rooms available",
                available
            )));
        }
        hold_rooms(&txn, payload.resource_id, rooms).await?;
    }

    let subtotal = pricing::subtotal(resource.unit_price, units, rooms as i64)?;

    let mut promo_code_id = None;
    let mut discount = 0;
    if let Some(code) = payload.promo_code.as_deref() {
        let found = promo_code::Entity::find()
            .filter(promo_code::Column::Code.eq(promo::normalize_code(code)))
            .lock_exclusive()
            .one(&txn)
            .await?;

        promo::check(found.as_ref(), subtotal, Utc::now())
            .map_err(|rejection| AppError::validation("promo_code", rejection.message()))?;

        if let Some(found) = found {
            discount = promo::calculate_discount(&found, subtotal);
            promo_code_id = Some(found.id);

            promo_code::Entity::update_many()
                .col_expr(
                    promo_code::Column::UsedCount,
                    Expr::col(promo_code::Column::UsedCount).add(1),
                )
                .filter(promo_code::Column::Id.eq(found.id))
                .exec(&txn)
                .await?;
        }
    }

    let quote = Quote::new(units, subtotal, discount);

    if let Some(client_total) = payload.total_price {
        if client_total != quote.total {
            tracing::warn!(
                user_id = %claims.sub,
                client_total,
                server_total = quote.total,
                "Client total differs from server price"
            );
        }
    }

    let (vehicle_id, hotel_id, driver_id, tour_guide_id) =
        lifecycle::resource_columns(payload.booking_type, payload.resource_id);

    let new_booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_type: Set(payload.booking_type),
        vehicle_id: Set(vehicle_id),
        hotel_id: Set(hotel_id),
        driver_id: Set(driver_id),
        tour_guide_id: Set(tour_guide_id),
        traveler_id: Set(claims.sub),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        rooms: Set(rooms),
        subtotal: Set(quote.subtotal),
        discount_amount: Set(quote.discount),
        service_charge: Set(quote.service_charge),
        total_price: Set(quote.total),
        status: Set(BookingStatus::Pending),
        promo_code_id: Set(promo_code_id),
        notes: Set(payload.notes),
        ..Default::default()
    };

    let booking = new_booking.insert(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        booking_id = %booking.id,
        traveler_id = %claims.sub,
        booking_type = ?booking.booking_type,
        total = booking.total_price,
        "Booking created"
    );

    Ok(ApiResponse::created(booking.try_into()?).with_message("Booking created"))
}

/// Bookings visible to the caller: their own as a traveler, those on their
/// resources as an owner, everything as an admin.
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    QueryParams(params): QueryParams<BookingListQuery>,
) -> AppResult<ApiResponse<Vec<BookingResponse>>> {
    let mut query = booking::Entity::find().order_by_desc(booking::Column::CreatedAt);
    if let Some(status) = params.status {
        query = query.filter(booking::Column::Status.eq(status));
    }

    let bookings = match (claims.role, owned_booking_type(claims.role)) {
        (UserRole::Admin, _) => query.all(&state.db).await?,
        (_, Some(booking_type)) => {
            let ids = owned_resource_ids(&state.db, booking_type, claims.sub).await?;
            if ids.is_empty() {
                Vec::new()
            } else {
                query
                    .filter(resource_column(booking_type).is_in(ids))
                    .all(&state.db)
                    .await?
            }
        }
        (_, None) => {
            query
                .filter(booking::Column::TravelerId.eq(claims.sub))
                .all(&state.db)
                .await?
        }
    };

    Ok(ApiResponse::ok(to_responses(bookings)?))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<ApiResponse<BookingResponse>> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if !claims.is_admin() && booking.traveler_id != claims.sub {
        let resource_id = lifecycle::resource_id(&booking)?;
        let owner = load_resource(&state.db, booking.booking_type, resource_id, false)
            .await?
            .map(|r| r.owner_id);

        if owner != Some(claims.sub) {
            return Err(AppError::Forbidden(
                "You can only view your own bookings".to_string(),
            ));
        }
    }

    Ok(ApiResponse::ok(booking.try_into()?))
}

async fn apply_action(
    state: &AppState,
    claims: &Claims,
    booking_id: Uuid,
    action: BookingAction,
) -> AppResult<booking::Model> {
    let txn = state.db.begin().await?;

    let booking = booking::Entity::find_by_id(booking_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let resource_id = lifecycle::resource_id(&booking)?;

    let resource_owner = match action.actor() {
        // Locked so concurrent accepts on one resource serialize.
        Actor::Owner => load_resource(&txn, booking.booking_type, resource_id, true)
            .await?
            .map(|r| r.owner_id),
        Actor::Traveler => None,
    };
    lifecycle::authorize(action, &booking, resource_owner, claims)?;

    let next = lifecycle::transition(booking.status, action)?;

    if next == BookingStatus::Accepted && booking.booking_type != BookingType::Hotel {
        let accepted = booking::Entity::find()
            .filter(resource_column(booking.booking_type).eq(resource_id))
            .filter(booking::Column::Id.ne(booking.id))
            .filter(booking::Column::Status.eq(BookingStatus::Accepted))
            .all(&txn)
            .await?;

        let clash = accepted.iter().any(|other| {
            lifecycle::ranges_overlap(
                booking.start_date,
                booking.end_date,
                other.start_date,
                other.end_date,
            )
        });
        if clash {
            return Err(AppError::Conflict(
                "Another accepted booking overlaps these dates".to_string(),
            ));
        }
    }

    if booking.booking_type == BookingType::Hotel
        && booking.status.holds_capacity()
        && !next.holds_capacity()
    {
        release_rooms(&txn, resource_id, booking.rooms).await?;
    }

    if next == BookingStatus::Completed {
        record_completion(&txn, booking.booking_type, resource_id).await?;
    }

    let previous = booking.status;
    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        booking_id = %updated.id,
        actor_id = %claims.sub,
        from = previous.as_str(),
        to = next.as_str(),
        "Booking status changed"
    );

    Ok(updated)
}

/// Accept a pending booking (resource owner)
pub async fn accept_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<ApiResponse<BookingResponse>> {
    let booking = apply_action(&state, &claims, booking_id, BookingAction::Accept).await?;
    Ok(ApiResponse::ok(booking.try_into()?).with_message("Booking accepted"))
}

/// Reject a pending booking (resource owner)
pub async fn reject_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<ApiResponse<BookingResponse>> {
    let booking = apply_action(&state, &claims, booking_id, BookingAction::Reject).await?;
    Ok(ApiResponse::ok(booking.try_into()?).with_message("Booking rejected"))
}

/// Mark an accepted booking completed (resource owner)
pub async fn complete_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<ApiResponse<BookingResponse>> {
    let booking = apply_action(&state, &claims, booking_id, BookingAction::Complete).await?;
    Ok(ApiResponse::ok(booking.try_into()?).with_message("Booking completed"))
}

/// Cancel a pending or accepted booking (traveler)
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<ApiResponse<BookingResponse>> {
    let booking = apply_action(&state, &claims, booking_id, BookingAction::Cancel).await?;
    Ok(ApiResponse::ok(booking.try_into()?).with_message("Booking cancelled"))
}

/// Delete a booking (admin)
pub async fn delete_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    if !claims.is_admin() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    let txn = state.db.begin().await?;

    let booking = booking::Entity::find_by_id(booking_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.booking_type == BookingType::Hotel && booking.status.holds_capacity() {
        release_rooms(&txn, lifecycle::resource_id(&booking)?, booking.rooms).await?;
    }

    booking::Entity::delete_by_id(booking_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(booking_id = %booking_id, admin_id = %claims.sub, "Booking deleted");
    Ok(ApiResponse::message("Booking deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, MockDatabase, MockExecResult};

    use crate::test_support::{claims, ran, state_with, statements};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn stored_booking(
        booking_type: BookingType,
        resource_id: Uuid,
        status: BookingStatus,
        (start, end): (&str, &str),
    ) -> booking::Model {
        let (vehicle_id, hotel_id, driver_id, tour_guide_id) =
            lifecycle::resource_columns(booking_type, resource_id);
        let now = Utc::now().into();
        booking::Model {
            id: Uuid::new_v4(),
            booking_type,
            vehicle_id,
            hotel_id,
            driver_id,
            tour_guide_id,
            traveler_id: Uuid::new_v4(),
            start_date: date(start),
            end_date: date(end),
            rooms: 2,
            subtotal: 4000,
            discount_amount: 0,
            service_charge: 200,
            total_price: 4200,
            status,
            promo_code_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn driver(id: Uuid, user_id: Uuid) -> driver_profile::Model {
        driver_profile::Model {
            id,
            user_id,
            city: "Dhaka".to_string(),
            languages: "Bangla, English".to_string(),
            experience_years: 6,
            license_number: None,
            price_per_day: 1500,
            is_available: true,
            rating: 0.0,
            total_rides: 0,
            bio: None,
            photo_url: None,
            created_at: Utc::now().into(),
        }
    }

    fn hotel_row(id: Uuid, owner_id: Uuid) -> hotel::Model {
        hotel::Model {
            id,
            owner_id,
            name: "Lakeside".to_string(),
            city: "Sylhet".to_string(),
            address: "1 Shore Road".to_string(),
            description: None,
            price_per_night: 2000,
            total_rooms: 10,
            available_rooms: 6,
            is_available: true,
            rating: 0.0,
            photo_url: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_accept_by_someone_else_is_forbidden() {
        let (driver_id, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let pending = stored_booking(
            BookingType::Driver,
            driver_id,
            BookingStatus::Pending,
            ("2026-11-01", "2026-11-04"),
        );
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[pending.clone()]])
                .append_query_results([[driver(driver_id, owner)]])
                .into_connection(),
        );

        let stranger = claims(Uuid::new_v4(), UserRole::Driver);
        let err = apply_action(&state, &stranger, pending.id, BookingAction::Accept)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let log = statements(state);
        assert!(!ran(&log, r#"UPDATE "booking""#), "{log:?}");
        assert!(ran(&log, "ROLLBACK"), "{log:?}");
    }

    #[tokio::test]
    async fn test_accept_of_settled_booking_conflicts() {
        let (driver_id, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let completed = stored_booking(
            BookingType::Driver,
            driver_id,
            BookingStatus::Completed,
            ("2026-11-01", "2026-11-04"),
        );
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[completed.clone()]])
                .append_query_results([[driver(driver_id, owner)]])
                .into_connection(),
        );

        let err = apply_action(
            &state,
            &claims(owner, UserRole::Driver),
            completed.id,
            BookingAction::Accept,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Cannot accept a booking that is completed"));
    }

    #[tokio::test]
    async fn test_accept_overlapping_an_accepted_booking_conflicts() {
        let (driver_id, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let pending = stored_booking(
            BookingType::Driver,
            driver_id,
            BookingStatus::Pending,
            ("2026-11-03", "2026-11-06"),
        );
        let accepted = stored_booking(
            BookingType::Driver,
            driver_id,
            BookingStatus::Accepted,
            ("2026-11-01", "2026-11-04"),
        );
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[pending.clone()]])
                .append_query_results([[driver(driver_id, owner)]])
                .append_query_results([[accepted]])
                .into_connection(),
        );

        let err = apply_action(
            &state,
            &claims(owner, UserRole::Driver),
            pending.id,
            BookingAction::Accept,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_accept_back_to_back_booking_succeeds() {
        let (driver_id, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let pending = stored_booking(
            BookingType::Driver,
            driver_id,
            BookingStatus::Pending,
            ("2026-11-04", "2026-11-06"),
        );
        let accepted = stored_booking(
            BookingType::Driver,
            driver_id,
            BookingStatus::Accepted,
            ("2026-11-01", "2026-11-04"),
        );
        let updated = booking::Model {
            status: BookingStatus::Accepted,
            ..pending.clone()
        };
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[pending.clone()]])
                .append_query_results([[driver(driver_id, owner)]])
                .append_query_results([[accepted]])
                .append_query_results([[updated]])
                .into_connection(),
        );

        let booking = apply_action(
            &state,
            &claims(owner, UserRole::Driver),
            pending.id,
            BookingAction::Accept,
        )
        .await
        .unwrap();
        assert_eq!(booking.status, BookingStatus::Accepted);
        assert!(ran(&statements(state), "COMMIT"));
    }

    #[tokio::test]
    async fn test_cancel_by_another_traveler_is_forbidden() {
        let pending = stored_booking(
            BookingType::Hotel,
            Uuid::new_v4(),
            BookingStatus::Pending,
            ("2026-11-01", "2026-11-03"),
        );
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[pending.clone()]])
                .into_connection(),
        );

        let err = apply_action(
            &state,
            &claims(Uuid::new_v4(), UserRole::Traveler),
            pending.id,
            BookingAction::Cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(!ran(&statements(state), "LEAST("));
    }

    #[tokio::test]
    async fn test_reject_of_hotel_booking_releases_rooms() {
        let (hotel_id, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let pending = stored_booking(
            BookingType::Hotel,
            hotel_id,
            BookingStatus::Pending,
            ("2026-11-01", "2026-11-03"),
        );
        let updated = booking::Model {
            status: BookingStatus::Rejected,
            ..pending.clone()
        };
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[pending.clone()]])
                .append_query_results([[hotel_row(hotel_id, owner)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[updated]])
                .into_connection(),
        );

        let booking = apply_action(
            &state,
            &claims(owner, UserRole::HotelOwner),
            pending.id,
            BookingAction::Reject,
        )
        .await
        .unwrap();
        assert_eq!(booking.status, BookingStatus::Rejected);

        let log = statements(state);
        assert!(ran(&log, "LEAST(available_rooms + 2, total_rooms)"), "{log:?}");
    }

    #[tokio::test]
    async fn test_cancel_of_accepted_hotel_booking_releases_rooms() {
        let pending = stored_booking(
            BookingType::Hotel,
            Uuid::new_v4(),
            BookingStatus::Accepted,
            ("2026-11-01", "2026-11-03"),
        );
        let updated = booking::Model {
            status: BookingStatus::Cancelled,
            ..pending.clone()
        };
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[pending.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[updated]])
                .into_connection(),
        );

        let booking = apply_action(
            &state,
            &claims(pending.traveler_id, UserRole::Traveler),
            pending.id,
            BookingAction::Cancel,
        )
        .await
        .unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert!(ran(&statements(state), "LEAST(available_rooms + 2, total_rooms)"));
    }

    fn request(booking_type: BookingType, start: &str, end: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            booking_type,
            resource_id: Uuid::new_v4(),
            start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            end_date: NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
            rooms: Some(3),
            promo_code: None,
            total_price: None,
            notes: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::parse_from_str("2026-10-14", "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_end_before_start_fails_validation() {
        let req = request(BookingType::Driver, "2026-11-04", "2026-11-01");
        assert!(matches!(req.billable_units(today()), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_past_start_fails_validation() {
        let req = request(BookingType::Vehicle, "2026-10-01", "2026-10-20");
        assert!(matches!(req.billable_units(today()), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_units_for_valid_range() {
        let req = request(BookingType::Driver, "2026-11-01", "2026-11-04");
        assert_eq!(req.billable_units(today()).unwrap(), 3);
    }

    #[test]
    fn test_rooms_only_count_for_hotels() {
        assert_eq!(request(BookingType::Hotel, "2026-11-01", "2026-11-02").rooms(), 3);
        assert_eq!(request(BookingType::TourGuide, "2026-11-01", "2026-11-02").rooms(), 1);
    }

    #[test]
    fn test_booking_type_wire_names() {
        let req: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "booking_type": "tour-guide",
            "resource_id": Uuid::new_v4(),
            "start_date": "2026-11-01",
            "end_date": "2026-11-03"
        }))
        .unwrap();
        assert_eq!(req.booking_type, BookingType::TourGuide);
        assert_eq!(
            serde_json::to_value(BookingType::TourGuide).unwrap(),
            serde_json::json!("tour-guide")
        );
    }

    #[test]
    fn test_owned_booking_type() {
        assert_eq!(owned_booking_type(UserRole::CarOwner), Some(BookingType::Vehicle));
        assert_eq!(owned_booking_type(UserRole::HotelOwner), Some(BookingType::Hotel));
        assert_eq!(owned_booking_type(UserRole::Driver), Some(BookingType::Driver));
        assert_eq!(owned_booking_type(UserRole::TourGuide), Some(BookingType::TourGuide));
        assert_eq!(owned_booking_type(UserRole::Traveler), None);
        assert_eq!(owned_booking_type(UserRole::Admin), None);
    }
}
