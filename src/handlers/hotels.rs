use axum::{
    extract::{Path, State},
    Extension,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::catalog::{ensure_can_create, ensure_can_manage, ListingFilter, ResourceKind};
use crate::entities::hotel;
use crate::error::{AppError, AppResult};
use crate::extract::{MaybeClaims, QueryParams, ValidatedJson};
use crate::handlers::catalog::ListingDetail;
use crate::response::ApiResponse;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateHotelRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price_per_night: i64,
    #[validate(range(min = 1, max = 10000))]
    pub total_rooms: i32,
    pub is_available: Option<bool>,
    #[validate(length(max = 512))]
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateHotelRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price_per_night: Option<i64>,
    #[validate(range(min = 1, max = 10000))]
    pub total_rooms: Option<i32>,
    pub is_available: Option<bool>,
    #[validate(length(max = 512))]
    pub photo_url: Option<String>,
}

/// Rooms still free after changing the room count. Rooms held by bookings
/// stay held.
pub fn resize_rooms(total: i32, available: i32, new_total: i32) -> i32 {
    let held = (total - available).max(0);
    (new_total - held).clamp(0, new_total)
}

async fn find_hotel(state: &AppState, id: Uuid) -> AppResult<hotel::Model> {
    hotel::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Hotel not found".to_string()))
}

/// List hotels
pub async fn list_hotels(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListingFilter>,
) -> AppResult<ApiResponse<Vec<hotel::Model>>> {
    let hotels = hotel::Entity::find()
        .order_by_desc(hotel::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(filter.apply(hotels, false)))
}

/// List hotels that are open and have a free room
pub async fn list_available_hotels(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListingFilter>,
) -> AppResult<ApiResponse<Vec<hotel::Model>>> {
    let hotels = hotel::Entity::find()
        .filter(hotel::Column::IsAvailable.eq(true))
        .filter(hotel::Column::AvailableRooms.gt(0))
        .order_by_desc(hotel::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(filter.apply(hotels, true)))
}

pub async fn get_hotel(
    State(state): State<AppState>,
    MaybeClaims(viewer): MaybeClaims,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<ListingDetail<hotel::Model>>> {
    let hotel = find_hotel(&state, id).await?;
    Ok(ApiResponse::ok(ListingDetail::new(hotel, viewer.as_ref())))
}

/// Hotels owned by the caller
pub async fn my_hotels(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<ApiResponse<Vec<hotel::Model>>> {
    ensure_can_create(&claims, ResourceKind::Hotel)?;

    let hotels = hotel::Entity::find()
        .filter(hotel::Column::OwnerId.eq(claims.sub))
        .order_by_desc(hotel::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(hotels))
}

pub async fn create_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<CreateHotelRequest>,
) -> AppResult<ApiResponse<hotel::Model>> {
    ensure_can_create(&claims, ResourceKind::Hotel)?;

    let hotel = hotel::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(claims.sub),
        name: Set(payload.name),
        city: Set(payload.city),
        address: Set(payload.address),
        description: Set(payload.description),
        price_per_night: Set(payload.price_per_night),
        total_rooms: Set(payload.total_rooms),
        available_rooms: Set(payload.total_rooms),
        is_available: Set(payload.is_available.unwrap_or(true)),
        rating: Set(0.0),
        photo_url: Set(payload.photo_url),
        ..Default::default()
    };

    let result = hotel.insert(&state.db).await?;
    tracing::info!(hotel_id = %result.id, owner_id = %claims.sub, "Hotel listed");
    Ok(ApiResponse::created(result).with_message("Hotel created"))
}

pub async fn update_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateHotelRequest>,
) -> AppResult<ApiResponse<hotel::Model>> {
    // Booking holds decrement `available_rooms` under the same row lock, so
    // the resize below sees every hold made before it.
    let txn = state.db.begin().await?;
    let hotel = hotel::Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Hotel not found".to_string()))?;
    ensure_can_manage(&claims, ResourceKind::Hotel, hotel.owner_id)?;

    let (total, available) = (hotel.total_rooms, hotel.available_rooms);
    let mut active: hotel::ActiveModel = hotel.into();

    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price_per_night {
        active.price_per_night = Set(price);
    }
    if let Some(new_total) = payload.total_rooms {
        active.total_rooms = Set(new_total);
        active.available_rooms = Set(resize_rooms(total, available, new_total));
    }
    if let Some(available) = payload.is_available {
        active.is_available = Set(available);
    }
    if let Some(photo_url) = payload.photo_url {
        active.photo_url = Set(Some(photo_url));
    }

    let result = active.update(&txn).await?;
    txn.commit().await?;
    Ok(ApiResponse::ok(result).with_message("Hotel updated"))
}

pub async fn delete_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    let hotel = find_hotel(&state, id).await?;
    ensure_can_manage(&claims, ResourceKind::Hotel, hotel.owner_id)?;

    hotel::Entity::delete_by_id(id).exec(&state.db).await?;
    tracing::info!(hotel_id = %id, "Hotel deleted");

    Ok(ApiResponse::message("Hotel deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DbBackend, MockDatabase};

    use crate::entities::user::UserRole;
    use crate::test_support::{claims, ran, state_with, statements};

    fn hotel_model(owner_id: Uuid, total_rooms: i32, available_rooms: i32) -> hotel::Model {
        hotel::Model {
            id: Uuid::new_v4(),
            owner_id,
            name: "Lakeside".to_string(),
            city: "Sylhet".to_string(),
            address: "1 Shore Road".to_string(),
            description: None,
            price_per_night: 2000,
            total_rooms,
            available_rooms,
            is_available: true,
            rating: 0.0,
            photo_url: None,
            created_at: Utc::now().into(),
        }
    }

    fn resize_request(total_rooms: i32) -> UpdateHotelRequest {
        UpdateHotelRequest {
            name: None,
            city: None,
            address: None,
            description: None,
            price_per_night: None,
            total_rooms: Some(total_rooms),
            is_available: None,
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_update_hotel_resizes_under_row_lock() {
        let owner = Uuid::new_v4();
        // 10 rooms with 5 held; growing to 20 leaves 15 free
        let current = hotel_model(owner, 10, 5);
        let updated = hotel::Model {
            total_rooms: 20,
            available_rooms: 15,
            ..current.clone()
        };
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[current.clone()], [updated]])
                .into_connection(),
        );

        let response = update_hotel(
            State(state.clone()),
            Extension(claims(owner, UserRole::HotelOwner)),
            Path(current.id),
            ValidatedJson(resize_request(20)),
        )
        .await
        .unwrap();
        assert_eq!(response.data.as_ref().unwrap().available_rooms, 15);

        let log = statements(state);
        assert!(ran(&log, "FOR UPDATE"), "{log:?}");
        assert!(ran(&log, r#""available_rooms" = 15"#), "{log:?}");
        assert!(ran(&log, "COMMIT"), "{log:?}");
    }

    #[tokio::test]
    async fn test_update_hotel_rejects_other_owner_before_writing() {
        let current = hotel_model(Uuid::new_v4(), 10, 5);
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[current.clone()]])
                .into_connection(),
        );

        let err = update_hotel(
            State(state.clone()),
            Extension(claims(Uuid::new_v4(), UserRole::HotelOwner)),
            Path(current.id),
            ValidatedJson(resize_request(20)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let log = statements(state);
        assert!(!ran(&log, r#"UPDATE "hotel""#), "{log:?}");
        assert!(ran(&log, "ROLLBACK"), "{log:?}");
    }

    #[test]
    fn test_resize_rooms_keeps_held_rooms() {
        // 10 rooms, 3 booked.
        assert_eq!(resize_rooms(10, 7, 20), 17);
        assert_eq!(resize_rooms(10, 7, 5), 2);
        assert_eq!(resize_rooms(10, 7, 2), 0);
        assert_eq!(resize_rooms(10, 10, 4), 4);
    }
}
