use axum::{
    extract::{Path, State},
    Extension,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::catalog::{ensure_can_create, ensure_can_manage, ListingFilter, ResourceKind};
use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::extract::{MaybeClaims, QueryParams, ValidatedJson};
use crate::handlers::catalog::ListingDetail;
use crate::response::ApiResponse;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: String,
    #[validate(range(min = 1, max = 100))]
    pub seats: i32,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(range(min = 0))]
    pub price_per_day: i64,
    pub is_available: Option<bool>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 512))]
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub seats: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(range(min = 0))]
    pub price_per_day: Option<i64>,
    pub is_available: Option<bool>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 512))]
    pub photo_url: Option<String>,
}

async fn find_vehicle(state: &AppState, id: Uuid) -> AppResult<vehicle::Model> {
    vehicle::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))
}

/// List vehicles
pub async fn list_vehicles(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListingFilter>,
) -> AppResult<ApiResponse<Vec<vehicle::Model>>> {
    let vehicles = vehicle::Entity::find()
        .order_by_desc(vehicle::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(filter.apply(vehicles, false)))
}

/// List vehicles currently marked available
pub async fn list_available_vehicles(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListingFilter>,
) -> AppResult<ApiResponse<Vec<vehicle::Model>>> {
    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::IsAvailable.eq(true))
        .order_by_desc(vehicle::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(filter.apply(vehicles, true)))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    MaybeClaims(viewer): MaybeClaims,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<ListingDetail<vehicle::Model>>> {
    let vehicle = find_vehicle(&state, id).await?;
    Ok(ApiResponse::ok(ListingDetail::new(vehicle, viewer.as_ref())))
}

/// Vehicles owned by the caller
pub async fn my_vehicles(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<ApiResponse<Vec<vehicle::Model>>> {
    ensure_can_create(&claims, ResourceKind::Vehicle)?;

    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::OwnerId.eq(claims.sub))
        .order_by_desc(vehicle::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(vehicles))
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<CreateVehicleRequest>,
) -> AppResult<ApiResponse<vehicle::Model>> {
    ensure_can_create(&claims, ResourceKind::Vehicle)?;

    let vehicle = vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(claims.sub),
        name: Set(payload.name),
        vehicle_type: Set(payload.vehicle_type),
        seats: Set(payload.seats),
        city: Set(payload.city),
        price_per_day: Set(payload.price_per_day),
        is_available: Set(payload.is_available.unwrap_or(true)),
        rating: Set(0.0),
        total_rides: Set(0),
        description: Set(payload.description),
        photo_url: Set(payload.photo_url),
        ..Default::default()
    };

    let result = vehicle.insert(&state.db).await?;
    tracing::info!(vehicle_id = %result.id, owner_id = %claims.sub, "Vehicle listed");
    Ok(ApiResponse::created(result).with_message("Vehicle created"))
}

pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateVehicleRequest>,
) -> AppResult<ApiResponse<vehicle::Model>> {
    let vehicle = find_vehicle(&state, id).await?;
    ensure_can_manage(&claims, ResourceKind::Vehicle, vehicle.owner_id)?;

    let mut active: vehicle::ActiveModel = vehicle.into();

    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(vehicle_type) = payload.vehicle_type {
        active.vehicle_type = Set(vehicle_type);
    }
    if let Some(seats) = payload.seats {
        active.seats = Set(seats);
    }
    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    if let Some(price) = payload.price_per_day {
        active.price_per_day = Set(price);
    }
    if let Some(available) = payload.is_available {
        active.is_available = Set(available);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(photo_url) = payload.photo_url {
        active.photo_url = Set(Some(photo_url));
    }

    let result = active.update(&state.db).await?;
    Ok(ApiResponse::ok(result).with_message("Vehicle updated"))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    let vehicle = find_vehicle(&state, id).await?;
    ensure_can_manage(&claims, ResourceKind::Vehicle, vehicle.owner_id)?;

    vehicle::Entity::delete_by_id(id).exec(&state.db).await?;
    tracing::info!(vehicle_id = %id, "Vehicle deleted");

    Ok(ApiResponse::message("Vehicle deleted"))
}
