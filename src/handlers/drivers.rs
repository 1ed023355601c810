use axum::{
    extract::{Path, State},
    Extension,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::catalog::{ensure_can_create, ensure_can_manage, ListingFilter, ResourceKind};
use crate::entities::driver_profile;
use crate::error::{AppError, AppResult};
use crate::extract::{MaybeClaims, QueryParams, ValidatedJson};
use crate::handlers::catalog::ListingDetail;
use crate::response::ApiResponse;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 255))]
    pub languages: String,
    #[validate(range(min = 0, max = 70))]
    pub experience_years: Option<i32>,
    #[validate(length(max = 64))]
    pub license_number: Option<String>,
    #[validate(range(min = 0))]
    pub price_per_day: i64,
    pub is_available: Option<bool>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDriverProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub languages: Option<String>,
    #[validate(range(min = 0, max = 70))]
    pub experience_years: Option<i32>,
    #[validate(length(max = 64))]
    pub license_number: Option<String>,
    #[validate(range(min = 0))]
    pub price_per_day: Option<i64>,
    pub is_available: Option<bool>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

async fn find_driver(state: &AppState, id: Uuid) -> AppResult<driver_profile::Model> {
    driver_profile::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))
}

/// List drivers
pub async fn list_drivers(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListingFilter>,
) -> AppResult<ApiResponse<Vec<driver_profile::Model>>> {
    let drivers = driver_profile::Entity::find()
        .order_by_desc(driver_profile::Column::Rating)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(filter.apply(drivers, false)))
}

/// List drivers currently taking bookings
pub async fn list_available_drivers(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListingFilter>,
) -> AppResult<ApiResponse<Vec<driver_profile::Model>>> {
    let drivers = driver_profile::Entity::find()
        .filter(driver_profile::Column::IsAvailable.eq(true))
        .order_by_desc(driver_profile::Column::Rating)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(filter.apply(drivers, true)))
}

pub async fn get_driver(
    State(state): State<AppState>,
    MaybeClaims(viewer): MaybeClaims,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<ListingDetail<driver_profile::Model>>> {
    let driver = find_driver(&state, id).await?;
    Ok(ApiResponse::ok(ListingDetail::new(driver, viewer.as_ref())))
}

/// The caller's own driver profile
pub async fn my_driver_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<ApiResponse<driver_profile::Model>> {
    ensure_can_create(&claims, ResourceKind::Driver)?;

    let profile = driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("You have not created a driver profile".to_string()))?;

    Ok(ApiResponse::ok(profile))
}

pub async fn create_driver_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<CreateDriverProfileRequest>,
) -> AppResult<ApiResponse<driver_profile::Model>> {
    ensure_can_create(&claims, ResourceKind::Driver)?;

    let existing = driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(claims.sub))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Driver profile already exists".to_string(),
        ));
    }

    let profile = driver_profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(claims.sub),
        city: Set(payload.city),
        languages: Set(payload.languages),
        experience_years: Set(payload.experience_years.unwrap_or(0)),
        license_number: Set(payload.license_number),
        price_per_day: Set(payload.price_per_day),
        is_available: Set(payload.is_available.unwrap_or(true)),
        rating: Set(0.0),
        total_rides: Set(0),
        bio: Set(payload.bio),
        photo_url: Set(None),
        ..Default::default()
    };

    let result = profile
        .insert(&state.db)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Driver profile already exists"))?;
    tracing::info!(driver_id = %result.id, user_id = %claims.sub, "Driver profile created");
    Ok(ApiResponse::created(result).with_message("Driver profile created"))
}

pub async fn update_driver_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateDriverProfileRequest>,
) -> AppResult<ApiResponse<driver_profile::Model>> {
    let profile = find_driver(&state, id).await?;
    ensure_can_manage(&claims, ResourceKind::Driver, profile.user_id)?;

    let mut active: driver_profile::ActiveModel = profile.into();

    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    if let Some(languages) = payload.languages {
        active.languages = Set(languages);
    }
    if let Some(years) = payload.experience_years {
        active.experience_years = Set(years);
    }
    if let Some(license) = payload.license_number {
        active.license_number = Set(Some(license));
    }
    if let Some(price) = payload.price_per_day {
        active.price_per_day = Set(price);
    }
    if let Some(available) = payload.is_available {
        active.is_available = Set(available);
    }
    if let Some(bio) = payload.bio {
        active.bio = Set(Some(bio));
    }

    let result = active.update(&state.db).await?;
    Ok(ApiResponse::ok(result).with_message("Driver profile updated"))
}

pub async fn delete_driver_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    let profile = find_driver(&state, id).await?;
    ensure_can_manage(&claims, ResourceKind::Driver, profile.user_id)?;

    driver_profile::Entity::delete_by_id(id).exec(&state.db).await?;
    tracing::info!(driver_id = %id, "Driver profile deleted");

    Ok(ApiResponse::message("Driver profile deleted"))
}
