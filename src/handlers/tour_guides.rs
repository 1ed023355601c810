use axum::{
    extract::{Path, State},
    Extension,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::catalog::{ensure_can_create, ensure_can_manage, ListingFilter, ResourceKind};
use crate::entities::tour_guide_profile;
use crate::error::{AppError, AppResult};
use crate::extract::{MaybeClaims, QueryParams, ValidatedJson};
use crate::handlers::catalog::ListingDetail;
use crate::response::ApiResponse;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTourGuideProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 255))]
    pub languages: String,
    #[validate(range(min = 0, max = 70))]
    pub experience_years: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    pub specialties: String,
    #[validate(range(min = 0))]
    pub price_per_day: i64,
    pub is_available: Option<bool>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTourGuideProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub languages: Option<String>,
    #[validate(range(min = 0, max = 70))]
    pub experience_years: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    pub specialties: Option<String>,
    #[validate(range(min = 0))]
    pub price_per_day: Option<i64>,
    pub is_available: Option<bool>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

async fn find_tour_guide(state: &AppState, id: Uuid) -> AppResult<tour_guide_profile::Model> {
    tour_guide_profile::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tour guide not found".to_string()))
}

/// List tour guides
pub async fn list_tour_guides(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListingFilter>,
) -> AppResult<ApiResponse<Vec<tour_guide_profile::Model>>> {
    let guides = tour_guide_profile::Entity::find()
        .order_by_desc(tour_guide_profile::Column::Rating)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(filter.apply(guides, false)))
}

/// List tour guides currently taking bookings
pub async fn list_available_tour_guides(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ListingFilter>,
) -> AppResult<ApiResponse<Vec<tour_guide_profile::Model>>> {
    let guides = tour_guide_profile::Entity::find()
        .filter(tour_guide_profile::Column::IsAvailable.eq(true))
        .order_by_desc(tour_guide_profile::Column::Rating)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(filter.apply(guides, true)))
}

pub async fn get_tour_guide(
    State(state): State<AppState>,
    MaybeClaims(viewer): MaybeClaims,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<ListingDetail<tour_guide_profile::Model>>> {
    let guide = find_tour_guide(&state, id).await?;
    Ok(ApiResponse::ok(ListingDetail::new(guide, viewer.as_ref())))
}

/// The caller's own tour guide profile
pub async fn my_tour_guide_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<ApiResponse<tour_guide_profile::Model>> {
    ensure_can_create(&claims, ResourceKind::TourGuide)?;

    let profile = tour_guide_profile::Entity::find()
        .filter(tour_guide_profile::Column::UserId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("You have not created a tour guide profile".to_string()))?;

    Ok(ApiResponse::ok(profile))
}

pub async fn create_tour_guide_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<CreateTourGuideProfileRequest>,
) -> AppResult<ApiResponse<tour_guide_profile::Model>> {
    ensure_can_create(&claims, ResourceKind::TourGuide)?;

    let existing = tour_guide_profile::Entity::find()
        .filter(tour_guide_profile::Column::UserId.eq(claims.sub))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Tour guide profile already exists".to_string(),
        ));
    }

    let profile = tour_guide_profile::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(claims.sub),
        city: Set(payload.city),
        languages: Set(payload.languages),
        experience_years: Set(payload.experience_years.unwrap_or(0)),
        specialties: Set(payload.specialties),
        price_per_day: Set(payload.price_per_day),
        is_available: Set(payload.is_available.unwrap_or(true)),
        rating: Set(0.0),
        total_tours: Set(0),
        bio: Set(payload.bio),
        photo_url: Set(None),
        ..Default::default()
    };

    let result = profile
        .insert(&state.db)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Tour guide profile already exists"))?;
    tracing::info!(tour_guide_id = %result.id, user_id = %claims.sub, "Tour guide profile created");
    Ok(ApiResponse::created(result).with_message("Tour guide profile created"))
}

pub async fn update_tour_guide_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateTourGuideProfileRequest>,
) -> AppResult<ApiResponse<tour_guide_profile::Model>> {
    let profile = find_tour_guide(&state, id).await?;
    ensure_can_manage(&claims, ResourceKind::TourGuide, profile.user_id)?;

    let mut active: tour_guide_profile::ActiveModel = profile.into();

    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    if let Some(languages) = payload.languages {
        active.languages = Set(languages);
    }
    if let Some(years) = payload.experience_years {
        active.experience_years = Set(years);
    }
    if let Some(specialties) = payload.specialties {
        active.specialties = Set(specialties);
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
    Ok(ApiResponse::ok(result).with_message("Tour guide profile updated"))
}

pub async fn delete_tour_guide_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    let profile = find_tour_guide(&state, id).await?;
    ensure_can_manage(&claims, ResourceKind::TourGuide, profile.user_id)?;

    tour_guide_profile::Entity::delete_by_id(id).exec(&state.db).await?;
    tracing::info!(tour_guide_id = %id, "Tour guide profile deleted");

    Ok(ApiResponse::message("Tour guide profile deleted"))
}
