use axum::{
    extract::{Multipart, State},
    Extension,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catalog::{ensure_can_create, ensure_can_manage, ResourceKind};
use crate::entities::document::{self, DocumentKind, DocumentStatus};
use crate::entities::{driver_profile, hotel, tour_guide_profile, vehicle};
use crate::error::{AppError, AppResult};
use crate::extract::QueryParams;
use crate::response::ApiResponse;
use crate::storage::{validate_image, StoredFile, UploadCategory};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
}

impl From<StoredFile> for UploadResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            url: file.url,
            filename: file.filename,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PhotoTarget {
    pub id: Option<Uuid>,
}

/// A validated image ready to be written.
struct ImageUpload {
    ext: &'static str,
    bytes: Vec<u8>,
}

/// Take the first file part of the form and check it is an acceptable image.
async fn read_image(multipart: &mut Multipart, max_bytes: usize) -> AppResult<ImageUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let ext = validate_image(
            content_type.as_deref(),
            Some(&file_name),
            bytes.len(),
            max_bytes,
        )?;
        return Ok(ImageUpload {
            ext,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::validation("file", "No file uploaded"))
}

async fn store(
    state: &AppState,
    category: UploadCategory,
    image: &ImageUpload,
) -> AppResult<StoredFile> {
    state.storage.save(category, image.ext, &image.bytes).await
}

/// Upload a driver photo, attached to the caller's profile when one exists
pub async fn upload_driver_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadResponse>> {
    let image = read_image(&mut multipart, state.config.max_upload_bytes).await?;
    let stored = store(&state, UploadCategory::DriverPhotos, &image).await?;

    let profile = driver_profile::Entity::find()
        .filter(driver_profile::Column::UserId.eq(claims.sub))
        .one(&state.db)
        .await;

    let attached = match profile {
        Ok(Some(profile)) => {
            let mut active: driver_profile::ActiveModel = profile.into();
            active.photo_url = Set(Some(stored.url.clone()));
            active.update(&state.db).await.map(|_| ())
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    };
    if let Err(e) = attached {
        state.storage.remove(&stored).await;
        return Err(e.into());
    }

    Ok(ApiResponse::ok(stored.into()).with_message("Photo uploaded"))
}

/// Upload a tour guide photo, attached to the caller's profile when one exists
pub async fn upload_tour_guide_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadResponse>> {
    let image = read_image(&mut multipart, state.config.max_upload_bytes).await?;
    let stored = store(&state, UploadCategory::TourGuidePhotos, &image).await?;

    let profile = tour_guide_profile::Entity::find()
        .filter(tour_guide_profile::Column::UserId.eq(claims.sub))
        .one(&state.db)
        .await;

    let attached = match profile {
        Ok(Some(profile)) => {
            let mut active: tour_guide_profile::ActiveModel = profile.into();
            active.photo_url = Set(Some(stored.url.clone()));
            active.update(&state.db).await.map(|_| ())
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    };
    if let Err(e) = attached {
        state.storage.remove(&stored).await;
        return Err(e.into());
    }

    Ok(ApiResponse::ok(stored.into()).with_message("Photo uploaded"))
}

/// Upload a hotel photo. With `?id=` it replaces that hotel's photo.
pub async fn upload_hotel_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    QueryParams(target): QueryParams<PhotoTarget>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadResponse>> {
    ensure_can_create(&claims, ResourceKind::Hotel)?;
    let image = read_image(&mut multipart, state.config.max_upload_bytes).await?;

    let hotel = match target.id {
        Some(id) => {
            let hotel = hotel::Entity::find_by_id(id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Hotel not found".to_string()))?;
            ensure_can_manage(&claims, ResourceKind::Hotel, hotel.owner_id)?;
            Some(hotel)
        }
        None => None,
    };

    let stored = store(&state, UploadCategory::HotelPhotos, &image).await?;

    if let Some(hotel) = hotel {
        let mut active: hotel::ActiveModel = hotel.into();
        active.photo_url = Set(Some(stored.url.clone()));
        if let Err(e) = active.update(&state.db).await {
            state.storage.remove(&stored).await;
            return Err(e.into());
        }
    }

    Ok(ApiResponse::ok(stored.into()).with_message("Photo uploaded"))
}

/// Upload a vehicle photo. With `?id=` it replaces that vehicle's photo.
pub async fn upload_vehicle_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    QueryParams(target): QueryParams<PhotoTarget>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadResponse>> {
    ensure_can_create(&claims, ResourceKind::Vehicle)?;
    let image = read_image(&mut multipart, state.config.max_upload_bytes).await?;

    let vehicle = match target.id {
        Some(id) => {
            let vehicle = vehicle::Entity::find_by_id(id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;
            ensure_can_manage(&claims, ResourceKind::Vehicle, vehicle.owner_id)?;
            Some(vehicle)
        }
        None => None,
    };

    let stored = store(&state, UploadCategory::VehiclePhotos, &image).await?;

    if let Some(vehicle) = vehicle {
        let mut active: vehicle::ActiveModel = vehicle.into();
        active.photo_url = Set(Some(stored.url.clone()));
        if let Err(e) = active.update(&state.db).await {
            state.storage.remove(&stored).await;
            return Err(e.into());
        }
    }

    Ok(ApiResponse::ok(stored.into()).with_message("Photo uploaded"))
}

/// Store a verification document and queue it for review.
async fn submit_document(
    state: &AppState,
    claims: &Claims,
    kind: DocumentKind,
    category: UploadCategory,
    multipart: &mut Multipart,
) -> AppResult<document::Model> {
    let image = read_image(multipart, state.config.max_upload_bytes).await?;
    let stored = store(state, category, &image).await?;

    let id = Uuid::new_v4();
    let new_document = document::ActiveModel {
        id: Set(id),
        user_id: Set(claims.sub),
        kind: Set(kind),
        file_path: Set(stored.path.to_string_lossy().into_owned()),
        file_url: Set(state.storage.document_url(id)),
        status: Set(DocumentStatus::Pending),
        ..Default::default()
    };

    match new_document.insert(&state.db).await {
        Ok(document) => {
            tracing::info!(
                document_id = %document.id,
                user_id = %claims.sub,
                kind = ?kind,
                "Document submitted for review"
            );
            Ok(document)
        }
        Err(e) => {
            state.storage.remove(&stored).await;
            Err(e.into())
        }
    }
}

/// Upload a driving license (drivers only)
pub async fn upload_license(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<document::Model>> {
    let document = submit_document(
        &state,
        &claims,
        DocumentKind::DrivingLicense,
        UploadCategory::Licenses,
        &mut multipart,
    )
    .await?;

    Ok(ApiResponse::created(document).with_message("License uploaded, pending review"))
}

/// Upload a national ID card
pub async fn upload_nid(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<document::Model>> {
    let document = submit_document(
        &state,
        &claims,
        DocumentKind::NidCard,
        UploadCategory::NidCards,
        &mut multipart,
    )
    .await?;

    Ok(ApiResponse::created(document).with_message("NID card uploaded, pending review"))
}
