use axum::{
    extract::{Path, State},
    Extension,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus, BookingType};
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::extract::QueryParams;
use crate::handlers::bookings::{release_rooms, to_responses, BookingListQuery, BookingResponse};
use crate::handlers::users::UserInfo;
use crate::response::ApiResponse;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<UserRole>,
}

/// List all users (admin)
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<UserListQuery>,
) -> AppResult<ApiResponse<Vec<UserInfo>>> {
    let mut select = user::Entity::find().order_by_desc(user::Column::CreatedAt);
    if let Some(role) = query.role {
        select = select.filter(user::Column::Role.eq(role));
    }

    let users = select.all(&state.db).await?;
    Ok(ApiResponse::ok(users.into_iter().map(UserInfo::from).collect()))
}

/// Delete any user account (admin)
///
/// Profiles, listings, bookings and documents go with the account. Rooms held
/// by the user's live hotel bookings are released first.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    if user_id == claims.sub {
        return Err(AppError::BadRequest(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    let txn = state.db.begin().await?;

    let user = user::Entity::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let held = booking::Entity::find()
        .filter(booking::Column::TravelerId.eq(user_id))
        .filter(booking::Column::BookingType.eq(BookingType::Hotel))
        .filter(booking::Column::Status.is_in([BookingStatus::Pending, BookingStatus::Accepted]))
        .all(&txn)
        .await?;

    for b in held {
        if let Some(hotel_id) = b.hotel_id {
            release_rooms(&txn, hotel_id, b.rooms).await?;
        }
    }

    user::Entity::delete_by_id(user_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user_id,
        role = user.role.as_str(),
        admin_id = %claims.sub,
        "User deleted"
    );

    Ok(ApiResponse::message("User deleted"))
}

/// List every booking in the system (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<BookingListQuery>,
) -> AppResult<ApiResponse<Vec<BookingResponse>>> {
    let mut select = booking::Entity::find().order_by_desc(booking::Column::CreatedAt);
    if let Some(status) = query.status {
        select = select.filter(booking::Column::Status.eq(status));
    }

    let bookings = select.all(&state.db).await?;
    Ok(ApiResponse::ok(to_responses(bookings)?))
}
