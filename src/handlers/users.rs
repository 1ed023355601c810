use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::response::ApiResponse;
use crate::utils::jwt::{create_token, Claims};
use crate::utils::password::{hash_password, verify_password};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be at least 6 characters"))]
    pub password: String,
    pub role: Option<UserRole>,
    #[validate(length(max = 32, message = "phone must be at most 32 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 32, message = "phone must be at most 32 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserInfo {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            phone: u.phone,
            created_at: u.created_at.with_timezone(&Utc),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn issue(state: &AppState, user: user::Model) -> AppResult<AuthResponse> {
    let token = create_token(
        user.id,
        &user.email,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// Register a traveler or business account
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let role = payload.role.unwrap_or(UserRole::Traveler);
    if role == UserRole::Admin {
        return Err(AppError::validation("role", "admin accounts cannot be registered"));
    }

    let email = normalize_email(&payload.email);

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role),
        phone: Set(payload.phone),
        ..Default::default()
    };

    // The pre-check loses to a concurrent registration; the unique index decides.
    let user = new_user
        .insert(&state.db)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Email already registered"))?;
    tracing::info!(user_id = %user.id, role = role.as_str(), "User registered");

    Ok(ApiResponse::created(issue(&state, user)?).with_message("Registration successful"))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    Ok(ApiResponse::ok(issue(&state, user)?).with_message("Login successful"))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<ApiResponse<UserInfo>> {
    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(user.into()))
}

/// Name and phone only; role is fixed at registration.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<ApiResponse<UserInfo>> {
    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user.into();

    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }

    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone).filter(|p| !p.trim().is_empty()));
    }

    let updated = active.update(&state.db).await?;
    Ok(ApiResponse::ok(updated.into()).with_message("Profile updated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, DbErr, MockDatabase};

    use crate::test_support::{ran, state_with, statements};

    fn signup(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Rahim".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            role: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_register_with_taken_email_conflicts() {
        let taken = user::Model {
            id: Uuid::new_v4(),
            name: "Rahim".to_string(),
            email: "rahim@example.com".to_string(),
            password_hash: "x".to_string(),
            role: UserRole::Traveler,
            phone: None,
            created_at: Utc::now().into(),
        };
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([[taken]])
                .into_connection(),
        );

        let err = register(State(state.clone()), ValidatedJson(signup(" Rahim@Example.com ")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Email already registered"));
        assert!(ran(&statements(state), "'rahim@example.com'"));
    }

    #[tokio::test]
    async fn test_register_insert_failure_is_not_a_conflict() {
        let state = state_with(
            MockDatabase::new(DbBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_errors([DbErr::Custom("connection reset".to_string())])
                .into_connection(),
        );

        let err = register(State(state), ValidatedJson(signup("new@example.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_register_rules() {
        let ok = RegisterRequest {
            name: "Rahim".to_string(),
            email: "rahim@example.com".to_string(),
            password: "secret1".to_string(),
            role: Some(UserRole::Driver),
            phone: None,
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            name: String::new(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
            role: None,
            phone: None,
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_role_parses_snake_case() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "Karim",
            "email": "karim@example.com",
            "password": "secret1",
            "role": "hotel_owner"
        }))
        .unwrap();
        assert_eq!(req.role, Some(UserRole::HotelOwner));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Rahim@Example.COM "), "rahim@example.com");
    }
}
