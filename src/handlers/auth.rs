use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::utils::jwt::{create_token, Claims};
use crate::utils::validation::not_blank;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: String,
    #[validate(custom = "not_blank", length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(custom = "not_blank", length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: Option<String>,
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl From<user::Model> for UserInfo {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
        }
    }
}

/// Register a customer account
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        name: Set(payload.name),
        role: Set(UserRole::Customer),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let token = issue_token(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Exchange email and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = payload.email.trim().to_lowercase();

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<UserInfo>> {
    Ok(Json(current_user(&state, &claims).await?.into()))
}

/// Change the caller's name or password. Role and email are not editable here.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> AppResult<Json<UserInfo>> {
    payload.validate()?;

    let mut active: user::ActiveModel = current_user(&state, &claims).await?.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(password) = payload.password {
        active.password_hash = Set(hash_password(&password)?);
    }

    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

async fn current_user(state: &AppState, claims: &Claims) -> AppResult<user::Model> {
    user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
}

/// Argon2id hash with a fresh salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn issue_token(state: &AppState, user: &user::Model) -> AppResult<String> {
    create_token(
        user.id,
        &user.email,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )
}
