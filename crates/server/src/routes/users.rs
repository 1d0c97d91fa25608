//! Storefront user routes.
//!
//! Mounted under `/api/users`. Registration and login are public; the
//! profile routes require a resolved user identity.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::UserPublic;
use crate::services::auth::ProfileChange;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile).put(update_profile))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    phone: Option<String>,
    password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let (user, token) = state
        .auth()
        .register_user(&req.name, &req.email, req.phone, &req.password)
        .await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": UserPublic::from(&user),
    })))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    // The storefront contract reports bad credentials as 400, unlike the
    // admin surface.
    let (user, token) = state
        .auth()
        .login_user(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            crate::services::auth::AuthError::InvalidCredentials => AppError::InvalidLogin,
            other => other.into(),
        })?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": UserPublic::from(&user),
    })))
}

async fn profile(RequireUser(user): RequireUser) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": UserPublic::from(&user),
    }))
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    current_password: Option<String>,
    new_password: Option<String>,
}

async fn update_profile(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let updated = state
        .auth()
        .update_user_profile(
            user.id,
            ProfileChange {
                name: req.name,
                email: req.email,
                phone: req.phone,
                current_password: req.current_password,
                new_password: req.new_password,
            },
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "user": UserPublic::from(&updated),
    })))
}
