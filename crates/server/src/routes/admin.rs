//! Admin back-office routes.
//!
//! Mounted under `/api/admin`. Login is public; everything else requires a
//! resolved admin identity. User management operates on the user store only,
//! so an admin record can never be deleted or deactivated through these
//! routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use clementine_core::UserId;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{AdminPublic, UserPublic};
use crate::services::auth::ProfileChange;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/profile", get(profile).put(update_profile))
        .route("/users", get(list_users))
        .route(
            "/users/{id}",
            axum::routing::delete(delete_user),
        )
        .route("/users/{id}/status", axum::routing::patch(set_user_status))
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
    let (admin, token) = state.auth().login_admin(&req.email, &req.password).await?;

    tracing::info!(admin_id = %admin.id, "admin logged in");

    Ok(Json(json!({
        "success": true,
        "token": token,
        "admin": AdminPublic::from(&admin),
    })))
}

async fn profile(RequireAdmin(admin): RequireAdmin) -> Json<Value> {
    Json(json!({
        "success": true,
        "admin": AdminPublic::from(&admin),
    }))
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    name: Option<String>,
    email: Option<String>,
    current_password: Option<String>,
    new_password: Option<String>,
}

async fn update_profile(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let updated = state
        .auth()
        .update_admin_profile(
            admin.id,
            ProfileChange {
                name: req.name,
                email: req.email,
                phone: None,
                current_password: req.current_password,
                new_password: req.new_password,
            },
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "admin": AdminPublic::from(&updated),
    })))
}

async fn list_users(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let users = state.auth().user_store().list().await?;
    let users: Vec<UserPublic> = users.iter().map(UserPublic::from).collect();

    Ok(Json(json!({
        "success": true,
        "users": users,
    })))
}

async fn delete_user(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.auth().user_store().delete(UserId::new(id)).await?;
    if !deleted {
        return Err(AppError::NotFound("user not found".to_owned()));
    }

    tracing::info!(user_id = id, "user deleted");

    Ok(Json(json!({
        "success": true,
        "message": "User deleted",
    })))
}

#[derive(Debug, Deserialize)]
struct SetStatusRequest {
    active: bool,
}

async fn set_user_status(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .auth()
        .user_store()
        .set_active(UserId::new(id), req.active)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("user not found".to_owned()),
            other => AppError::Database(other),
        })?;

    tracing::info!(user_id = id, active = req.active, "user status changed");

    Ok(Json(json!({
        "success": true,
        "user": UserPublic::from(&user),
    })))
}
