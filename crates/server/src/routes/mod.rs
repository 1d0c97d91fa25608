//! HTTP route handlers.

pub mod admin;
pub mod users;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .nest("/api/users", users::router())
        .nest("/api/admin", admin::router())
        .with_state(state)
}

/// Liveness probe.
async fn health() -> &'static str {
    "OK"
}

/// Readiness probe. Verifies database connectivity when a pool is wired.
async fn ready(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<&'static str, crate::error::AppError> {
    if let Some(pool) = state.pool() {
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| crate::error::AppError::Internal(format!("database not ready: {e}")))?;
    }
    Ok("READY")
}
