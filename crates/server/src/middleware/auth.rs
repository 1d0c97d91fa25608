//! Authentication extractors.
//!
//! `RequireUser` and `RequireAdmin` run the full resolve-then-gate sequence
//! before a handler body executes. Handlers never see an unresolved or
//! wrong-role caller.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use clementine_core::Role;

use crate::error::AppError;
use crate::models::{AdminAccount, UserAccount};
use crate::services::auth::Identity;
use crate::state::AppState;

/// Extract the bearer token from the request, if any.
///
/// Accepts both `Authorization: Bearer <token>` and the bare `x-auth-token`
/// header; the former wins when both are present.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let from_authorization = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    from_authorization.or_else(|| {
        parts
            .headers
            .get("x-auth-token")
            .and_then(|v| v.to_str().ok())
    })
}

/// Requires a resolved storefront user identity.
pub struct RequireUser(pub UserAccount);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = state.auth().resolve(bearer_token(parts)).await?;
        identity.require_role(Role::User)?;

        match identity {
            Identity::User(user) => Ok(Self(user)),
            Identity::Admin(_) => Err(crate::services::auth::AuthError::Forbidden.into()),
        }
    }
}

/// Requires a resolved admin identity.
pub struct RequireAdmin(pub AdminAccount);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = state.auth().resolve(bearer_token(parts)).await?;
        identity.require_role(Role::Admin)?;

        match identity {
            Identity::Admin(admin) => Ok(Self(admin)),
            Identity::User(_) => Err(crate::services::auth::AuthError::Forbidden.into()),
        }
    }
}
