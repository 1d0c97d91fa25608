//! Application error handling.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Top-level application error.
///
/// Every handler failure funnels through here so status codes and response
/// shape stay consistent across routes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Storefront login failure. The public API contract reports this as a
    /// 400, unlike every other identity failure.
    #[error("Invalid credentials")]
    InvalidLogin,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(auth) => match auth {
                // Identity failures: the caller should (re-)authenticate.
                AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::ExpiredToken
                | AuthError::IdentityNotFound
                | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                // Authorization failures: re-login will not help.
                AuthError::Forbidden | AuthError::InactiveAccount => StatusCode::FORBIDDEN,
                AuthError::DuplicateEmail
                | AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::CurrentPasswordMismatch => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenCreation => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) | Self::InvalidLogin => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Auth(auth) => auth.code(),
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => "not_found",
            Self::Database(_) | Self::Internal(_) => "server_error",
            Self::BadRequest(_) => "bad_request",
            Self::InvalidLogin => "invalid_credentials",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            sentry::capture_message(&self.to_string(), sentry::Level::Error);
        }

        // Internal details never leak to the client.
        let message = if status.is_server_error() {
            "Server error".to_owned()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "success": false,
            "code": self.code(),
            "message": message,
        }));

        (status, body).into_response()
    }
}
