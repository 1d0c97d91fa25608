//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication and authorization.
///
/// Every failure is terminal at the point of detection and carries a stable
/// machine-readable code (see [`AuthError::code`]) so clients can distinguish
/// "re-login" failures from "insufficient privilege" ones. Two distinct
/// failures are never collapsed into one kind.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token present on a protected request.
    #[error("no authentication token, access denied")]
    MissingToken,

    /// Bad signature, malformed payload, or a claim that contradicts the
    /// resolved record.
    #[error("token is not valid")]
    InvalidToken,

    /// Token `exp` has elapsed. Remediation: re-login.
    #[error("token has expired")]
    ExpiredToken,

    /// Token verified but the subject no longer exists in its store.
    #[error("identity not found")]
    IdentityNotFound,

    /// Valid identity whose account has been deactivated.
    #[error("account is deactivated")]
    InactiveAccount,

    /// Valid identity, wrong role. Not remediable by re-login.
    #[error("Access denied. Admin only.")]
    Forbidden,

    /// Wrong email/password pair (never disclosed which).
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email already registered in this store.
    #[error("user already exists")]
    DuplicateEmail,

    /// Password failed validation.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] clementine_core::EmailError),

    /// Supplied current password does not match (profile update path).
    #[error("Current password is incorrect")]
    CurrentPasswordMismatch,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be signed.
    #[error("token creation error")]
    TokenCreation,
}

impl AuthError {
    /// Stable, machine-distinguishable reason string for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::InvalidToken => "invalid_token",
            Self::ExpiredToken => "expired_token",
            Self::IdentityNotFound => "identity_not_found",
            Self::InactiveAccount => "account_inactive",
            Self::Forbidden => "forbidden",
            Self::InvalidCredentials => "invalid_credentials",
            Self::DuplicateEmail => "duplicate_email",
            Self::WeakPassword(_) => "weak_password",
            Self::InvalidEmail(_) => "invalid_email",
            Self::CurrentPasswordMismatch => "current_password_mismatch",
            Self::Repository(_) | Self::PasswordHash | Self::TokenCreation => "server_error",
        }
    }
}
