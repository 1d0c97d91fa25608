//! Client error types.

use thiserror::Error;

/// Errors surfaced by the API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the token (401). The matching session slot has
    /// been cleared; `login_surface` is where the caller should re-login.
    #[error("unauthorized: re-login at {login_surface}")]
    Unauthorized { login_surface: &'static str },

    /// The server refused the operation for this identity (403). The held
    /// token is still valid; re-login would not help.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// Any other non-success response.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),
}
