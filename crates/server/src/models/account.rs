//! Credential record types.
//!
//! Two independent identity classes backed by two independent stores. The
//! types are deliberately separate - a `UserAccount` is never interchangeable
//! with an `AdminAccount`, even when an email happens to exist in both stores.

use chrono::{DateTime, Utc};
use serde::Serialize;

use clementine_core::{AdminId, Email, Role, UserId};

/// A storefront user credential record (domain type).
///
/// `password_hash` never leaves the store/service layer; API responses use
/// [`UserPublic`].
#[derive(Debug, Clone)]
pub struct UserAccount {
    /// Unique user ID, assigned at creation.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address, unique within the user store.
    pub email: Email,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Fixed role tag - always `Role::User` for records in this store.
    pub role: Role,
    /// Deactivated accounts fail authorization even with a valid token.
    pub active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A back-office admin credential record (domain type).
///
/// Admins are provisioned out-of-band (CLI) and never hard-deleted.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    /// Unique admin ID, assigned at creation.
    pub id: AdminId,
    /// Display name.
    pub name: String,
    /// Email address, unique within the admin store.
    pub email: Email,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Fixed role tag - always `Role::Admin` for records in this store.
    pub role: Role,
    /// Deactivated accounts fail authorization even with a valid token.
    pub active: bool,
    /// Stamped on each successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// User shape exposed in API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub active: bool,
}

impl From<&UserAccount> for UserPublic {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            role: account.role,
            active: account.active,
        }
    }
}

/// Admin shape exposed in API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct AdminPublic {
    pub id: AdminId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&AdminAccount> for AdminPublic {
    fn from(account: &AdminAccount) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            last_login: account.last_login,
        }
    }
}
