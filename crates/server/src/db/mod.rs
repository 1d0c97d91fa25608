//! Persistence layer: store contracts and `PostgreSQL` implementations.
//!
//! The auth path consumes credential records through the [`UserStore`] and
//! [`AdminStore`] contracts only. The two stores are independent collections:
//! an email may exist in both, naming two different identities, and a lookup
//! against one store never falls through to the other.
//!
//! # Tables
//!
//! - `user_account` - storefront user credentials
//! - `admin_account` - back-office admin credentials
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p clementine-cli -- migrate
//! ```

pub mod admins;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use clementine_core::{AdminId, Email, UserId};

use crate::models::{AdminAccount, UserAccount};

pub use admins::PgAdminStore;
pub use users::PgUserStore;

/// Errors surfaced by the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violated (duplicate email within a store).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Row exists but holds data the domain types reject.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The targeted record does not exist.
    #[error("not found")]
    NotFound,
}

/// Fields required to create a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub password_hash: String,
}

/// Fields required to create an admin account.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
}

/// Profile fields a user may change. `None` leaves the field untouched.
/// The role tag is deliberately absent - no path mutates it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
}

/// Contract for the user credential store.
///
/// Every operation is a single atomic query; the store does no in-process
/// locking. Password verification happens in the service layer - the store
/// only holds hashes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by email. `Ok(None)` when absent.
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserAccount>, RepositoryError>;

    /// Look up a user by ID. `Ok(None)` when absent.
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError>;

    /// Create a new user.
    ///
    /// Fails with `RepositoryError::Conflict` if the email already exists in
    /// this store.
    async fn create(&self, fields: NewUser) -> Result<UserAccount, RepositoryError>;

    /// Apply a profile update and return the updated record.
    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<UserAccount, RepositoryError>;

    /// Replace the stored password hash.
    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), RepositoryError>;

    /// Activate or deactivate the account, returning the updated record.
    async fn set_active(&self, id: UserId, active: bool) -> Result<UserAccount, RepositoryError>;

    /// Hard-delete a user. Returns `true` if a record was removed.
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;

    /// List all users, newest first (admin back-office view).
    async fn list(&self) -> Result<Vec<UserAccount>, RepositoryError>;
}

/// Contract for the admin credential store.
///
/// Admins are provisioned out-of-band and never hard-deleted, so there is no
/// `delete` operation here.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Look up an admin by email. `Ok(None)` when absent.
    async fn find_by_email(&self, email: &Email) -> Result<Option<AdminAccount>, RepositoryError>;

    /// Look up an admin by ID. `Ok(None)` when absent.
    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError>;

    /// Create a new admin (CLI provisioning path).
    ///
    /// Fails with `RepositoryError::Conflict` if the email already exists in
    /// this store.
    async fn create(&self, fields: NewAdmin) -> Result<AdminAccount, RepositoryError>;

    /// Apply a profile update and return the updated record.
    async fn update_profile(
        &self,
        id: AdminId,
        update: ProfileUpdate,
    ) -> Result<AdminAccount, RepositoryError>;

    /// Replace the stored password hash.
    async fn update_password_hash(&self, id: AdminId, hash: &str) -> Result<(), RepositoryError>;

    /// Stamp `last_login` with the current time.
    async fn stamp_last_login(&self, id: AdminId) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
