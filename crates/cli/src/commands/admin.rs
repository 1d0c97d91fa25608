//! Admin account provisioning.
//!
//! There is no registration endpoint for admins; this command is the only
//! path that creates admin accounts.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use sqlx::PgPool;
use thiserror::Error;

use clementine_core::Email;
use clementine_server::db::{AdminStore as _, NewAdmin, PgAdminStore, RepositoryError};
use clementine_server::services::auth::{AuthError, hash_password, validate_password};

/// Errors that can occur during admin provisioning.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password failed validation or could not be hashed.
    #[error("Password error: {0}")]
    Password(String),

    /// Admin already exists.
    #[error("Admin already exists with email: {0}")]
    AdminExists(String),

    /// Any other repository failure.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created admin.
pub async fn create(email: &str, name: &str, password: &str) -> Result<i32, AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;

    // Admin passwords meet the same requirements as user passwords.
    validate_password(password).map_err(|e| match e {
        AuthError::WeakPassword(msg) => AdminError::Password(msg),
        _ => AdminError::Password("validation failed".to_owned()),
    })?;
    let password_hash =
        hash_password(password).map_err(|_| AdminError::Password("hashing failed".to_owned()))?;

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| AdminError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Creating admin account: {}", email);

    let store = PgAdminStore::new(pool);
    let admin = store
        .create(NewAdmin {
            name: name.to_owned(),
            email: email.clone(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::AdminExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin created successfully! ID: {}, Email: {}",
        admin.id,
        admin.email
    );

    Ok(admin.id.as_i32())
}

/// Row shape for the listing query.
#[derive(sqlx::FromRow)]
struct AdminListRow {
    id: i32,
    name: String,
    email: String,
    active: bool,
    last_login: Option<chrono::DateTime<chrono::Utc>>,
}

/// List all admin accounts.
pub async fn list() -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| AdminError::MissingEnvVar("DATABASE_URL"))?;

    let pool = PgPool::connect(&database_url).await?;

    let admins = sqlx::query_as::<_, AdminListRow>(
        "SELECT id, name, email, active, last_login FROM admin_account ORDER BY id",
    )
    .fetch_all(&pool)
    .await?;

    tracing::info!("{} admin account(s)", admins.len());
    for admin in admins {
        tracing::info!(
            "  [{}] {} <{}> active={} last_login={}",
            admin.id,
            admin.name,
            admin.email,
            admin.active,
            admin
                .last_login
                .map_or_else(|| "never".to_owned(), |t| t.to_rfc3339()),
        );
    }

    Ok(())
}
