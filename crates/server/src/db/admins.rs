//! `PostgreSQL` implementation of the admin credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clementine_core::{AdminId, Email, Role};

use super::{AdminStore, NewAdmin, ProfileUpdate, RepositoryError};
use crate::models::AdminAccount;

/// Admin store backed by the `admin_account` table.
#[derive(Clone)]
pub struct PgAdminStore {
    pool: PgPool,
}

impl PgAdminStore {
    /// Create a new store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: i32,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    active: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for AdminAccount {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row.role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: AdminId::new(row.id),
            name: row.name,
            email,
            password_hash: row.password_hash,
            role,
            active: row.active,
            last_login: row.last_login,
            created_at: row.created_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, name, email, password_hash, role, active, last_login, created_at";

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AdminAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM admin_account WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AdminAccount::try_from).transpose()
    }

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM admin_account WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AdminAccount::try_from).transpose()
    }

    async fn create(&self, fields: NewAdmin) -> Result<AdminAccount, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "INSERT INTO admin_account (name, email, password_hash, role)
             VALUES ($1, $2, $3, 'admin')
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&fields.name)
        .bind(fields.email.as_str())
        .bind(&fields.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        AdminAccount::try_from(row)
    }

    async fn update_profile(
        &self,
        id: AdminId,
        update: ProfileUpdate,
    ) -> Result<AdminAccount, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "UPDATE admin_account
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email)
             WHERE id = $1
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(update.name)
        .bind(update.email.map(Email::into_inner))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            // Email uniqueness holds on the update path too.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?
        .ok_or(RepositoryError::NotFound)?;

        AdminAccount::try_from(row)
    }

    async fn update_password_hash(&self, id: AdminId, hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE admin_account SET password_hash = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn stamp_last_login(&self, id: AdminId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE admin_account SET last_login = NOW() WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
