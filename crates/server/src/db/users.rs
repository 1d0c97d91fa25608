//! `PostgreSQL` implementation of the user credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clementine_core::{Email, Role, UserId};

use super::{NewUser, ProfileUpdate, RepositoryError, UserStore};
use crate::models::UserAccount;

/// User store backed by the `user_account` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw row shape; parsed into the domain type before leaving this module.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row.role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            phone: row.phone,
            password_hash: row.password_hash,
            role,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, name, email, phone, password_hash, role, active, created_at, updated_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM user_account WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserAccount::try_from).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM user_account WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserAccount::try_from).transpose()
    }

    async fn create(&self, fields: NewUser) -> Result<UserAccount, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO user_account (name, email, phone, password_hash, role)
             VALUES ($1, $2, $3, $4, 'user')
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&fields.name)
        .bind(fields.email.as_str())
        .bind(&fields.phone)
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

        UserAccount::try_from(row)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<UserAccount, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE user_account
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 phone = COALESCE($4, phone),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(update.name)
        .bind(update.email.map(Email::into_inner))
        .bind(update.phone)
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

        UserAccount::try_from(row)
    }

    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE user_account SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<UserAccount, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE user_account SET active = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        UserAccount::try_from(row)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_account WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<UserAccount>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM user_account ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserAccount::try_from).collect()
    }
}
