//! In-memory credential stores.
//!
//! Used by unit and integration tests so the auth path can be exercised
//! without a running `PostgreSQL` instance. Semantics mirror the Pg stores:
//! per-store email uniqueness, sequential IDs, no cross-store fallthrough.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use clementine_core::{AdminId, Email, Role, UserId};

use super::{AdminStore, NewAdmin, NewUser, ProfileUpdate, RepositoryError, UserStore};
use crate::models::{AdminAccount, UserAccount};

/// In-memory user store.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Vec<UserAccount>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UserAccount>> {
        // Lock poisoning can only happen if a test already panicked.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Overwrite a record in place, bypassing the normal mutation paths.
    ///
    /// Lets tests manufacture states the API cannot produce (e.g. a record
    /// whose role tag disagrees with its store).
    pub fn put_raw(&self, account: UserAccount) {
        let mut accounts = self.lock();
        accounts.retain(|a| a.id != account.id);
        accounts.push(account);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.lock().iter().find(|a| &a.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.lock().iter().find(|a| a.id == id).cloned())
    }

    async fn create(&self, fields: NewUser) -> Result<UserAccount, RepositoryError> {
        let mut accounts = self.lock();
        if accounts.iter().any(|a| a.email == fields.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let next_id = accounts.iter().map(|a| a.id.as_i32()).max().unwrap_or(0) + 1;
        let now = Utc::now();
        let account = UserAccount {
            id: UserId::new(next_id),
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            password_hash: fields.password_hash,
            role: Role::User,
            active: true,
            created_at: now,
            updated_at: now,
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<UserAccount, RepositoryError> {
        let mut accounts = self.lock();

        // Email stays unique within this store on the update path too.
        if let Some(email) = &update.email
            && accounts.iter().any(|a| a.id != id && &a.email == email)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(email) = update.email {
            account.email = email;
        }
        if let Some(phone) = update.phone {
            account.phone = Some(phone);
        }
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), RepositoryError> {
        let mut accounts = self.lock();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        account.password_hash = hash.to_owned();
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<UserAccount, RepositoryError> {
        let mut accounts = self.lock();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        account.active = active;
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut accounts = self.lock();
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        Ok(accounts.len() < before)
    }

    async fn list(&self) -> Result<Vec<UserAccount>, RepositoryError> {
        let mut accounts = self.lock().clone();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }
}

/// In-memory admin store.
#[derive(Default)]
pub struct MemoryAdminStore {
    inner: Mutex<Vec<AdminAccount>>,
}

impl MemoryAdminStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AdminAccount>> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl AdminStore for MemoryAdminStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AdminAccount>, RepositoryError> {
        Ok(self.lock().iter().find(|a| &a.email == email).cloned())
    }

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError> {
        Ok(self.lock().iter().find(|a| a.id == id).cloned())
    }

    async fn create(&self, fields: NewAdmin) -> Result<AdminAccount, RepositoryError> {
        let mut accounts = self.lock();
        if accounts.iter().any(|a| a.email == fields.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let next_id = accounts.iter().map(|a| a.id.as_i32()).max().unwrap_or(0) + 1;
        let account = AdminAccount {
            id: AdminId::new(next_id),
            name: fields.name,
            email: fields.email,
            password_hash: fields.password_hash,
            role: Role::Admin,
            active: true,
            last_login: None,
            created_at: Utc::now(),
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn update_profile(
        &self,
        id: AdminId,
        update: ProfileUpdate,
    ) -> Result<AdminAccount, RepositoryError> {
        let mut accounts = self.lock();

        if let Some(email) = &update.email
            && accounts.iter().any(|a| a.id != id && &a.email == email)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(email) = update.email {
            account.email = email;
        }
        Ok(account.clone())
    }

    async fn update_password_hash(&self, id: AdminId, hash: &str) -> Result<(), RepositoryError> {
        let mut accounts = self.lock();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        account.password_hash = hash.to_owned();
        Ok(())
    }

    async fn stamp_last_login(&self, id: AdminId) -> Result<(), RepositoryError> {
        let mut accounts = self.lock();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        account.last_login = Some(Utc::now());
        Ok(())
    }
}
