//! Authentication service.
//!
//! Credential verification, token issuance, and the single identity-resolve
//! checkpoint every protected request passes through.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, TokenService};

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use clementine_core::{AdminId, Email, Role, UserId};

use crate::db::{AdminStore, NewUser, ProfileUpdate, UserStore};
use crate::models::{AdminAccount, UserAccount};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// A resolved caller identity.
///
/// Produced only by [`AuthService::resolve`]; this is the single path by
/// which handlers learn who is calling.
#[derive(Debug, Clone)]
pub enum Identity {
    User(UserAccount),
    Admin(AdminAccount),
}

impl Identity {
    /// The role of the resolved record (not the token claim).
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::User(_) => Role::User,
            Self::Admin(_) => Role::Admin,
        }
    }

    /// Authorization gate: permit continuation only for the required role.
    ///
    /// Composes strictly after resolution - an unresolved identity never
    /// reaches this check.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` when the roles differ.
    pub const fn require_role(&self, required: Role) -> Result<(), AuthError> {
        // Plain equality; Forbidden is deliberately distinct from every
        // 401-class failure so clients can tell "re-login" from
        // "insufficient privilege".
        match (self.role(), required) {
            (Role::User, Role::User) | (Role::Admin, Role::Admin) => Ok(()),
            _ => Err(AuthError::Forbidden),
        }
    }
}

/// Fields accepted by the profile-update endpoints.
///
/// A password change requires the correct current password and triggers a
/// re-hash before persisting. There is no role field here or anywhere else
/// in the update path.
#[derive(Debug, Clone, Default)]
pub struct ProfileChange {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Authentication service over the two credential stores.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    admins: Arc<dyn AdminStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        admins: Arc<dyn AdminStore>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            admins,
            tokens: Arc::new(tokens),
        }
    }

    /// The user credential store (admin back-office handlers use this).
    #[must_use]
    pub fn user_store(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    // =========================================================================
    // Registration and Login
    // =========================================================================

    /// Register a new storefront user and issue their first token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword`, or
    /// `AuthError::DuplicateEmail` on validation failure.
    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        phone: Option<String>,
        password: &str,
    ) -> Result<(UserAccount, String), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(NewUser {
                name: name.to_owned(),
                email,
                phone,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::Conflict(_) => AuthError::DuplicateEmail,
                other => AuthError::Repository(other),
            })?;

        let token = self.tokens.issue(user.id.as_i32(), Role::User)?;
        Ok((user, token))
    }

    /// Login with email and password against the user store.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on an unknown email or a
    /// wrong password - never disclosing which.
    pub async fn login_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserAccount, String), AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        let token = self.tokens.issue(user.id.as_i32(), Role::User)?;
        Ok((user, token))
    }

    /// Login with email and password against the admin store.
    ///
    /// Stamps `last_login` on success.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on mismatch.
    pub async fn login_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(AdminAccount, String), AuthError> {
        let email = Email::parse(email)?;
        let admin = self
            .admins
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &admin.password_hash)?;

        self.admins.stamp_last_login(admin.id).await?;

        let token = self.tokens.issue(admin.id.as_i32(), Role::Admin)?;
        Ok((admin, token))
    }

    // =========================================================================
    // Identity Resolution
    // =========================================================================

    /// Resolve a bearer token to exactly one identity.
    ///
    /// This is the single checkpoint for every protected endpoint. Read-only
    /// and idempotent: resolving the same token twice within its lifetime
    /// yields equivalent identities with no side effects.
    ///
    /// The embedded role selects which store to consult; the resolved
    /// record's own role must then match the claim, so a forged or stale
    /// claim can never select the wrong trust domain.
    ///
    /// # Errors
    ///
    /// - `AuthError::MissingToken` - no token supplied
    /// - `AuthError::InvalidToken` - bad signature/shape, or claim/record
    ///   role mismatch
    /// - `AuthError::ExpiredToken` - `exp` elapsed
    /// - `AuthError::IdentityNotFound` - subject deleted after issuance
    /// - `AuthError::InactiveAccount` - subject deactivated after issuance
    pub async fn resolve(&self, bearer: Option<&str>) -> Result<Identity, AuthError> {
        let raw = bearer.ok_or(AuthError::MissingToken)?;
        let claims = self.tokens.verify(raw)?;

        let subject: i32 = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        match claims.role {
            Role::Admin => {
                let admin = self
                    .admins
                    .find_by_id(AdminId::new(subject))
                    .await?
                    .ok_or(AuthError::IdentityNotFound)?;

                if admin.role != claims.role {
                    return Err(AuthError::InvalidToken);
                }
                if !admin.active {
                    return Err(AuthError::InactiveAccount);
                }
                Ok(Identity::Admin(admin))
            }
            Role::User => {
                let user = self
                    .users
                    .find_by_id(UserId::new(subject))
                    .await?
                    .ok_or(AuthError::IdentityNotFound)?;

                if user.role != claims.role {
                    return Err(AuthError::InvalidToken);
                }
                if !user.active {
                    return Err(AuthError::InactiveAccount);
                }
                Ok(Identity::User(user))
            }
        }
    }

    // =========================================================================
    // Profile Updates
    // =========================================================================

    /// Update a user's profile, optionally changing the password.
    ///
    /// The mutation path is read-modify-write: re-fetch, validate the current
    /// password, write. A lost-update race between two concurrent password
    /// changes for the same account is an accepted risk (see DESIGN.md).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CurrentPasswordMismatch` if a password change is
    /// requested with the wrong current password.
    pub async fn update_user_profile(
        &self,
        id: UserId,
        change: ProfileChange,
    ) -> Result<UserAccount, AuthError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if let (Some(current), Some(new)) = (&change.current_password, &change.new_password) {
            verify_password(current, &user.password_hash)
                .map_err(|_| AuthError::CurrentPasswordMismatch)?;
            validate_password(new)?;
            let hash = hash_password(new)?;
            self.users.update_password_hash(id, &hash).await?;
        }

        let email = change.email.as_deref().map(Email::parse).transpose()?;
        let updated = self
            .users
            .update_profile(
                id,
                ProfileUpdate {
                    name: change.name,
                    email,
                    phone: change.phone,
                },
            )
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::Conflict(_) => AuthError::DuplicateEmail,
                other => AuthError::Repository(other),
            })?;

        Ok(updated)
    }

    /// Update an admin's profile, optionally changing the password.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::update_user_profile`].
    pub async fn update_admin_profile(
        &self,
        id: AdminId,
        change: ProfileChange,
    ) -> Result<AdminAccount, AuthError> {
        let admin = self
            .admins
            .find_by_id(id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if let (Some(current), Some(new)) = (&change.current_password, &change.new_password) {
            verify_password(current, &admin.password_hash)
                .map_err(|_| AuthError::CurrentPasswordMismatch)?;
            validate_password(new)?;
            let hash = hash_password(new)?;
            self.admins.update_password_hash(id, &hash).await?;
        }

        let email = change.email.as_deref().map(Email::parse).transpose()?;
        let updated = self
            .admins
            .update_profile(
                id,
                ProfileUpdate {
                    name: change.name,
                    email,
                    phone: None,
                },
            )
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::Conflict(_) => AuthError::DuplicateEmail,
                other => AuthError::Repository(other),
            })?;

        Ok(updated)
    }
}

/// Validate password meets requirements.
///
/// Every path that accepts a new password runs through here, including
/// out-of-band admin provisioning.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` describing the failed requirement.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash (constant-time comparison).
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::Duration;
    use secrecy::SecretString;

    use crate::db::memory::{MemoryAdminStore, MemoryUserStore};
    use crate::db::NewAdmin;

    fn token_service(ttl: Duration) -> TokenService {
        TokenService::new(
            &SecretString::from("kX9#mP2$vQ7!nR4@wT6^zL8&yB3*cF5%"),
            &SecretString::from("aJ1!dG4$hK7#fM0@sN3^xP6&qV9*bW2%"),
            ttl,
        )
    }

    fn service() -> (AuthService, Arc<MemoryUserStore>, Arc<MemoryAdminStore>) {
        let users = Arc::new(MemoryUserStore::new());
        let admins = Arc::new(MemoryAdminStore::new());
        let auth = AuthService::new(
            users.clone(),
            admins.clone(),
            token_service(Duration::hours(24)),
        );
        (auth, users, admins)
    }

    async fn seed_admin(admins: &MemoryAdminStore) -> AdminAccount {
        admins
            .create(NewAdmin {
                name: "Ada".to_owned(),
                email: Email::parse("ops@example.com").unwrap(),
                password_hash: hash_password("hunter2hunter2").unwrap(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_then_resolve_returns_user_identity() {
        let (auth, _, _) = service();
        auth.register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();

        let (user, token) = auth.login_user("u@example.com", "secret123").await.unwrap();
        let identity = auth.resolve(Some(&token)).await.unwrap();

        assert_eq!(identity.role(), Role::User);
        match identity {
            Identity::User(resolved) => assert_eq!(resolved.id, user.id),
            Identity::Admin(_) => panic!("user token resolved to admin identity"),
        }
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (auth, _, _) = service();
        auth.register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();

        assert!(matches!(
            auth.login_user("u@example.com", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_within_store() {
        let (auth, _, _) = service();
        auth.register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();

        assert!(matches!(
            auth.register_user("U2", "u@example.com", None, "secret456")
                .await,
            Err(AuthError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn test_same_email_in_both_stores_are_distinct_identities() {
        let (auth, _, admins) = service();
        auth.register_user("U", "ops@example.com", None, "secret123")
            .await
            .unwrap();
        seed_admin(&admins).await;

        let (_, user_token) = auth
            .login_user("ops@example.com", "secret123")
            .await
            .unwrap();
        let (_, admin_token) = auth
            .login_admin("ops@example.com", "hunter2hunter2")
            .await
            .unwrap();

        assert_eq!(
            auth.resolve(Some(&user_token)).await.unwrap().role(),
            Role::User
        );
        assert_eq!(
            auth.resolve(Some(&admin_token)).await.unwrap().role(),
            Role::Admin
        );
    }

    #[tokio::test]
    async fn test_missing_token() {
        let (auth, _, _) = service();
        assert!(matches!(
            auth.resolve(None).await,
            Err(AuthError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_regardless_of_signature() {
        let users = Arc::new(MemoryUserStore::new());
        let admins = Arc::new(MemoryAdminStore::new());
        let auth = AuthService::new(
            users.clone(),
            admins,
            token_service(Duration::hours(-2)),
        );
        auth.register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();
        let (_, token) = auth.login_user("u@example.com", "secret123").await.unwrap();

        assert!(matches!(
            auth.resolve(Some(&token)).await,
            Err(AuthError::ExpiredToken)
        ));
    }

    #[tokio::test]
    async fn test_deleted_subject_yields_identity_not_found() {
        let (auth, users, _) = service();
        let (user, token) = auth
            .register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();

        users.delete(user.id).await.unwrap();

        assert!(matches!(
            auth.resolve(Some(&token)).await,
            Err(AuthError::IdentityNotFound)
        ));
    }

    #[tokio::test]
    async fn test_deactivated_account_fails_with_valid_token() {
        let (auth, users, _) = service();
        let (user, token) = auth
            .register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();

        users.set_active(user.id, false).await.unwrap();

        assert!(matches!(
            auth.resolve(Some(&token)).await,
            Err(AuthError::InactiveAccount)
        ));
    }

    #[tokio::test]
    async fn test_record_role_must_match_claim() {
        let (auth, users, _) = service();
        let (user, token) = auth
            .register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();

        // Corrupt the stored record so its role tag disagrees with the
        // store it lives in. The claim may only select the store; the
        // record's own role is authoritative.
        let mut corrupted = user;
        corrupted.role = Role::Admin;
        users.put_raw(corrupted);

        assert!(matches!(
            auth.resolve(Some(&token)).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let (auth, _, _) = service();
        let (user, token) = auth
            .register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();

        let first = auth.resolve(Some(&token)).await.unwrap();
        let second = auth.resolve(Some(&token)).await.unwrap();

        for identity in [first, second] {
            match identity {
                Identity::User(resolved) => assert_eq!(resolved.id, user.id),
                Identity::Admin(_) => panic!("unexpected admin identity"),
            }
        }
    }

    #[tokio::test]
    async fn test_user_identity_fails_admin_gate() {
        let (auth, _, _) = service();
        let (_, token) = auth
            .register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();

        let identity = auth.resolve(Some(&token)).await.unwrap();
        assert!(identity.require_role(Role::User).is_ok());
        assert!(matches!(
            identity.require_role(Role::Admin),
            Err(AuthError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_password_change_requires_current_password() {
        let (auth, _, _) = service();
        let (user, _) = auth
            .register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();

        let wrong = auth
            .update_user_profile(
                user.id,
                ProfileChange {
                    current_password: Some("not-the-password".to_owned()),
                    new_password: Some("newsecret456".to_owned()),
                    ..ProfileChange::default()
                },
            )
            .await;
        assert!(matches!(wrong, Err(AuthError::CurrentPasswordMismatch)));

        auth.update_user_profile(
            user.id,
            ProfileChange {
                current_password: Some("secret123".to_owned()),
                new_password: Some("newsecret456".to_owned()),
                ..ProfileChange::default()
            },
        )
        .await
        .unwrap();

        assert!(auth.login_user("u@example.com", "secret123").await.is_err());
        assert!(
            auth.login_user("u@example.com", "newsecret456")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_profile_update_cannot_take_anothers_email() {
        let (auth, _, _) = service();
        auth.register_user("A", "a@example.com", None, "secret123")
            .await
            .unwrap();
        let (b, _) = auth
            .register_user("B", "b@example.com", None, "secret123")
            .await
            .unwrap();

        let result = auth
            .update_user_profile(
                b.id,
                ProfileChange {
                    email: Some("a@example.com".to_owned()),
                    ..ProfileChange::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AuthError::DuplicateEmail)));

        // Keeping your own email is not a conflict.
        let kept = auth
            .update_user_profile(
                b.id,
                ProfileChange {
                    email: Some("b@example.com".to_owned()),
                    name: Some("Still B".to_owned()),
                    ..ProfileChange::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.email.as_str(), "b@example.com");
    }

    #[test]
    fn test_password_requirements_apply_everywhere() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("secret123").is_ok());
    }

    #[tokio::test]
    async fn test_profile_update_never_changes_role() {
        let (auth, _, _) = service();
        let (user, _) = auth
            .register_user("U", "u@example.com", None, "secret123")
            .await
            .unwrap();

        let updated = auth
            .update_user_profile(
                user.id,
                ProfileChange {
                    name: Some("Renamed".to_owned()),
                    email: Some("renamed@example.com".to_owned()),
                    phone: Some("555-0100".to_owned()),
                    ..ProfileChange::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.role, Role::User);
        assert_eq!(updated.name, "Renamed");
    }

    #[tokio::test]
    async fn test_admin_login_stamps_last_login() {
        let (auth, _, admins) = service();
        let admin = seed_admin(&admins).await;
        assert!(admin.last_login.is_none());

        let (logged_in, _) = auth
            .login_admin("ops@example.com", "hunter2hunter2")
            .await
            .unwrap();
        let refreshed = admins.find_by_id(logged_in.id).await.unwrap().unwrap();
        assert!(refreshed.last_login.is_some());
    }
}
