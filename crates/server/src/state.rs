//! Shared application state.

use std::sync::Arc;

use chrono::Duration;
use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::admins::PgAdminStore;
use crate::db::users::PgUserStore;
use crate::db::{AdminStore, UserStore};
use crate::services::auth::{AuthService, TokenService};

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: Option<PgPool>,
    auth: AuthService,
}

impl AppState {
    /// Build state over a live database pool.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
        let admins: Arc<dyn AdminStore> = Arc::new(PgAdminStore::new(pool.clone()));
        let tokens = TokenService::new(
            &config.user_token_secret,
            &config.admin_token_secret,
            Duration::hours(config.token_ttl_hours),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool: Some(pool),
                auth: AuthService::new(users, admins, tokens),
            }),
        }
    }

    /// Build state over arbitrary stores (in-memory stores in tests).
    #[must_use]
    pub fn with_stores(
        config: ServerConfig,
        users: Arc<dyn UserStore>,
        admins: Arc<dyn AdminStore>,
    ) -> Self {
        let tokens = TokenService::new(
            &config.user_token_secret,
            &config.admin_token_secret,
            Duration::hours(config.token_ttl_hours),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool: None,
                auth: AuthService::new(users, admins, tokens),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }
}
