//! Integration test harness.
//!
//! Drives the full router in-process over in-memory credential stores, so
//! the complete request path (extractors, resolve, handlers, error mapping)
//! is exercised without a running `PostgreSQL` instance.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use clementine_core::Role;
use clementine_server::config::ServerConfig;
use clementine_server::db::memory::{MemoryAdminStore, MemoryUserStore};
use clementine_server::db::{AdminStore as _, NewAdmin};
use clementine_server::models::AdminAccount;
use clementine_server::routes;
use clementine_server::services::auth::{TokenService, hash_password};
use clementine_server::state::AppState;

/// User-domain signing secret used across the test suite.
pub const USER_SECRET: &str = "kX9#mP2$vQ7!nR4@wT6^zL8&yB3*cF5%";
/// Admin-domain signing secret used across the test suite.
pub const ADMIN_SECRET: &str = "aJ1!dG4$hK7#fM0@sN3^xP6&qV9*bW2%";

/// In-process application with direct store access for seeding.
pub struct TestContext {
    router: Router,
    pub users: Arc<MemoryUserStore>,
    pub admins: Arc<MemoryAdminStore>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let admins = Arc::new(MemoryAdminStore::new());
        let state = AppState::with_stores(test_config(), users.clone(), admins.clone());

        Self {
            router: routes::router(state),
            users,
            admins,
        }
    }

    /// Issue a token signed with the suite secrets but an arbitrary TTL.
    ///
    /// A negative TTL produces an already-expired token.
    #[must_use]
    pub fn issue_token(subject_id: i32, role: Role, ttl_hours: i64) -> String {
        TokenService::new(
            &SecretString::from(USER_SECRET),
            &SecretString::from(ADMIN_SECRET),
            chrono::Duration::hours(ttl_hours),
        )
        .issue(subject_id, role)
        .unwrap()
    }

    /// Seed an admin account and return it with its plaintext password.
    pub async fn seed_admin(&self, email: &str, password: &str) -> AdminAccount {
        self.admins
            .create(NewAdmin {
                name: "Seeded Admin".to_owned(),
                email: email.parse().unwrap(),
                password_hash: hash_password(password).unwrap(),
            })
            .await
            .unwrap()
    }

    /// Send a request and return status plus parsed JSON body.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };

        (status, body)
    }

    /// Send a request authenticated via the bare `x-auth-token` header.
    pub async fn request_with_x_auth_token(
        &self,
        method: &str,
        path: &str,
        token: &str,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("x-auth-token", token)
            .body(Body::empty())
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, body)
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://unused/test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        user_token_secret: SecretString::from(USER_SECRET),
        admin_token_secret: SecretString::from(ADMIN_SECRET),
        token_ttl_hours: 24,
        sentry_dsn: None,
    }
}
