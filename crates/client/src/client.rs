//! HTTP API client.
//!
//! Wraps `reqwest` with destination-based token attachment. Every request
//! path is classified first; the matching session slot supplies the token.
//! A 401 clears only the slot that served the rejected request.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::destination::Destination;
use crate::error::ClientError;
use crate::session::{SessionState, SessionView};

/// API client holding a dual-slot session.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionState,
}

impl ApiClient {
    /// Create a client against the given base URL (no trailing slash).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            session: SessionState::new(),
        }
    }

    /// View the session as seen from the given destination.
    #[must_use]
    pub fn session(&self, destination: Destination) -> SessionView {
        self.session.view(destination)
    }

    /// Reconcile the local session view against the server's verdict.
    ///
    /// Called on startup and whenever the caller crosses between surfaces.
    /// A 401 here clears the stale slot through the normal rejection path;
    /// any other failure leaves the session untouched.
    ///
    /// # Errors
    ///
    /// Propagates the failed resolve; the returned error says which login
    /// surface to use.
    pub async fn reconcile(&mut self, destination: Destination) -> Result<SessionView, ClientError> {
        let path = match destination {
            Destination::Storefront => "/api/users/profile",
            Destination::Admin => "/api/admin/profile",
        };
        let body = self.get(path).await?;

        let profile_key = match destination {
            Destination::Storefront => "user",
            Destination::Admin => "admin",
        };
        if let Some(profile) = body.get(profile_key) {
            self.session.store_profile(destination, profile.clone());
        }
        Ok(self.session.view(destination))
    }

    /// Login against the storefront and store the token in the user slot.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` on bad credentials.
    pub async fn login_user(&mut self, email: &str, password: &str) -> Result<Value, ClientError> {
        let body = self
            .request(
                reqwest::Method::POST,
                "/api/users/login",
                Some(&serde_json::json!({ "email": email, "password": password })),
            )
            .await?;

        let token = extract_token(&body)?;
        self.session.store(Destination::Storefront, token);
        if let Some(profile) = body.get("user") {
            self.session
                .store_profile(Destination::Storefront, profile.clone());
        }
        Ok(body)
    }

    /// Login against the back-office and store the token in the admin slot.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` on bad credentials.
    pub async fn login_admin(&mut self, email: &str, password: &str) -> Result<Value, ClientError> {
        let body = self
            .request(
                reqwest::Method::POST,
                "/api/admin/login",
                Some(&serde_json::json!({ "email": email, "password": password })),
            )
            .await?;

        let token = extract_token(&body)?;
        self.session.store(Destination::Admin, token);
        if let Some(profile) = body.get("admin") {
            self.session
                .store_profile(Destination::Admin, profile.clone());
        }
        Ok(body)
    }

    /// Register a storefront user and store the issued token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on validation failure.
    pub async fn register_user<T: Serialize + Sync>(
        &mut self,
        fields: &T,
    ) -> Result<Value, ClientError> {
        let body = self
            .request(reqwest::Method::POST, "/api/users/register", Some(fields))
            .await?;

        let token = extract_token(&body)?;
        self.session.store(Destination::Storefront, token);
        if let Some(profile) = body.get("user") {
            self.session
                .store_profile(Destination::Storefront, profile.clone());
        }
        Ok(body)
    }

    /// GET an API path with destination-selected authentication.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` or `ClientError::Forbidden` per
    /// the server's verdict.
    pub async fn get(&mut self, path: &str) -> Result<Value, ClientError> {
        self.request::<()>(reqwest::Method::GET, path, None).await
    }

    /// PUT a JSON body to an API path with destination-selected
    /// authentication.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::get`].
    pub async fn put<T: Serialize + Sync>(
        &mut self,
        path: &str,
        body: &T,
    ) -> Result<Value, ClientError> {
        self.request(reqwest::Method::PUT, path, Some(body)).await
    }

    /// DELETE an API path with destination-selected authentication.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::get`].
    pub async fn delete(&mut self, path: &str) -> Result<Value, ClientError> {
        self.request::<()>(reqwest::Method::DELETE, path, None)
            .await
    }

    /// PATCH a JSON body to an API path with destination-selected
    /// authentication.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::get`].
    pub async fn patch<T: Serialize + Sync>(
        &mut self,
        path: &str,
        body: &T,
    ) -> Result<Value, ClientError> {
        self.request(reqwest::Method::PATCH, path, Some(body)).await
    }

    async fn request<T: Serialize + Sync>(
        &mut self,
        method: reqwest::Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<Value, ClientError> {
        let destination = Destination::classify(path);

        let mut builder = self
            .http
            .request(method, format!("{}{path}", self.base_url));

        if let Some(token) = self.session.token_for(destination) {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        if status.is_success() {
            return Ok(body);
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_owned();

        match status {
            StatusCode::UNAUTHORIZED => {
                // Only the slot that served this request is stale. The other
                // domain's session is untouched.
                self.session.clear(destination);
                tracing::debug!(path, "token rejected, cleared {destination:?} slot");
                Err(ClientError::Unauthorized {
                    login_surface: destination.login_surface(),
                })
            }
            StatusCode::FORBIDDEN => Err(ClientError::Forbidden { message }),
            _ => Err(ClientError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

fn extract_token(body: &Value) -> Result<String, ClientError> {
    body.get("token")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| ClientError::Decode("login response missing token".to_owned()))
}
