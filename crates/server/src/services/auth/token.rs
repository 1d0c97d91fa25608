//! Token issuing and verification.
//!
//! Tokens are stateless HS256 JWTs carrying `{sub, role, iat, exp}`.
//! Possession is proof of authentication until expiry; nothing is stored
//! server-side and tokens are never cached or reused.
//!
//! The two trust domains (user, admin) sign with independent secrets. The
//! JWT header `kid` names the domain so verification can select the right
//! key before decoding; both secrets may be configured to the same value to
//! reproduce a shared-secret deployment.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use clementine_core::Role;

use super::AuthError;

/// Claims embedded in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject ID (stringified store ID).
    pub sub: String,
    /// Role fixed at issuance. Used as a store-selector hint only; the
    /// resolver re-asserts it against the resolved record.
    pub role: Role,
    /// Issued-at (unix seconds). Two tokens for the same record issued at
    /// different instants differ here.
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

struct DomainKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl DomainKeys {
    fn from_secret(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }
}

/// Issues and verifies bearer tokens for both trust domains.
pub struct TokenService {
    user_keys: DomainKeys,
    admin_keys: DomainKeys,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service with per-domain secrets and a token lifetime.
    #[must_use]
    pub fn new(user_secret: &SecretString, admin_secret: &SecretString, ttl: Duration) -> Self {
        Self {
            user_keys: DomainKeys::from_secret(user_secret),
            admin_keys: DomainKeys::from_secret(admin_secret),
            ttl,
        }
    }

    const fn keys_for(&self, role: Role) -> &DomainKeys {
        match role {
            Role::User => &self.user_keys,
            Role::Admin => &self.admin_keys,
        }
    }

    /// Issue a token for an authenticated subject.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenCreation` if signing fails.
    pub fn issue(&self, subject_id: i32, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(role.as_str().to_owned());

        encode(&header, &claims, &self.keys_for(role).encoding)
            .map_err(|_| AuthError::TokenCreation)
    }

    /// Verify signature, shape, and expiry, returning the embedded claims.
    ///
    /// The signing key is selected by the header `kid`; a token whose claims
    /// disagree with its own `kid` is rejected outright.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ExpiredToken` when `exp` has elapsed and
    /// `AuthError::InvalidToken` for every other defect.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        let domain: Role = header
            .kid
            .as_deref()
            .ok_or(AuthError::InvalidToken)?
            .parse()
            .map_err(|_| AuthError::InvalidToken)?;

        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.keys_for(domain).decoding, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            },
        )?;

        // A kid that disagrees with the embedded role would let a token
        // signed for one domain masquerade as the other.
        if data.claims.role != domain {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }
}
