//! Request destination classification.
//!
//! Which token accompanies a request is a pure function of where the request
//! is going. Application state, navigation history, and which tokens happen
//! to be held never influence the choice.

/// The two surfaces a request can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Public storefront API (`/api/users/...` and everything else).
    Storefront,
    /// Admin back-office API (`/api/admin/...`).
    Admin,
}

impl Destination {
    /// Classify a request path.
    #[must_use]
    pub fn classify(path: &str) -> Self {
        if path.starts_with("/api/admin") {
            Self::Admin
        } else {
            Self::Storefront
        }
    }

    /// The login surface a rejected caller should be sent to.
    #[must_use]
    pub const fn login_surface(self) -> &'static str {
        match self {
            Self::Storefront => "/login",
            Self::Admin => "/admin/login",
        }
    }
}
