//! Client session state.
//!
//! Holds at most one token per trust domain, plus a cached profile for each.
//! The two slots are fully independent: storing, using, or clearing one never
//! touches the other, so a storefront session and an admin session can
//! coexist in one client. All reads and writes go through this type; nothing
//! else holds tokens.

use serde::Serialize;
use serde_json::Value;

use crate::destination::Destination;

/// Dual-slot token and profile holder.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    user_token: Option<String>,
    admin_token: Option<String>,
    user_profile: Option<Value>,
    admin_profile: Option<Value>,
}

/// Point-in-time view of the session, shaped for UI consumption.
///
/// Derived, never authoritative: the server's resolve verdict wins, and the
/// view is reconciled against it via [`crate::ApiClient::reconcile`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionView {
    /// A storefront token is held.
    pub is_authenticated: bool,
    /// An admin token is held.
    pub is_admin: bool,
    /// Cached profile for the viewed destination, if known.
    pub current_user: Option<Value>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a token in the slot for the given destination, replacing any
    /// token already there.
    pub fn store(&mut self, destination: Destination, token: String) {
        match destination {
            Destination::Storefront => self.user_token = Some(token),
            Destination::Admin => self.admin_token = Some(token),
        }
    }

    /// Cache the profile for the given destination.
    pub fn store_profile(&mut self, destination: Destination, profile: Value) {
        match destination {
            Destination::Storefront => self.user_profile = Some(profile),
            Destination::Admin => self.admin_profile = Some(profile),
        }
    }

    /// Clear only the slot (token and cached profile) for the given
    /// destination.
    pub fn clear(&mut self, destination: Destination) {
        match destination {
            Destination::Storefront => {
                self.user_token = None;
                self.user_profile = None;
            }
            Destination::Admin => {
                self.admin_token = None;
                self.admin_profile = None;
            }
        }
    }

    /// The token to attach to a request for the given destination, if held.
    #[must_use]
    pub fn token_for(&self, destination: Destination) -> Option<&str> {
        match destination {
            Destination::Storefront => self.user_token.as_deref(),
            Destination::Admin => self.admin_token.as_deref(),
        }
    }

    /// View the session as seen from the given destination.
    #[must_use]
    pub fn view(&self, destination: Destination) -> SessionView {
        let current_user = match destination {
            Destination::Storefront => self.user_profile.clone(),
            Destination::Admin => self.admin_profile.clone(),
        };
        SessionView {
            is_authenticated: self.user_token.is_some(),
            is_admin: self.admin_token.is_some(),
            current_user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slots_are_independent() {
        let mut session = SessionState::new();
        session.store(Destination::Storefront, "user-token-123".to_owned());
        session.store(Destination::Admin, "admin-token-456".to_owned());

        assert_eq!(
            session.token_for(Destination::Storefront),
            Some("user-token-123")
        );
        assert_eq!(session.token_for(Destination::Admin), Some("admin-token-456"));
    }

    #[test]
    fn test_clearing_one_slot_leaves_the_other() {
        let mut session = SessionState::new();
        session.store(Destination::Storefront, "user-token-123".to_owned());
        session.store(Destination::Admin, "admin-token-456".to_owned());

        session.clear(Destination::Storefront);

        assert_eq!(session.token_for(Destination::Storefront), None);
        assert_eq!(session.token_for(Destination::Admin), Some("admin-token-456"));

        // And the other way around.
        session.store(Destination::Storefront, "user-token-123".to_owned());
        session.clear(Destination::Admin);

        assert_eq!(
            session.token_for(Destination::Storefront),
            Some("user-token-123")
        );
        assert_eq!(session.token_for(Destination::Admin), None);
    }

    #[test]
    fn test_storing_replaces_only_matching_slot() {
        let mut session = SessionState::new();
        session.store(Destination::Storefront, "old".to_owned());
        session.store(Destination::Admin, "admin-token-456".to_owned());
        session.store(Destination::Storefront, "new".to_owned());

        assert_eq!(session.token_for(Destination::Storefront), Some("new"));
        assert_eq!(session.token_for(Destination::Admin), Some("admin-token-456"));
    }

    #[test]
    fn test_view_reflects_both_slots() {
        let mut session = SessionState::new();
        let view = session.view(Destination::Storefront);
        assert!(!view.is_authenticated);
        assert!(!view.is_admin);
        assert!(view.current_user.is_none());

        session.store(Destination::Admin, "admin-token-456".to_owned());
        session.store_profile(Destination::Admin, json!({ "name": "Ops" }));

        let view = session.view(Destination::Admin);
        assert!(!view.is_authenticated);
        assert!(view.is_admin);
        assert_eq!(view.current_user, Some(json!({ "name": "Ops" })));

        // The storefront view does not see the admin profile.
        let view = session.view(Destination::Storefront);
        assert!(view.current_user.is_none());
    }

    #[test]
    fn test_clear_drops_cached_profile_with_token() {
        let mut session = SessionState::new();
        session.store(Destination::Storefront, "user-token-123".to_owned());
        session.store_profile(Destination::Storefront, json!({ "name": "Uma" }));

        session.clear(Destination::Storefront);

        let view = session.view(Destination::Storefront);
        assert!(!view.is_authenticated);
        assert!(view.current_user.is_none());
    }
}
