//! Per-shop sessions established by a verified OAuth handshake.

use crate::auth::AuthScopes;
use crate::config::ShopDomain;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque platform access token.
///
/// `Debug` and `Display` are masked; use [`AccessToken::expose`] at the one
/// place the raw value is needed (the `Authorization` header of a REST
/// call). Serialization writes the raw value so persistent stores can keep
/// it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("*****")
    }
}

/// Body returned by the platform token endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessTokenResponse {
    /// The issued access token.
    pub access_token: AccessToken,
    /// Comma-separated granted scopes.
    #[serde(default)]
    pub scope: String,
    /// Lifetime in seconds; present for online tokens.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Scopes granted to the associated user; present for online tokens.
    #[serde(default)]
    pub associated_user_scope: Option<String>,
}

/// The credential and metadata held for one shop.
///
/// ```rust
/// use storefront_auth::{Session, ShopDomain};
/// use storefront_auth::auth::AccessToken;
///
/// let shop = ShopDomain::new("my-store.example.com").unwrap();
/// let session = Session::new(
///     shop,
///     AccessToken::new("token"),
///     "read_products".parse().unwrap(),
///     false,
///     None,
/// );
///
/// assert_eq!(session.id, "offline_my-store.example.com");
/// assert!(session.is_active());
/// assert!(!format!("{session:?}").contains("\"token\""));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// `offline_<shop>` or `online_<shop>`.
    pub id: String,

    /// The shop this session belongs to.
    pub shop: ShopDomain,

    /// The platform access token.
    pub access_token: AccessToken,

    /// Whether the token is a short-lived user-bound token.
    pub is_online: bool,

    /// The permissions granted with the token.
    pub scopes: AuthScopes,

    /// When the handshake completed.
    pub created_at: DateTime<Utc>,

    /// When the token stops working, if it expires.
    pub expires: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a session stamped with the current time.
    #[must_use]
    pub fn new(
        shop: ShopDomain,
        access_token: AccessToken,
        scopes: AuthScopes,
        is_online: bool,
        expires: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Self::session_id(&shop, is_online),
            shop,
            access_token,
            is_online,
            scopes,
            created_at: Utc::now(),
            expires,
        }
    }

    /// Builds a session from a token endpoint response.
    ///
    /// Online sessions take the associated user's scopes when the platform
    /// reports them, and an expiry from `expires_in`. An `expires_in` too
    /// large to represent leaves the session without an expiry.
    #[must_use]
    pub fn from_access_token_response(
        shop: ShopDomain,
        response: &AccessTokenResponse,
        is_online: bool,
    ) -> Self {
        let granted = match (is_online, response.associated_user_scope.as_deref()) {
            (true, Some(user_scope)) => user_scope,
            _ => response.scope.as_str(),
        };
        let expires = response
            .expires_in
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));

        Self::new(
            shop,
            response.access_token.clone(),
            AuthScopes::from_granted(granted),
            is_online,
            expires,
        )
    }

    /// Returns the session id used for a shop and access mode.
    #[must_use]
    pub fn session_id(shop: &ShopDomain, is_online: bool) -> String {
        let prefix = if is_online { "online" } else { "offline" };
        format!("{prefix}_{shop}")
    }

    /// Returns `true` if this session has expired.
    ///
    /// Sessions without an expiration time never expire.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if the session holds a token that has not expired.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty() && !self.expired()
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> ShopDomain {
        ShopDomain::new("shop-a.example.com").unwrap()
    }

    fn response(json: serde_json::Value) -> AccessTokenResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_session_expired() {
        let expired = Session::new(
            shop(),
            AccessToken::new("token"),
            AuthScopes::new(),
            true,
            Some(Utc::now() - Duration::hours(1)),
        );
        assert!(expired.expired());
        assert!(!expired.is_active());

        let valid = Session::new(
            shop(),
            AccessToken::new("token"),
            AuthScopes::new(),
            true,
            Some(Utc::now() + Duration::hours(1)),
        );
        assert!(!valid.expired());

        let no_expiry = Session::new(
            shop(),
            AccessToken::new("token"),
            AuthScopes::new(),
            false,
            None,
        );
        assert!(!no_expiry.expired());
        assert!(no_expiry.is_active());
    }

    #[test]
    fn test_empty_token_is_not_active() {
        let session = Session::new(shop(), AccessToken::new(""), AuthScopes::new(), false, None);
        assert!(!session.is_active());
    }

    #[test]
    fn test_session_ids_by_access_mode() {
        assert_eq!(Session::session_id(&shop(), false), "offline_shop-a.example.com");
        assert_eq!(Session::session_id(&shop(), true), "online_shop-a.example.com");
    }

    #[test]
    fn test_access_token_is_masked() {
        let token = AccessToken::new("shpat_very_secret");
        assert_eq!(format!("{token:?}"), "AccessToken(*****)");
        assert_eq!(token.to_string(), "*****");
        assert_eq!(token.expose(), "shpat_very_secret");
    }

    #[test]
    fn test_from_offline_token_response() {
        let resp = response(serde_json::json!({
            "access_token": "offline-token",
            "scope": "write_orders,read_products"
        }));

        let session = Session::from_access_token_response(shop(), &resp, false);

        assert_eq!(session.access_token.expose(), "offline-token");
        assert!(!session.is_online);
        assert!(session.expires.is_none());
        assert_eq!(
            session.scopes.to_string(),
            "read_orders,read_products,write_orders"
        );
    }

    #[test]
    fn test_from_online_token_response_uses_user_scope_and_expiry() {
        let resp = response(serde_json::json!({
            "access_token": "online-token",
            "scope": "write_orders,read_products",
            "expires_in": 86399,
            "associated_user_scope": "read_products"
        }));

        let session = Session::from_access_token_response(shop(), &resp, true);

        assert!(session.is_online);
        assert_eq!(session.id, "online_shop-a.example.com");
        assert_eq!(session.scopes.to_string(), "read_products");
        let expires = session.expires.unwrap();
        assert!(expires > Utc::now() + Duration::hours(23));
    }

    #[test]
    fn test_huge_expires_in_does_not_panic() {
        // Beyond what a TimeDelta can hold, then beyond the DateTime range.
        for secs in [i64::MAX, 1_000_000_000_000_000] {
            let resp = response(serde_json::json!({
                "access_token": "online-token",
                "scope": "read_products",
                "expires_in": secs
            }));

            let session = Session::from_access_token_response(shop(), &resp, true);

            assert_eq!(session.access_token.expose(), "online-token");
            assert!(session.expires.is_none());
            assert!(session.is_active());
        }
    }

    #[test]
    fn test_session_serde_round_trip_keeps_token() {
        let session = Session::new(
            shop(),
            AccessToken::new("token-123"),
            "read_products".parse().unwrap(),
            false,
            None,
        );
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("token-123"));

        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn test_session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Session>();
    }
}
