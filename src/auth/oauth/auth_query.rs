//! Callback query parameters and their signature.

use crate::auth::hmac::{compute_signature, constant_time_compare};
use crate::config::AppConfig;
use std::collections::BTreeMap;

/// Query parameters the platform sends to the OAuth callback.
///
/// The full parameter map is kept, not just the known fields, because the
/// signature covers every parameter except `hmac` (and the legacy
/// `signature`). Dropping an unknown parameter would make a genuine
/// callback fail verification.
///
/// ```rust
/// use storefront_auth::auth::oauth::AuthQuery;
///
/// let query = AuthQuery::from_params([
///     ("state", "abc"),
///     ("shop", "shop-a.example.com"),
///     ("hmac", "deadbeef"),
///     ("code", "xyz"),
/// ]);
///
/// assert_eq!(query.shop(), Some("shop-a.example.com"));
/// assert_eq!(query.to_signable_string(), "code=xyz&shop=shop-a.example.com&state=abc");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthQuery {
    params: BTreeMap<String, String>,
}

impl AuthQuery {
    /// Parameters excluded from the signed message.
    const UNSIGNED: [&'static str; 2] = ["hmac", "signature"];

    /// Builds a query from decoded key/value pairs. Later duplicates win.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Convenience constructor with the fields the platform always sends.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        shop: impl Into<String>,
        timestamp: impl Into<String>,
        state: impl Into<String>,
        host: impl Into<String>,
        hmac: impl Into<String>,
    ) -> Self {
        Self::from_params([
            ("code", code.into()),
            ("shop", shop.into()),
            ("timestamp", timestamp.into()),
            ("state", state.into()),
            ("host", host.into()),
            ("hmac", hmac.into()),
        ])
    }

    /// Returns a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Sets or replaces a parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// The shop identifier.
    #[must_use]
    pub fn shop(&self) -> Option<&str> {
        self.get("shop")
    }

    /// The one-time authorization code.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    /// The state value issued by `begin`.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }

    /// The hex HMAC-SHA256 signature.
    #[must_use]
    pub fn hmac(&self) -> Option<&str> {
        self.get("hmac")
    }

    /// The opaque admin host value forwarded to the frontend.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.get("host")
    }

    /// The platform's request timestamp.
    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        self.get("timestamp")
    }

    /// Returns the message the platform signed: every parameter except the
    /// signature fields, sorted by key, as `key=value` joined with `&`.
    #[must_use]
    pub fn to_signable_string(&self) -> String {
        self.params
            .iter()
            .filter(|(k, _)| !Self::UNSIGNED.contains(&k.as_str()))
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Signs the query with `secret`, replacing any `hmac` parameter.
    ///
    /// Mirrors what the platform does; used by tests and tooling.
    #[must_use]
    pub fn signed(self, secret: &str) -> Self {
        let hmac = compute_signature(&self.to_signable_string(), secret);
        self.with_param("hmac", hmac)
    }
}

/// Checks the callback signature against the configured secrets.
///
/// The primary secret is tried first, then the old secret when a rotation is
/// configured. A missing `hmac` parameter never verifies.
#[must_use]
pub fn validate_hmac(query: &AuthQuery, config: &AppConfig) -> bool {
    let Some(received) = query.hmac().filter(|h| !h.is_empty()) else {
        return false;
    };
    let signable = query.to_signable_string();

    config.secrets().any(|secret| {
        let computed = compute_signature(&signable, secret.as_ref());
        constant_time_compare(&computed, received)
    })
}
