//! Authorization URL generation.
//!
//! [`begin_auth`] is the pure half of the first handshake step: it picks a
//! fresh [`StateParam`] and builds the platform authorization URL. Recording
//! the state so the callback can be matched is the coordinator's job (see
//! [`OAuthCoordinator::begin`](crate::auth::oauth::OAuthCoordinator::begin)).

use crate::auth::oauth::state::StateParam;
use crate::auth::AuthScopes;
use crate::config::{AppConfig, ShopDomain};

/// Result of initiating OAuth authorization.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// The full authorization URL to redirect the merchant to.
    pub auth_url: String,

    /// The state generated for this request. The callback must echo it.
    pub state: StateParam,
}

/// Builds the authorization URL for `shop`.
///
/// The redirect URI is the configured host joined with the callback path.
/// Online requests add `grant_options[]=per-user`. Every key and value is
/// percent-encoded.
///
/// ```rust
/// use storefront_auth::{AppConfig, ApiKey, ApiSecretKey, HostUrl, ShopDomain};
/// use storefront_auth::auth::oauth::begin_auth;
///
/// let config = AppConfig::builder()
///     .api_key(ApiKey::new("client-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("s3cret").unwrap())
///     .host(HostUrl::new("https://myapp.example.com").unwrap())
///     .scopes("read_products".parse().unwrap())
///     .build()
///     .unwrap();
///
/// let shop = ShopDomain::new("shop-a.example.com").unwrap();
/// let result = begin_auth(&config, &shop, false, None);
///
/// assert!(result
///     .auth_url
///     .starts_with("https://shop-a.example.com/admin/oauth/authorize?client_id=client-key"));
/// assert!(result.auth_url.contains(result.state.as_ref()));
/// ```
#[must_use]
pub fn begin_auth(
    config: &AppConfig,
    shop: &ShopDomain,
    is_online: bool,
    scope_override: Option<&AuthScopes>,
) -> BeginAuthResult {
    let state = StateParam::new();
    let scopes = scope_override.unwrap_or_else(|| config.scopes());
    let redirect_uri = config.host().join(config.callback_path());

    let mut params = vec![
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", scopes.to_string()),
        ("redirect_uri", redirect_uri),
        ("state", state.to_string()),
    ];
    if is_online {
        params.push(("grant_options[]", "per-user".to_string()));
    }

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!("https://{shop}/admin/oauth/authorize?{query_string}");

    BeginAuthResult { auth_url, state }
}

// Verify BeginAuthResult is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BeginAuthResult>();
};
