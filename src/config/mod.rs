//! Process-wide configuration.
//!
//! - [`AppConfig`]: immutable settings shared by every component
//! - [`AppConfigBuilder`]: fluent builder with validation on `build()`
//! - [`ApiKey`], [`ApiSecretKey`], [`ShopDomain`], [`HostUrl`]: validated newtypes
//!
//! Configuration is read once at startup (see [`AppConfig::from_env`]) and
//! then injected into the coordinator, receiver and router. Nothing in the
//! core reads ambient process state.
//!
//! # Example
//!
//! ```rust
//! use storefront_auth::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("client-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("s3cret").unwrap())
//!     .host(HostUrl::new("https://myapp.example.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.callback_path(), "/auth/callback");
//! ```

mod newtypes;

pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, ShopDomain};

use crate::auth::AuthScopes;
use crate::error::ConfigError;
use std::time::Duration;

/// Immutable configuration for the integration layer.
///
/// `AppConfig` is `Clone + Send + Sync`; share it behind an `Arc`.
///
/// # Key Rotation
///
/// When `old_api_secret_key` is set, webhook and callback signatures are
/// checked against the primary secret first and the old one second, so
/// deliveries signed just before a rotation still verify.
#[derive(Clone, Debug)]
pub struct AppConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    host: HostUrl,
    callback_path: String,
    shop_suffix: Option<String>,
    online_tokens: bool,
    state_ttl: Duration,
    max_pending_states: usize,
    token_exchange_timeout: Duration,
    frontend_url: Option<HostUrl>,
    frontend_error_url: Option<HostUrl>,
    port: u16,
}

impl AppConfig {
    /// Default lifetime of a pending authorization state.
    pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(300);
    /// Default cap on authorizations awaiting a callback.
    pub const DEFAULT_MAX_PENDING_STATES: usize = 10_000;
    /// Default bound on the token endpoint call.
    pub const DEFAULT_TOKEN_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default listen port.
    pub const DEFAULT_PORT: u16 = 3001;
    /// Default path the platform redirects back to.
    pub const DEFAULT_CALLBACK_PATH: &'static str = "/auth/callback";

    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// Loads configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` beforehand to pick up a `.env` file.
    ///
    /// | Variable | Required | Meaning |
    /// |---|---|---|
    /// | `PLATFORM_API_KEY` | yes | client key |
    /// | `PLATFORM_API_SECRET` | yes | shared secret |
    /// | `PLATFORM_OLD_API_SECRET` | no | previous secret during rotation |
    /// | `PLATFORM_SCOPES` | no | comma-separated scopes |
    /// | `PLATFORM_SHOP_SUFFIX` | no | restricts shops to `*.suffix` |
    /// | `HOST` | yes | public URL of this service |
    /// | `FRONTEND_URL` | yes | success redirect target |
    /// | `FRONTEND_ERROR_URL` | no | error redirect target |
    /// | `PORT` | no | listen port (3001) |
    /// | `OAUTH_STATE_TTL_SECS` | no | pending state lifetime (300) |
    /// | `OAUTH_MAX_PENDING_STATES` | no | cap on pending states (10000) |
    /// | `TOKEN_EXCHANGE_TIMEOUT_SECS` | no | token call bound (10) |
    /// | `ONLINE_TOKENS` | no | request per-user tokens (`false`) |
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or malformed
    /// variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingEnvVar { name });

        let mut builder = Self::builder()
            .api_key(ApiKey::new(require("PLATFORM_API_KEY")?)?)
            .api_secret_key(ApiSecretKey::new(require("PLATFORM_API_SECRET")?)?)
            .host(HostUrl::new(require("HOST")?)?)
            .frontend_url(HostUrl::new(require("FRONTEND_URL")?)?);

        if let Some(old) = get("PLATFORM_OLD_API_SECRET") {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old)?);
        }
        if let Some(scopes) = get("PLATFORM_SCOPES") {
            builder = builder.scopes(scopes.parse()?);
        }
        if let Some(suffix) = get("PLATFORM_SHOP_SUFFIX") {
            builder = builder.shop_suffix(suffix);
        }
        if let Some(url) = get("FRONTEND_ERROR_URL") {
            builder = builder.frontend_error_url(HostUrl::new(url)?);
        }
        if let Some(port) = get("PORT") {
            builder = builder.port(parse_var("PORT", &port)?);
        }
        if let Some(secs) = get("OAUTH_STATE_TTL_SECS") {
            builder = builder.state_ttl(Duration::from_secs(parse_var(
                "OAUTH_STATE_TTL_SECS",
                &secs,
            )?));
        }
        if let Some(max) = get("OAUTH_MAX_PENDING_STATES") {
            builder = builder.max_pending_states(parse_var("OAUTH_MAX_PENDING_STATES", &max)?);
        }
        if let Some(secs) = get("TOKEN_EXCHANGE_TIMEOUT_SECS") {
            builder = builder.token_exchange_timeout(Duration::from_secs(parse_var(
                "TOKEN_EXCHANGE_TIMEOUT_SECS",
                &secs,
            )?));
        }
        if let Some(online) = get("ONLINE_TOKENS") {
            builder = builder.online_tokens(parse_var("ONLINE_TOKENS", &online)?);
        }

        builder.build()
    }

    /// Returns the client key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the shared secret.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the previous shared secret, if a rotation is in progress.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the primary secret followed by the old one, if any.
    pub fn secrets(&self) -> impl Iterator<Item = &ApiSecretKey> {
        std::iter::once(&self.api_secret_key).chain(self.old_api_secret_key.as_ref())
    }

    /// Returns the requested OAuth scopes.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the public URL of this service.
    #[must_use]
    pub const fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Returns the path the platform redirects back to after authorization.
    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    /// Returns the platform shop domain suffix, if shops are restricted.
    #[must_use]
    pub fn shop_suffix(&self) -> Option<&str> {
        self.shop_suffix.as_deref()
    }

    /// Returns whether `begin` requests online (per-user) tokens by default.
    #[must_use]
    pub const fn online_tokens(&self) -> bool {
        self.online_tokens
    }

    /// Returns how long a pending authorization state stays valid.
    #[must_use]
    pub const fn state_ttl(&self) -> Duration {
        self.state_ttl
    }

    /// Returns how many authorizations may await a callback at once.
    #[must_use]
    pub const fn max_pending_states(&self) -> usize {
        self.max_pending_states
    }

    /// Returns the bound on the token endpoint call.
    #[must_use]
    pub const fn token_exchange_timeout(&self) -> Duration {
        self.token_exchange_timeout
    }

    /// Returns the frontend URL to redirect to after a successful handshake.
    ///
    /// Falls back to [`AppConfig::host`] when not configured.
    #[must_use]
    pub fn frontend_url(&self) -> &HostUrl {
        self.frontend_url.as_ref().unwrap_or(&self.host)
    }

    /// Returns the frontend URL to redirect to after a failed handshake.
    ///
    /// Falls back to [`AppConfig::frontend_url`].
    #[must_use]
    pub fn frontend_error_url(&self) -> &HostUrl {
        self.frontend_error_url
            .as_ref()
            .unwrap_or_else(|| self.frontend_url())
    }

    /// Returns the listen port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Validates a raw shop identifier against this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] when the shop is empty,
    /// malformed, or outside the configured suffix.
    pub fn parse_shop(&self, raw: &str) -> Result<ShopDomain, ConfigError> {
        match self.shop_suffix() {
            Some(suffix) => ShopDomain::with_suffix(raw, suffix),
            None => ShopDomain::new(raw),
        }
    }
}

fn parse_var<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar {
            name,
            reason: e.to_string(),
        })
}

// Verify AppConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

/// Builder for [`AppConfig`].
///
/// `api_key`, `api_secret_key` and `host` are required; everything else has
/// a default (see the `DEFAULT_*` constants on [`AppConfig`]).
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    host: Option<HostUrl>,
    callback_path: Option<String>,
    shop_suffix: Option<String>,
    online_tokens: Option<bool>,
    state_ttl: Option<Duration>,
    max_pending_states: Option<usize>,
    token_exchange_timeout: Option<Duration>,
    frontend_url: Option<HostUrl>,
    frontend_error_url: Option<HostUrl>,
    port: Option<u16>,
}

impl AppConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the shared secret (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the previous shared secret for key rotation.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the requested OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the public URL of this service (required).
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Overrides the callback path (default `/auth/callback`).
    #[must_use]
    pub fn callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = Some(path.into());
        self
    }

    /// Restricts shops to subdomains of `suffix`.
    #[must_use]
    pub fn shop_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.shop_suffix = Some(suffix.into());
        self
    }

    /// Requests online (per-user) tokens by default.
    #[must_use]
    pub const fn online_tokens(mut self, online: bool) -> Self {
        self.online_tokens = Some(online);
        self
    }

    /// Sets the pending state lifetime.
    #[must_use]
    pub const fn state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = Some(ttl);
        self
    }

    /// Sets the cap on pending states. Zero is raised to one.
    #[must_use]
    pub const fn max_pending_states(mut self, max: usize) -> Self {
        self.max_pending_states = Some(max);
        self
    }

    /// Sets the token exchange timeout.
    #[must_use]
    pub const fn token_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.token_exchange_timeout = Some(timeout);
        self
    }

    /// Sets the success redirect target.
    #[must_use]
    pub fn frontend_url(mut self, url: HostUrl) -> Self {
        self.frontend_url = Some(url);
        self
    }

    /// Sets the error redirect target.
    #[must_use]
    pub fn frontend_error_url(mut self, url: HostUrl) -> Self {
        self.frontend_error_url = Some(url);
        self
    }

    /// Sets the listen port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builds the [`AppConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key`,
    /// `api_secret_key` or `host` is not set.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let host = self
            .host
            .ok_or(ConfigError::MissingRequiredField { field: "host" })?;

        let callback_path = self
            .callback_path
            .unwrap_or_else(|| AppConfig::DEFAULT_CALLBACK_PATH.to_string());

        Ok(AppConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes: self.scopes.unwrap_or_default(),
            host,
            callback_path,
            shop_suffix: self.shop_suffix,
            online_tokens: self.online_tokens.unwrap_or(false),
            state_ttl: self.state_ttl.unwrap_or(AppConfig::DEFAULT_STATE_TTL),
            max_pending_states: self
                .max_pending_states
                .unwrap_or(AppConfig::DEFAULT_MAX_PENDING_STATES)
                .max(1),
            token_exchange_timeout: self
                .token_exchange_timeout
                .unwrap_or(AppConfig::DEFAULT_TOKEN_EXCHANGE_TIMEOUT),
            frontend_url: self.frontend_url,
            frontend_error_url: self.frontend_error_url,
            port: self.port.unwrap_or(AppConfig::DEFAULT_PORT),
        })
    }
}
