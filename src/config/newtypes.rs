//! Validated newtype wrappers for configuration values.
//!
//! Each wrapper validates on construction, so holding one is proof the value
//! is usable. Secret-bearing types mask themselves in `Debug` output.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The platform client key (public app identifier).
///
/// # Example
///
/// ```rust
/// use storefront_auth::ApiKey;
///
/// let key = ApiKey::new("my-client-key").unwrap();
/// assert_eq!(key.as_ref(), "my-client-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The shared secret used to sign webhooks and OAuth callbacks.
///
/// `Debug` prints `ApiSecretKey(*****)` so the secret cannot end up in logs
/// through a derived `Debug` on a containing struct.
///
/// ```rust
/// use storefront_auth::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("s3cret").unwrap();
/// assert_eq!(format!("{secret:?}"), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// A validated shop identifier.
///
/// Shop identifiers are lowercase host names such as
/// `my-store.myplatform.com`: at least two dot-separated labels, each made of
/// ASCII letters, digits and hyphens, none starting or ending with a hyphen.
///
/// When a platform suffix is known, [`ShopDomain::with_suffix`] also accepts
/// the bare shop name and rejects domains outside the suffix.
///
/// # Example
///
/// ```rust
/// use storefront_auth::ShopDomain;
///
/// let shop = ShopDomain::new("Shop-A.Example.com").unwrap();
/// assert_eq!(shop.as_ref(), "shop-a.example.com");
/// assert_eq!(shop.shop_name(), "shop-a");
///
/// let shop = ShopDomain::with_suffix("my-store", "myplatform.com").unwrap();
/// assert_eq!(shop.as_ref(), "my-store.myplatform.com");
///
/// assert!(ShopDomain::new("").is_err());
/// assert!(ShopDomain::new("not a domain").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShopDomain(String);

impl ShopDomain {
    const MAX_LEN: usize = 253;
    const MAX_LABEL_LEN: usize = 63;

    /// Creates a shop domain from a full host name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the value is empty or is
    /// not a plausible host name.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into().trim().to_ascii_lowercase();

        if domain.is_empty() || domain.len() > Self::MAX_LEN {
            return Err(ConfigError::InvalidShopDomain { domain });
        }

        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 || !labels.iter().all(|label| Self::is_valid_label(label)) {
            return Err(ConfigError::InvalidShopDomain { domain });
        }

        Ok(Self(domain))
    }

    /// Creates a shop domain that must live under `suffix`.
    ///
    /// A bare shop name (no dot) is expanded to `name.suffix`. Anything else
    /// must be exactly one label followed by `.suffix`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] when the value is invalid or
    /// belongs to another domain.
    pub fn with_suffix(domain: impl Into<String>, suffix: &str) -> Result<Self, ConfigError> {
        let domain = domain.into().trim().to_ascii_lowercase();
        let suffix = suffix.trim().trim_start_matches('.').to_ascii_lowercase();

        let full = if domain.is_empty() || domain.contains('.') {
            domain
        } else {
            format!("{domain}.{suffix}")
        };

        let shop = Self::new(full)?;
        let under_suffix = shop
            .0
            .strip_suffix(suffix.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
            .is_some_and(|name| !name.is_empty() && !name.contains('.'));

        if under_suffix {
            Ok(shop)
        } else {
            Err(ConfigError::InvalidShopDomain { domain: shop.0 })
        }
    }

    /// Returns the first label of the domain, e.g. `my-store` for
    /// `my-store.myplatform.com`.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    fn is_valid_label(label: &str) -> bool {
        !label.is_empty()
            && label.len() <= Self::MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// A validated absolute URL (scheme and host required).
///
/// Used for the application's public host and for the frontend redirect
/// targets. A trailing slash is dropped so paths can be appended with
/// [`HostUrl::join`].
///
/// ```rust
/// use storefront_auth::HostUrl;
///
/// let url = HostUrl::new("https://myapp.example.com/").unwrap();
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.host_name(), "myapp.example.com");
/// assert_eq!(url.join("/auth/callback"), "https://myapp.example.com/auth/callback");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    scheme_end: usize,
    host_end: usize,
}

impl HostUrl {
    /// Creates a new validated URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the scheme or host is
    /// missing.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().trim_end_matches('/').to_string();
        let invalid = || ConfigError::InvalidHostUrl { url: url.clone() };

        let scheme_end = url.find("://").ok_or_else(invalid)?;
        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let host_start = scheme_end + 3;
        let host_end = url[host_start..]
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);
        if host_end == host_start {
            return Err(invalid());
        }

        Ok(Self {
            url,
            scheme_end,
            host_end,
        })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.scheme_end + 3..self.host_end]
    }

    /// Appends `path` to the URL, inserting a `/` when needed.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        if path.is_empty() {
            self.url.clone()
        } else if path.starts_with('/') {
            format!("{}{path}", self.url)
        } else {
            format!("{}/{path}", self.url)
        }
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_rejects_empty_string() {
        assert!(matches!(ApiKey::new(""), Err(ConfigError::EmptyApiKey)));
        assert!(matches!(ApiKey::new("   "), Err(ConfigError::EmptyApiKey)));
    }

    #[test]
    fn test_api_secret_key_masks_value_in_debug() {
        let secret = ApiSecretKey::new("super-secret-key").unwrap();
        let debug_output = format!("{secret:?}");
        assert_eq!(debug_output, "ApiSecretKey(*****)");
        assert!(!debug_output.contains("super-secret-key"));
    }

    #[test]
    fn test_shop_domain_accepts_plausible_domains() {
        let shop = ShopDomain::new("shop-a.example.com").unwrap();
        assert_eq!(shop.as_ref(), "shop-a.example.com");

        let shop = ShopDomain::new("  MY-STORE.MyPlatform.com ").unwrap();
        assert_eq!(shop.as_ref(), "my-store.myplatform.com");
        assert_eq!(shop.shop_name(), "my-store");
    }

    #[test]
    fn test_shop_domain_rejects_invalid_domains() {
        assert!(ShopDomain::new("").is_err());
        assert!(ShopDomain::new("   ").is_err());
        assert!(ShopDomain::new("localhost").is_err());
        assert!(ShopDomain::new("my store.example.com").is_err());
        assert!(ShopDomain::new("my_store.example.com").is_err());
        assert!(ShopDomain::new("-store.example.com").is_err());
        assert!(ShopDomain::new("store-.example.com").is_err());
        assert!(ShopDomain::new("store..example.com").is_err());
        assert!(ShopDomain::new("evil.com/path").is_err());
        assert!(ShopDomain::new("https://store.example.com").is_err());
        assert!(ShopDomain::new(format!("{}.com", "a".repeat(64))).is_err());
    }

    #[test]
    fn test_shop_domain_with_suffix_normalizes_bare_name() {
        let shop = ShopDomain::with_suffix("my-store", "myplatform.com").unwrap();
        assert_eq!(shop.as_ref(), "my-store.myplatform.com");

        let shop = ShopDomain::with_suffix("my-store.myplatform.com", ".myplatform.com").unwrap();
        assert_eq!(shop.as_ref(), "my-store.myplatform.com");
    }

    #[test]
    fn test_shop_domain_with_suffix_rejects_foreign_domains() {
        assert!(ShopDomain::with_suffix("my-store.evil.com", "myplatform.com").is_err());
        assert!(ShopDomain::with_suffix("a.b.myplatform.com", "myplatform.com").is_err());
        assert!(ShopDomain::with_suffix("evilmyplatform.com", "myplatform.com").is_err());
        assert!(ShopDomain::with_suffix("", "myplatform.com").is_err());
    }

    #[test]
    fn test_host_url_validates_format() {
        let url = HostUrl::new("https://myapp.example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_name(), "myapp.example.com");

        let url = HostUrl::new("http://localhost:3000").unwrap();
        assert_eq!(url.host_name(), "localhost");

        let url = HostUrl::new("https://myapp.example.com/app/").unwrap();
        assert_eq!(url.as_ref(), "https://myapp.example.com/app");
    }

    #[test]
    fn test_host_url_rejects_invalid() {
        assert!(HostUrl::new("myapp.example.com").is_err());
        assert!(HostUrl::new("https://").is_err());
        assert!(HostUrl::new("://example.com").is_err());
    }

    #[test]
    fn test_host_url_join() {
        let url = HostUrl::new("https://app.example.com").unwrap();
        assert_eq!(url.join("callback"), "https://app.example.com/callback");
        assert_eq!(url.join("/callback"), "https://app.example.com/callback");
        assert_eq!(url.join(""), "https://app.example.com");
    }

    #[test]
    fn test_shop_domain_serde_uses_plain_string() {
        let shop = ShopDomain::new("shop-a.example.com").unwrap();
        let json = serde_json::to_string(&shop).unwrap();
        assert_eq!(json, r#""shop-a.example.com""#);

        let restored: ShopDomain = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, shop);

        assert!(serde_json::from_str::<ShopDomain>(r#""not a shop""#).is_err());
    }
}
