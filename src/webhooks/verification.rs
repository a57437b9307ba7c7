//! Webhook signature verification.
//!
//! - [`verify_webhook`]: uses [`AppConfig`] and supports key rotation
//! - [`verify_hmac`]: single-secret check for custom integrations
//!
//! # Example
//!
//! ```rust
//! use storefront_auth::webhooks::{verify_webhook, WebhookRequest};
//! use storefront_auth::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
//! use storefront_auth::auth::hmac::compute_signature_base64;
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("test-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .host(HostUrl::new("https://app.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let body = b"webhook payload";
//! let request = WebhookRequest::new(
//!     body.to_vec(),
//!     compute_signature_base64(body, "my-secret"),
//!     Some("orders/create".to_string()),
//!     Some("shop-a.example.com".to_string()),
//!     Some("2025-10".to_string()),
//!     Some("webhook-123".to_string()),
//! );
//!
//! let context = verify_webhook(&config, &request).unwrap();
//! assert_eq!(context.shop_domain(), Some("shop-a.example.com"));
//! ```

use crate::auth::hmac::{verify, verify_any};
use crate::config::AppConfig;
use crate::webhooks::WebhookError;

/// HTTP header carrying the base64 HMAC-SHA256 of the body.
pub const HEADER_HMAC: &str = "X-Platform-Hmac-Sha256";

/// HTTP header carrying the event topic (e.g. `orders/create`).
pub const HEADER_TOPIC: &str = "X-Platform-Topic";

/// HTTP header carrying the domain of the shop that triggered the event.
pub const HEADER_SHOP_DOMAIN: &str = "X-Platform-Shop-Domain";

/// HTTP header carrying the payload API version.
pub const HEADER_API_VERSION: &str = "X-Platform-Api-Version";

/// HTTP header carrying the delivery id, useful for idempotency.
pub const HEADER_WEBHOOK_ID: &str = "X-Platform-Webhook-Id";

/// An incoming webhook delivery.
///
/// The body is kept as the exact bytes received; it is never parsed or
/// re-serialized before verification.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    body: Vec<u8>,
    hmac_header: String,
    topic: Option<String>,
    shop_domain: Option<String>,
    api_version: Option<String>,
    webhook_id: Option<String>,
}

impl WebhookRequest {
    /// Creates a webhook request from the body and header values.
    #[must_use]
    pub fn new(
        body: Vec<u8>,
        hmac_header: String,
        topic: Option<String>,
        shop_domain: Option<String>,
        api_version: Option<String>,
        webhook_id: Option<String>,
    ) -> Self {
        Self {
            body,
            hmac_header,
            topic,
            shop_domain,
            api_version,
            webhook_id,
        }
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the signature header value (empty if the header was absent).
    #[must_use]
    pub fn hmac_header(&self) -> &str {
        &self.hmac_header
    }

    /// Returns the topic header value, if present.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Returns the shop domain header value, if present.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    /// Returns the API version header value, if present.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Returns the webhook ID header value, if present.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

/// Metadata of a webhook whose signature has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookContext {
    topic: String,
    shop_domain: Option<String>,
    api_version: Option<String>,
    webhook_id: Option<String>,
}

impl WebhookContext {
    /// Returns the topic as received, or an empty string if absent.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the shop domain, if present.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    /// Returns the API version, if present.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Returns the webhook ID, if present.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

/// Verifies a body against a single secret.
///
/// ```rust
/// use storefront_auth::webhooks::verify_hmac;
/// use storefront_auth::auth::hmac::compute_signature_base64;
///
/// let body = b"webhook payload";
/// let hmac = compute_signature_base64(body, "my-secret-key");
///
/// assert!(verify_hmac(body, &hmac, "my-secret-key"));
/// assert!(!verify_hmac(body, "invalid", "my-secret-key"));
/// ```
#[must_use]
pub fn verify_hmac(raw_body: &[u8], hmac_header: &str, secret: &str) -> bool {
    verify(secret, raw_body, hmac_header)
}

/// Verifies a webhook request and returns the verified context.
///
/// The primary secret is tried first, then the old secret if one is
/// configured.
///
/// # Errors
///
/// Returns [`WebhookError::SignatureMismatch`] if no secret verifies.
pub fn verify_webhook(
    config: &AppConfig,
    request: &WebhookRequest,
) -> Result<WebhookContext, WebhookError> {
    let verified = verify_any(
        config.secrets().map(AsRef::<str>::as_ref),
        request.body(),
        request.hmac_header(),
    );

    if !verified {
        return Err(WebhookError::SignatureMismatch);
    }

    Ok(WebhookContext {
        topic: request.topic().unwrap_or_default().to_string(),
        shop_domain: request.shop_domain.clone(),
        api_version: request.api_version.clone(),
        webhook_id: request.webhook_id.clone(),
    })
}
