//! Authenticates webhook deliveries and forwards verified ones.

use crate::config::AppConfig;
use crate::webhooks::verification::{verify_webhook, WebhookContext, WebhookRequest};
use crate::webhooks::WebhookError;
use async_trait::async_trait;
use std::sync::Arc;

/// Why a delivery was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The signature did not verify under any configured secret.
    SignatureMismatch,
}

impl From<WebhookError> for RejectReason {
    fn from(error: WebhookError) -> Self {
        match error {
            WebhookError::SignatureMismatch => Self::SignatureMismatch,
        }
    }
}

/// Result of receiving one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The signature verified and the handler was invoked.
    Accepted,
    /// The delivery was dropped before the body was looked at.
    Rejected(RejectReason),
}

impl WebhookOutcome {
    /// Returns `true` for [`WebhookOutcome::Accepted`].
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Processes verified webhook payloads.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Called once per verified delivery with the exact bytes received.
    async fn handle(&self, context: &WebhookContext, body: &[u8]);
}

/// Handler that only logs what arrived.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingWebhookHandler;

#[async_trait]
impl WebhookHandler for LoggingWebhookHandler {
    async fn handle(&self, context: &WebhookContext, body: &[u8]) {
        tracing::info!(
            topic = context.topic(),
            shop = context.shop_domain().unwrap_or_default(),
            webhook_id = context.webhook_id().unwrap_or_default(),
            payload_bytes = body.len(),
            "Webhook received"
        );
    }
}

/// Verifies deliveries with the configured secrets and dispatches them.
///
/// The receiver has no access to sessions; a forged delivery can at most
/// cost one HMAC computation.
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::sync::Arc;
/// use storefront_auth::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
/// use storefront_auth::auth::hmac::compute_signature_base64;
/// use storefront_auth::webhooks::{WebhookOutcome, WebhookReceiver, WebhookRequest};
///
/// let config = AppConfig::builder()
///     .api_key(ApiKey::new("key").unwrap())
///     .api_secret_key(ApiSecretKey::new("s3cret").unwrap())
///     .host(HostUrl::new("https://app.example.com").unwrap())
///     .build()
///     .unwrap();
/// let receiver = WebhookReceiver::new(Arc::new(config));
///
/// let body = br#"{"id":1}"#.to_vec();
/// let signature = compute_signature_base64(&body, "s3cret");
/// let request = WebhookRequest::new(body, signature, None, None, None, None);
///
/// assert_eq!(receiver.receive(&request).await, WebhookOutcome::Accepted);
/// # }
/// ```
#[derive(Clone)]
pub struct WebhookReceiver {
    config: Arc<AppConfig>,
    handler: Arc<dyn WebhookHandler>,
}

impl WebhookReceiver {
    /// Creates a receiver that logs verified deliveries.
    #[must_use]
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self::with_handler(config, Arc::new(LoggingWebhookHandler))
    }

    /// Creates a receiver that forwards verified deliveries to `handler`.
    #[must_use]
    pub fn with_handler(config: Arc<AppConfig>, handler: Arc<dyn WebhookHandler>) -> Self {
        Self { config, handler }
    }

    /// Verifies `request` and, if it is authentic, passes it to the handler.
    pub async fn receive(&self, request: &WebhookRequest) -> WebhookOutcome {
        match verify_webhook(&self.config, request) {
            Ok(context) => {
                self.handler.handle(&context, request.body()).await;
                WebhookOutcome::Accepted
            }
            Err(error) => {
                tracing::warn!(
                    topic = request.topic().unwrap_or_default(),
                    shop = request.shop_domain().unwrap_or_default(),
                    payload_bytes = request.body().len(),
                    "Rejected webhook: {error}"
                );
                WebhookOutcome::Rejected(error.into())
            }
        }
    }
}

impl std::fmt::Debug for WebhookReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookReceiver").finish_non_exhaustive()
    }
}

// Verify WebhookReceiver is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookReceiver>();
};
