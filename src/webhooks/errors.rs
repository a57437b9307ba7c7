//! Webhook error types.

use thiserror::Error;

/// Error type for webhook verification.
///
/// # Example
///
/// ```rust
/// use storefront_auth::webhooks::WebhookError;
///
/// let error = WebhookError::SignatureMismatch;
/// assert_eq!(error.to_string(), "Webhook signature verification failed");
/// ```
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WebhookError {
    /// The `X-Platform-Hmac-Sha256` header did not match the body under any
    /// configured secret, or the header or body was empty.
    #[error("Webhook signature verification failed")]
    SignatureMismatch,
}

// Verify WebhookError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookError>();
};
