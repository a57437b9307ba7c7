//! Inbound webhook authentication.
//!
//! The platform signs every webhook body with the app's shared secret and
//! sends the base64 HMAC-SHA256 in [`HEADER_HMAC`]. This module:
//!
//! - [`WebhookRequest`]: the delivery as received (raw body plus headers)
//! - [`verify_webhook`]: signature check with key-rotation fallback
//! - [`WebhookReceiver`]: verifies and dispatches to a [`WebhookHandler`]
//! - [`WebhookError`]: verification failure
//!
//! The body is never parsed before its signature has been checked.

mod errors;
mod receiver;
mod verification;

pub use errors::WebhookError;
pub use receiver::{
    LoggingWebhookHandler, RejectReason, WebhookHandler, WebhookOutcome, WebhookReceiver,
};
pub use verification::{
    verify_hmac, verify_webhook, WebhookContext, WebhookRequest, HEADER_API_VERSION,
    HEADER_HMAC, HEADER_SHOP_DOMAIN, HEADER_TOPIC, HEADER_WEBHOOK_ID,
};
