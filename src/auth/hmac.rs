//! HMAC-SHA256 signatures for webhooks and OAuth callbacks.
//!
//! The platform signs two things with the app's shared secret:
//!
//! - webhook bodies, as base64 in the `X-Platform-Hmac-Sha256` header
//!   ([`verify`], [`compute_signature_base64`]);
//! - OAuth callback query strings, as lowercase hex in the `hmac` parameter
//!   ([`compute_signature`]).
//!
//! # Security
//!
//! Signatures are always computed over the exact bytes received; never
//! re-serialize a JSON body before verifying it. Every comparison goes
//! through [`constant_time_compare`].
//!
//! # Example
//!
//! ```rust
//! use storefront_auth::auth::hmac::{compute_signature_base64, verify};
//!
//! let body = br#"{"id":1}"#;
//! let signature = compute_signature_base64(body, "s3cret");
//!
//! assert!(verify("s3cret", body, &signature));
//! assert!(!verify("s3cret", body, "garbage"));
//! ```

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn mac_bytes(message: &[u8], secret: &str) -> [u8; 32] {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);

    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Computes a lowercase hex HMAC-SHA256 of `message`.
///
/// ```rust
/// use storefront_auth::auth::hmac::compute_signature;
///
/// assert_eq!(
///     compute_signature("message", "key"),
///     "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
/// );
/// ```
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> String {
    hex::encode(mac_bytes(message.as_bytes(), secret))
}

/// Computes a base64 (standard alphabet, padded) HMAC-SHA256 of raw bytes.
#[must_use]
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    BASE64_STANDARD.encode(mac_bytes(message, secret))
}

/// Compares two strings in time independent of where they first differ.
///
/// Strings of different length compare unequal; only the length itself is
/// observable in that case.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Verifies a base64 webhook signature over `raw_body`.
///
/// Returns `false` for an empty body, an empty or malformed signature, or
/// any mismatch. Never panics.
#[must_use]
pub fn verify(secret: &str, raw_body: &[u8], provided_signature: &str) -> bool {
    if raw_body.is_empty() || provided_signature.trim().is_empty() {
        return false;
    }
    let computed = compute_signature_base64(raw_body, secret);
    constant_time_compare(&computed, provided_signature.trim())
}

/// Verifies a base64 webhook signature against several secrets.
///
/// Used during key rotation: the primary secret is listed first and the
/// previous one second.
#[must_use]
pub fn verify_any<'a, I>(secrets: I, raw_body: &[u8], provided_signature: &str) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    secrets
        .into_iter()
        .any(|secret| verify(secret, raw_body, provided_signature))
}
