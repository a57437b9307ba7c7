//! OAuth handshake errors.
//!
//! # Error Types
//!
//! - [`OAuthError::InvalidShop`]: the shop identifier is empty or malformed
//! - [`OAuthError::SignatureMismatch`]: callback HMAC did not verify
//! - [`OAuthError::StateMismatch`]: callback state is unknown, reused or expired
//! - [`OAuthError::TooManyPendingAuthorizations`]: the pending-state table is full
//! - [`OAuthError::TokenExchangeFailed`]: the token endpoint call failed
//! - [`OAuthError::InvalidCallback`]: callback parameters are missing
//! - [`OAuthError::StoreUnavailable`]: the session could not be saved
//!
//! `Display` output is meant for logs and never contains secrets or tokens.
//! Redirects use [`OAuthError::public_message`] instead.
//!
//! # Example
//!
//! ```rust
//! use storefront_auth::auth::oauth::OAuthError;
//!
//! let error = OAuthError::SignatureMismatch;
//! assert_eq!(error.to_string(), "Callback signature validation failed");
//! assert_eq!(error.public_message(), "Authorization could not be verified");
//! ```

use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur during the OAuth handshake.
///
/// # Thread Safety
///
/// `OAuthError` is `Send + Sync`, making it safe to use across async boundaries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// The shop identifier is empty, malformed, or outside the configured
    /// platform suffix. Nothing was recorded.
    #[error("Invalid shop '{shop}'")]
    InvalidShop {
        /// The shop value that was provided.
        shop: String,
    },

    /// The callback's HMAC did not match any configured secret.
    ///
    /// The request may have been tampered with, or the secret is
    /// misconfigured. The pending state is left untouched.
    #[error("Callback signature validation failed")]
    SignatureMismatch,

    /// The callback's state is not pending: never issued, already consumed,
    /// expired, or issued for another shop.
    ///
    /// Deliberately carries no values so the state cannot leak into logs.
    #[error("State parameter is unknown, expired, or already used")]
    StateMismatch,

    /// Too many authorizations are awaiting a callback. Nothing was recorded.
    #[error("Too many pending authorizations (limit {limit})")]
    TooManyPendingAuthorizations {
        /// The configured cap.
        limit: usize,
    },

    /// The authorization code could not be exchanged for an access token.
    ///
    /// `status` is `0` when no HTTP response was received (network error or
    /// timeout).
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// The HTTP status code returned.
        status: u16,
        /// Description of the failure.
        message: String,
    },

    /// Callback parameters are missing or malformed.
    #[error("Invalid callback: {reason}")]
    InvalidCallback {
        /// Description of what's invalid about the callback.
        reason: String,
    },

    /// The session store rejected the new session.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl OAuthError {
    /// Returns a generic message safe to show the merchant.
    ///
    /// Verification failures share one message so the response does not
    /// reveal which check failed.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidShop { .. } => "Invalid shop",
            Self::SignatureMismatch | Self::StateMismatch | Self::InvalidCallback { .. } => {
                "Authorization could not be verified"
            }
            Self::TooManyPendingAuthorizations { .. } => {
                "Too many authorization requests, please try again later"
            }
            Self::TokenExchangeFailed { .. } => "Authorization failed, please try again",
            Self::StoreUnavailable(_) => "Internal error, please try again",
        }
    }

    /// Returns `true` for failures that indicate a forged or replayed request.
    #[must_use]
    pub const fn is_security_event(&self) -> bool {
        matches!(self, Self::SignatureMismatch | Self::StateMismatch)
    }
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};
