//! Session persistence.
//!
//! [`SessionStore`] maps a shop to the [`Session`] established for it. The
//! OAuth coordinator writes through it once a callback has been verified;
//! nothing else writes to it.
//!
//! The trait is object-safe, so a persistent backend can be swapped in
//! behind `Arc<dyn SessionStore>` without changing callers.
//! [`InMemorySessionStore`] is the bundled implementation.

mod memory;

pub use memory::InMemorySessionStore;

use crate::auth::Session;
use crate::config::ShopDomain;
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a [`SessionStore`] backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("Session store unavailable: {reason}")]
    Unavailable {
        /// Backend-specific description. Must not contain token values.
        reason: String,
    },
}

/// Key-value storage of sessions by shop.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the session for `shop`.
    ///
    /// Returns `Ok(None)` if no handshake has completed for the shop.
    async fn get(&self, shop: &ShopDomain) -> Result<Option<Session>, StoreError>;

    /// Saves `session` for `shop`, replacing any previous one.
    async fn put(&self, shop: &ShopDomain, session: Session) -> Result<(), StoreError>;

    /// Removes the session for `shop`. Removing a missing session succeeds.
    async fn delete(&self, shop: &ShopDomain) -> Result<(), StoreError>;
}

// Verify StoreError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StoreError>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_store_error_message() {
        let error = StoreError::Unavailable {
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Session store unavailable: connection refused"
        );
    }

    #[test]
    fn test_session_store_is_object_safe() {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        drop(store);
    }
}
