use crate::auth::Session;
use crate::config::ShopDomain;
use crate::store::{SessionStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory session store backed by a concurrent map.
///
/// Cloning yields another handle to the same map. Sessions are lost on
/// restart and are not shared across processes.
#[derive(Clone, Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<ShopDomain, Session>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.get(shop).map(|entry| entry.value().clone()))
    }

    async fn put(&self, shop: &ShopDomain, session: Session) -> Result<(), StoreError> {
        self.sessions.insert(shop.clone(), session);
        Ok(())
    }

    async fn delete(&self, shop: &ShopDomain) -> Result<(), StoreError> {
        self.sessions.remove(shop);
        Ok(())
    }
}
