//! The OAuth handshake state machine.
//!
//! ```text
//! NotStarted -> AuthorizationRequested -> CallbackReceived -> SessionEstablished
//!                                                          \-> Failed
//! ```

use crate::auth::oauth::auth_query::{validate_hmac, AuthQuery};
use crate::auth::oauth::begin_auth::{begin_auth, BeginAuthResult};
use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::pending::PendingStates;
use crate::auth::oauth::state::StateParam;
use crate::auth::oauth::token_exchange::{HttpTokenExchanger, TokenExchangeRequest, TokenExchanger};
use crate::auth::{AuthScopes, Session};
use crate::config::{AppConfig, ShopDomain};
use crate::store::SessionStore;
use std::fmt;
use std::sync::Arc;

/// Handshake progress for one shop, as reported in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeState {
    /// No authorization has been requested.
    NotStarted,
    /// `begin` issued a state and authorization URL.
    AuthorizationRequested,
    /// The platform redirected back to the callback.
    CallbackReceived,
    /// A verified session was stored.
    SessionEstablished,
    /// The handshake was aborted.
    Failed,
}

impl HandshakeState {
    /// Returns the snake_case name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::AuthorizationRequested => "authorization_requested",
            Self::CallbackReceived => "callback_received",
            Self::SessionEstablished => "session_established",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives the authorization-code handshake.
///
/// The coordinator owns the pending-state table and writes sessions through
/// the injected [`SessionStore`]. Cloning yields a handle to the same table.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use storefront_auth::{AppConfig, InMemorySessionStore};
/// use storefront_auth::auth::oauth::{AuthQuery, OAuthCoordinator};
///
/// # async fn run(config: AppConfig, query: AuthQuery) -> Result<(), Box<dyn std::error::Error>> {
/// let coordinator = OAuthCoordinator::with_http_exchanger(
///     Arc::new(config),
///     Arc::new(InMemorySessionStore::new()),
/// )?;
///
/// let begin = coordinator.begin("shop-a.example.com")?;
/// // redirect the merchant to begin.auth_url, then on the callback:
/// let session = coordinator.callback(&query).await?;
/// println!("authorized {}", session.shop);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OAuthCoordinator {
    config: Arc<AppConfig>,
    store: Arc<dyn SessionStore>,
    exchanger: Arc<dyn TokenExchanger>,
    pending: PendingStates,
}

impl OAuthCoordinator {
    /// Creates a coordinator with explicit collaborators.
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn SessionStore>,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> Self {
        let pending = PendingStates::new(config.state_ttl(), config.max_pending_states());
        Self {
            config,
            store,
            exchanger,
            pending,
        }
    }

    /// Creates a coordinator that exchanges codes over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_http_exchanger(
        config: Arc<AppConfig>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, reqwest::Error> {
        let exchanger = HttpTokenExchanger::new(config.token_exchange_timeout())?;
        Ok(Self::new(config, store, Arc::new(exchanger)))
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the number of issued states not yet consumed.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Starts a handshake for `shop` using the configured access mode and
    /// scopes.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidShop`] if `shop` is empty or malformed,
    /// or [`OAuthError::TooManyPendingAuthorizations`] if too many handshakes
    /// await a callback. Nothing is recorded in either case.
    pub fn begin(&self, shop: &str) -> Result<BeginAuthResult, OAuthError> {
        self.begin_with_options(shop, self.config.online_tokens(), None)
    }

    /// Starts a handshake with an explicit access mode and optional scope
    /// override.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidShop`] if `shop` is empty or malformed,
    /// or [`OAuthError::TooManyPendingAuthorizations`] if the pending-state
    /// table is full.
    pub fn begin_with_options(
        &self,
        shop: &str,
        is_online: bool,
        scope_override: Option<&AuthScopes>,
    ) -> Result<BeginAuthResult, OAuthError> {
        let shop_domain = self.config.parse_shop(shop).map_err(|_| {
            tracing::warn!(
                handshake = %HandshakeState::NotStarted,
                "Rejected authorization request for invalid shop"
            );
            OAuthError::InvalidShop {
                shop: shop.to_string(),
            }
        })?;

        let result = begin_auth(&self.config, &shop_domain, is_online, scope_override);
        self.pending
            .insert(result.state.clone(), shop_domain.clone(), is_online)
            .map_err(|error| {
                tracing::warn!(
                    shop = %shop_domain,
                    limit = self.pending.capacity(),
                    handshake = %HandshakeState::NotStarted,
                    "Rejected authorization request, too many pending"
                );
                error
            })?;

        tracing::info!(
            shop = %shop_domain,
            is_online,
            handshake = %HandshakeState::AuthorizationRequested,
            "Authorization requested"
        );

        Ok(result)
    }

    /// Completes a handshake from the platform's callback query.
    ///
    /// Order of checks:
    ///
    /// 1. the HMAC must verify; otherwise nothing else happens;
    /// 2. the state is consumed and must have been issued for this shop and
    ///    not have expired;
    /// 3. the code is exchanged for a token within the configured timeout;
    /// 4. the session is stored under the shop.
    ///
    /// Steps 3 and 4 run on a spawned task, so dropping the returned future
    /// does not abandon a code that has already been consumed.
    ///
    /// # Errors
    ///
    /// See [`OAuthError`]. No session is stored on any error.
    pub async fn callback(&self, query: &AuthQuery) -> Result<Session, OAuthError> {
        let result = self.verify_and_complete(query).await;
        if let Err(error) = &result {
            let shop = query.shop().unwrap_or_default();
            if error.is_security_event() {
                tracing::warn!(
                    shop,
                    handshake = %HandshakeState::Failed,
                    error = %error,
                    "Rejected OAuth callback"
                );
            } else {
                tracing::error!(
                    shop,
                    handshake = %HandshakeState::Failed,
                    error = %error,
                    "OAuth callback failed"
                );
            }
        }
        result
    }

    async fn verify_and_complete(&self, query: &AuthQuery) -> Result<Session, OAuthError> {
        if !validate_hmac(query, &self.config) {
            return Err(OAuthError::SignatureMismatch);
        }

        let state = query
            .state()
            .filter(|s| !s.is_empty())
            .ok_or(OAuthError::StateMismatch)?;
        let pending = self
            .pending
            .consume(&StateParam::from_raw(state))
            .ok_or(OAuthError::StateMismatch)?;

        let shop = self.callback_shop(query)?;
        if shop != pending.shop {
            return Err(OAuthError::StateMismatch);
        }

        tracing::debug!(
            shop = %shop,
            handshake = %HandshakeState::CallbackReceived,
            "Callback verified"
        );

        let code = query
            .code()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| OAuthError::InvalidCallback {
                reason: "Missing authorization code".to_string(),
            })?;

        let request = TokenExchangeRequest {
            client_id: self.config.api_key().as_ref().to_string(),
            client_secret: self.config.api_secret_key().as_ref().to_string(),
            code: code.to_string(),
        };

        let task = tokio::spawn(exchange_and_store(
            Arc::clone(&self.exchanger),
            Arc::clone(&self.store),
            shop,
            request,
            pending.is_online,
            self.config.token_exchange_timeout(),
        ));

        let session = task.await.map_err(|e| OAuthError::TokenExchangeFailed {
            status: 0,
            message: format!("Token exchange task failed: {e}"),
        })??;

        tracing::info!(
            shop = %session.shop,
            session_id = %session.id,
            handshake = %HandshakeState::SessionEstablished,
            "Session established"
        );

        Ok(session)
    }

    fn callback_shop(&self, query: &AuthQuery) -> Result<ShopDomain, OAuthError> {
        let raw = query.shop().ok_or_else(|| OAuthError::InvalidCallback {
            reason: "Missing shop parameter".to_string(),
        })?;
        self.config
            .parse_shop(raw)
            .map_err(|_| OAuthError::InvalidCallback {
                reason: format!("Invalid shop domain: {raw}"),
            })
    }
}

async fn exchange_and_store(
    exchanger: Arc<dyn TokenExchanger>,
    store: Arc<dyn SessionStore>,
    shop: ShopDomain,
    request: TokenExchangeRequest,
    is_online: bool,
    timeout: std::time::Duration,
) -> Result<Session, OAuthError> {
    let response = tokio::time::timeout(timeout, exchanger.exchange(&shop, &request))
        .await
        .map_err(|_| OAuthError::TokenExchangeFailed {
            status: 0,
            message: "Token endpoint timed out".to_string(),
        })??;

    let session = Session::from_access_token_response(shop, &response, is_online);
    store.put(&session.shop, session.clone()).await?;
    Ok(session)
}

impl fmt::Debug for OAuthCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCoordinator")
            .field("config", &self.config)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

// Verify OAuthCoordinator is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthCoordinator>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::AccessTokenResponse;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};
    use crate::store::{InMemorySessionStore, StoreError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticExchanger {
        token: &'static str,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StaticExchanger {
        fn new(token: &'static str) -> Self {
            Self {
                token,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TokenExchanger for StaticExchanger {
        async fn exchange(
            &self,
            _shop: &ShopDomain,
            request: &TokenExchangeRequest,
        ) -> Result<AccessTokenResponse, OAuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.client_secret, "test-secret");
            tokio::time::sleep(self.delay).await;
            Ok(serde_json::from_value(serde_json::json!({
                "access_token": self.token,
                "scope": "read_products"
            }))
            .unwrap())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl SessionStore for FailingStore {
        async fn get(&self, _shop: &ShopDomain) -> Result<Option<Session>, StoreError> {
            Ok(None)
        }

        async fn put(&self, _shop: &ShopDomain, _session: Session) -> Result<(), StoreError> {
            Err(StoreError::Unavailable {
                reason: "down".to_string(),
            })
        }

        async fn delete(&self, _shop: &ShopDomain) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn create_test_config() -> AppConfig {
        AppConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .host(HostUrl::new("https://myapp.example.com").unwrap())
            .scopes("read_products".parse().unwrap())
            .token_exchange_timeout(Duration::from_millis(200))
            .build()
            .unwrap()
    }

    fn coordinator(
        store: Arc<dyn SessionStore>,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> OAuthCoordinator {
        OAuthCoordinator::new(Arc::new(create_test_config()), store, exchanger)
    }

    fn signed_query(shop: &str, state: &str) -> AuthQuery {
        AuthQuery::new("auth-code", shop, "1700000000", state, "aG9zdA", "").signed("test-secret")
    }

    #[tokio::test]
    async fn test_begin_then_callback_establishes_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let coordinator = coordinator(store.clone(), Arc::new(StaticExchanger::new("token-1")));

        let begin = coordinator.begin("shop-a.example.com").unwrap();
        assert_eq!(coordinator.pending_count(), 1);

        let query = signed_query("shop-a.example.com", begin.state.as_ref());
        let session = coordinator.callback(&query).await.unwrap();

        assert_eq!(session.shop.as_ref(), "shop-a.example.com");
        assert_eq!(session.access_token.expose(), "token-1");
        assert_eq!(coordinator.pending_count(), 0);

        let stored = store.get(&session.shop).await.unwrap().unwrap();
        assert_eq!(stored, session);
    }

    #[tokio::test]
    async fn test_begin_rejects_invalid_shop_without_recording() {
        let coordinator = coordinator(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(StaticExchanger::new("token")),
        );

        for shop in ["", "   ", "not a shop", "-bad.example.com"] {
            let result = coordinator.begin(shop);
            assert!(matches!(result, Err(OAuthError::InvalidShop { .. })));
        }
        assert_eq!(coordinator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_signature_mismatch_leaves_state_pending() {
        let exchanger = Arc::new(StaticExchanger::new("token"));
        let coordinator = coordinator(Arc::new(InMemorySessionStore::new()), exchanger.clone());
        let begin = coordinator.begin("shop-a.example.com").unwrap();

        let forged = AuthQuery::new(
            "auth-code",
            "shop-a.example.com",
            "1700000000",
            begin.state.as_ref(),
            "aG9zdA",
            "",
        )
        .signed("wrong-secret");

        assert_eq!(
            coordinator.callback(&forged).await.unwrap_err(),
            OAuthError::SignatureMismatch
        );
        assert_eq!(coordinator.pending_count(), 1);
        assert_eq!(exchanger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reused_state_is_rejected() {
        let coordinator = coordinator(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(StaticExchanger::new("token")),
        );
        let begin = coordinator.begin("shop-a.example.com").unwrap();
        let query = signed_query("shop-a.example.com", begin.state.as_ref());

        assert!(coordinator.callback(&query).await.is_ok());
        assert_eq!(
            coordinator.callback(&query).await.unwrap_err(),
            OAuthError::StateMismatch
        );
    }

    #[tokio::test]
    async fn test_unknown_or_missing_state_is_rejected() {
        let coordinator = coordinator(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(StaticExchanger::new("token")),
        );

        let unknown = signed_query("shop-a.example.com", "never-issued");
        assert_eq!(
            coordinator.callback(&unknown).await.unwrap_err(),
            OAuthError::StateMismatch
        );

        let missing = AuthQuery::from_params([("shop", "shop-a.example.com"), ("code", "c")])
            .signed("test-secret");
        assert_eq!(
            coordinator.callback(&missing).await.unwrap_err(),
            OAuthError::StateMismatch
        );
    }

    #[tokio::test]
    async fn test_state_bound_to_other_shop_is_consumed_and_rejected() {
        let coordinator = coordinator(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(StaticExchanger::new("token")),
        );
        let begin = coordinator.begin("shop-a.example.com").unwrap();

        let other = signed_query("shop-b.example.com", begin.state.as_ref());
        assert_eq!(
            coordinator.callback(&other).await.unwrap_err(),
            OAuthError::StateMismatch
        );

        let original = signed_query("shop-a.example.com", begin.state.as_ref());
        assert_eq!(
            coordinator.callback(&original).await.unwrap_err(),
            OAuthError::StateMismatch
        );
    }

    #[tokio::test]
    async fn test_expired_state_is_rejected() {
        let config = AppConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .host(HostUrl::new("https://myapp.example.com").unwrap())
            .state_ttl(Duration::from_millis(10))
            .build()
            .unwrap();
        let coordinator = OAuthCoordinator::new(
            Arc::new(config),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(StaticExchanger::new("token")),
        );
        let begin = coordinator.begin("shop-a.example.com").unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let query = signed_query("shop-a.example.com", begin.state.as_ref());
        assert_eq!(
            coordinator.callback(&query).await.unwrap_err(),
            OAuthError::StateMismatch
        );
    }

    #[tokio::test]
    async fn test_begin_is_refused_once_pending_table_is_full() {
        let config = AppConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .host(HostUrl::new("https://myapp.example.com").unwrap())
            .max_pending_states(2)
            .build()
            .unwrap();
        let coordinator = OAuthCoordinator::new(
            Arc::new(config),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(StaticExchanger::new("token")),
        );

        let first = coordinator.begin("shop-a.example.com").unwrap();
        coordinator.begin("shop-b.example.com").unwrap();
        assert_eq!(
            coordinator.begin("shop-c.example.com").unwrap_err(),
            OAuthError::TooManyPendingAuthorizations { limit: 2 }
        );
        assert_eq!(coordinator.pending_count(), 2);

        let query = signed_query("shop-a.example.com", first.state.as_ref());
        coordinator.callback(&query).await.unwrap();
        assert!(coordinator.begin("shop-c.example.com").is_ok());
    }

    #[tokio::test]
    async fn test_missing_code_is_invalid_callback() {
        let store = Arc::new(InMemorySessionStore::new());
        let coordinator = coordinator(store.clone(), Arc::new(StaticExchanger::new("token")));
        let begin = coordinator.begin("shop-a.example.com").unwrap();

        let query = AuthQuery::from_params([
            ("shop", "shop-a.example.com"),
            ("state", begin.state.as_ref()),
        ])
        .signed("test-secret");

        assert!(matches!(
            coordinator.callback(&query).await,
            Err(OAuthError::InvalidCallback { .. })
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_slow_exchange_times_out_without_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let exchanger = Arc::new(StaticExchanger {
            delay: Duration::from_secs(5),
            ..StaticExchanger::new("token")
        });
        let coordinator = coordinator(store.clone(), exchanger);
        let begin = coordinator.begin("shop-a.example.com").unwrap();

        let query = signed_query("shop-a.example.com", begin.state.as_ref());
        assert!(matches!(
            coordinator.callback(&query).await,
            Err(OAuthError::TokenExchangeFailed { status: 0, .. })
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_store_unavailable() {
        let coordinator = coordinator(Arc::new(FailingStore), Arc::new(StaticExchanger::new("token")));
        let begin = coordinator.begin("shop-a.example.com").unwrap();

        let query = signed_query("shop-a.example.com", begin.state.as_ref());
        assert!(matches!(
            coordinator.callback(&query).await,
            Err(OAuthError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_dropped_callback_still_stores_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let exchanger = Arc::new(StaticExchanger {
            delay: Duration::from_millis(50),
            ..StaticExchanger::new("token")
        });
        let coordinator = coordinator(store.clone(), exchanger);
        let begin = coordinator.begin("shop-a.example.com").unwrap();
        let query = signed_query("shop-a.example.com", begin.state.as_ref());

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), coordinator.callback(&query)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        let shop = ShopDomain::new("shop-a.example.com").unwrap();
        assert!(store.get(&shop).await.unwrap().is_some());
    }

    #[test]
    fn test_handshake_state_names() {
        assert_eq!(HandshakeState::NotStarted.to_string(), "not_started");
        assert_eq!(
            HandshakeState::SessionEstablished.to_string(),
            "session_established"
        );
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let coordinator = coordinator(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(StaticExchanger::new("token")),
        );
        assert!(!format!("{coordinator:?}").contains("test-secret"));
    }
}
