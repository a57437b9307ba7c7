//! HTTP surface.
//!
//! Translates requests into [`WebhookRequest`](crate::webhooks::WebhookRequest)
//! and [`AuthQuery`](crate::auth::oauth::AuthQuery) values and hands them to
//! the core; nothing below this module depends on axum.

mod handlers;

use crate::auth::oauth::OAuthCoordinator;
use crate::config::AppConfig;
use crate::store::SessionStore;
use crate::webhooks::WebhookReceiver;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Process-wide configuration.
    pub config: Arc<AppConfig>,
    /// OAuth handshake coordinator.
    pub coordinator: OAuthCoordinator,
    /// Webhook receiver.
    pub webhooks: WebhookReceiver,
}

impl AppState {
    /// Wires the coordinator and receiver around `config` and `store`, using
    /// the HTTPS token exchanger and the logging webhook handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn SessionStore>) -> Result<Self, reqwest::Error> {
        let coordinator = OAuthCoordinator::with_http_exchanger(Arc::clone(&config), store)?;
        let webhooks = WebhookReceiver::new(Arc::clone(&config));
        Ok(Self {
            config,
            coordinator,
            webhooks,
        })
    }
}

/// Builds the service router.
///
/// # Routes
///
/// - `GET /healthz` - liveness
/// - `POST /webhooks` - signed webhook deliveries
/// - `POST /` - legacy alias of `/webhooks`
/// - `POST /auth/begin` - start a handshake, returns the authorization URL
/// - `GET {callback_path}` - platform redirect target (default `/auth/callback`)
pub fn router(state: AppState) -> Router {
    let callback_path = state.config.callback_path().to_string();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/webhooks", post(handlers::webhook))
        .route("/", post(handlers::webhook))
        .route("/auth/begin", post(handlers::begin))
        .route(&callback_path, get(handlers::callback))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}
