//! # storefront-auth
//!
//! Webhook signature verification and OAuth handshake coordination for apps
//! built on a third-party e-commerce platform.
//!
//! ## Overview
//!
//! - Type-safe configuration via [`AppConfig`] and [`AppConfigBuilder`]
//! - HMAC-SHA256 signing and constant-time verification via [`auth::hmac`]
//! - Authorization-code handshake via [`auth::oauth::OAuthCoordinator`]
//! - Per-shop sessions behind the [`SessionStore`] trait
//! - Webhook authentication via [`webhooks::WebhookReceiver`]
//! - An axum router exposing all of the above via [`server::router`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use storefront_auth::{AppConfig, ApiKey, ApiSecretKey, HostUrl, InMemorySessionStore};
//! use storefront_auth::server::{router, AppState};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("client-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("s3cret").unwrap())
//!     .host(HostUrl::new("https://api.example.com").unwrap())
//!     .frontend_url(HostUrl::new("https://app.example.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .build()
//!     .unwrap();
//!
//! let state = AppState::new(Arc::new(config), Arc::new(InMemorySessionStore::new())).unwrap();
//! let app = router(state);
//! # drop(app);
//! ```
//!
//! ## Security
//!
//! - Signatures are computed over the exact bytes received.
//! - Every signature comparison is constant-time.
//! - States are random, single-use and expire.
//! - Secrets and access tokens mask themselves in `Debug` output and never
//!   appear in responses or redirect URLs.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod webhooks;

pub use auth::{AuthScopes, Session};
pub use config::{ApiKey, ApiSecretKey, AppConfig, AppConfigBuilder, HostUrl, ShopDomain};
pub use error::ConfigError;
pub use store::{InMemorySessionStore, SessionStore, StoreError};
