//! OAuth 2.0 authorization-code handshake.
//!
//! 1. **Authorization** ([`OAuthCoordinator::begin`]): validate the shop,
//!    record a fresh [`StateParam`], and return the platform authorization
//!    URL to redirect the merchant to.
//!
//! 2. **Callback** ([`OAuthCoordinator::callback`]): verify the query HMAC,
//!    consume the state, exchange the code through a [`TokenExchanger`], and
//!    store the resulting [`Session`](crate::auth::Session).
//!
//! # Security Features
//!
//! - **HMAC Validation**: every callback is verified with HMAC-SHA256 before
//!   anything else is looked at
//! - **CSRF Protection**: states are random, single-use and expire
//! - **Constant-Time Comparison**: signatures are compared with `subtle`
//! - **Key Rotation Support**: the old secret is accepted while configured
//!
//! # Online vs Offline Access Tokens
//!
//! - **Online tokens** (`is_online = true`): bound to the merchant user who
//!   approved the app; they expire.
//! - **Offline tokens** (`is_online = false`): app-level; they do not expire.

mod auth_query;
mod begin_auth;
mod coordinator;
mod error;
mod pending;
mod state;
mod token_exchange;

pub use auth_query::{validate_hmac, AuthQuery};
pub use begin_auth::{begin_auth, BeginAuthResult};
pub use coordinator::{HandshakeState, OAuthCoordinator};
pub use error::OAuthError;
pub use pending::{PendingAuthorization, PendingStates};
pub use state::StateParam;
pub use token_exchange::{HttpTokenExchanger, TokenExchangeRequest, TokenExchanger};
