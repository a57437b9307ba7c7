//! Authentication types.
//!
//! # Overview
//!
//! - [`hmac`]: HMAC-SHA256 signing and constant-time verification
//! - [`AuthScopes`]: a set of OAuth scopes with implied scope handling
//! - [`Session`]: the per-shop credential produced by a verified handshake
//! - [`oauth`]: the authorization-code handshake coordinator
//!
//! # Session Types
//!
//! - **Offline sessions**: app-level tokens that don't expire. Used for
//!   background work and webhook follow-ups.
//! - **Online sessions**: tokens bound to the approving merchant user; they
//!   carry an expiry.
//!
//! # Example
//!
//! ```rust
//! use storefront_auth::{Session, ShopDomain};
//! use storefront_auth::auth::AccessToken;
//!
//! let session = Session::new(
//!     ShopDomain::new("my-store.example.com").unwrap(),
//!     AccessToken::new("access-token"),
//!     "read_products".parse().unwrap(),
//!     false,
//!     None,
//! );
//!
//! // Offline sessions don't expire
//! assert!(!session.expired());
//! ```

pub mod hmac;
pub mod oauth;
mod scopes;
pub mod session;

pub use scopes::AuthScopes;
pub use session::{AccessToken, AccessTokenResponse, Session};
