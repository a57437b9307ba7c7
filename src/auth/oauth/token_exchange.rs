//! Authorization code exchange against the platform token endpoint.

use crate::auth::oauth::error::OAuthError;
use crate::auth::session::AccessTokenResponse;
use crate::config::ShopDomain;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Body posted to the token endpoint.
#[derive(Clone, Serialize)]
pub struct TokenExchangeRequest {
    /// The app's client key.
    pub client_id: String,
    /// The app's shared secret.
    pub client_secret: String,
    /// The one-time authorization code from the callback.
    pub code: String,
}

impl fmt::Debug for TokenExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchangeRequest")
            .field("client_id", &self.client_id)
            .field("client_secret", &"*****")
            .field("code", &self.code)
            .finish()
    }
}

/// Exchanges an authorization code for an access token.
///
/// The coordinator only depends on this trait; [`HttpTokenExchanger`] is the
/// production implementation.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Performs the exchange for `shop`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::TokenExchangeFailed`] on a network error, a
    /// non-success status, or an unparsable body.
    async fn exchange(
        &self,
        shop: &ShopDomain,
        request: &TokenExchangeRequest,
    ) -> Result<AccessTokenResponse, OAuthError>;
}

/// Token exchanger that POSTs JSON to `https://{shop}/admin/oauth/access_token`.
#[derive(Clone, Debug)]
pub struct HttpTokenExchanger {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpTokenExchanger {
    /// Path of the token endpoint on the shop's domain.
    pub const TOKEN_PATH: &'static str = "/admin/oauth/access_token";

    /// Creates an exchanger whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("storefront-auth/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: None,
        })
    }

    /// Creates an exchanger that sends every request to `base_url` instead of
    /// the shop's domain. Used to point the exchange at a local mock.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut exchanger = Self::new(timeout)?;
        exchanger.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        Ok(exchanger)
    }

    /// Returns the token endpoint URL for `shop`.
    #[must_use]
    pub fn token_url(&self, shop: &ShopDomain) -> String {
        match &self.base_url {
            Some(base) => format!("{base}{}", Self::TOKEN_PATH),
            None => format!("https://{shop}{}", Self::TOKEN_PATH),
        }
    }
}

#[async_trait]
impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(
        &self,
        shop: &ShopDomain,
        request: &TokenExchangeRequest,
    ) -> Result<AccessTokenResponse, OAuthError> {
        let response = self
            .client
            .post(self.token_url(shop))
            .json(request)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed {
                status: 0,
                message: if e.is_timeout() {
                    "Token endpoint timed out".to_string()
                } else {
                    format!("Network error: {}", e.without_url())
                },
            })?;

        let status = response.status().as_u16();

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchangeFailed {
                status,
                message: error_body,
            });
        }

        let token_response: AccessTokenResponse =
            response
                .json()
                .await
                .map_err(|e| OAuthError::TokenExchangeFailed {
                    status,
                    message: format!("Failed to parse token response: {}", e.without_url()),
                })?;

        if token_response.access_token.is_empty() {
            return Err(OAuthError::TokenExchangeFailed {
                status,
                message: "Token response contained an empty access token".to_string(),
            });
        }

        Ok(token_response)
    }
}
