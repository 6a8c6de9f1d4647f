//! OAuth install handshake for obtaining a shop's offline access token.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::instrument;

use super::AdminShopifyError;

type HmacSha256 = Hmac<Sha256>;

/// Offline access token for one shop.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct OAuthToken {
    /// Shop domain (e.g., acme.myshopify.com).
    pub shop: String,
    /// The access token for API calls.
    pub access_token: SecretString,
    /// Granted scopes, comma separated.
    pub scope: String,
    /// Unix timestamp when token was obtained.
    pub obtained_at: i64,
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// OAuth token response from Shopify.
#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    scope: String,
}

/// Client for the app's OAuth install flow.
///
/// Unlike [`AdminClient`](super::AdminClient) this is shop-agnostic: one
/// instance serves installs for every shop.
#[derive(Clone)]
pub struct OAuthClient {
    inner: Arc<OAuthClientInner>,
}

struct OAuthClientInner {
    client: reqwest::Client,
    api_key: String,
    api_secret: SecretString,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("api_key", &self.inner.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl OAuthClient {
    /// Create a new OAuth client.
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: &str, api_secret: SecretString) -> Self {
        Self {
            inner: Arc::new(OAuthClientInner {
                client,
                api_key: api_key.to_string(),
                api_secret,
            }),
        }
    }

    /// Get the app's API key (client id).
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    /// Generate the OAuth authorization URL for `shop`.
    ///
    /// Redirect the merchant to this URL to begin the install.
    #[must_use]
    pub fn authorization_url(
        &self,
        shop: &str,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> String {
        let scope = scopes.join(",");
        format!(
            "https://{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            shop,
            urlencoding::encode(&self.inner.api_key),
            urlencoding::encode(&scope),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an offline access token.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::OAuth` if the token exchange fails.
    /// Returns `AdminShopifyError::Http` if the HTTP request fails.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(
        &self,
        shop: &str,
        code: &str,
    ) -> Result<OAuthToken, AdminShopifyError> {
        let url = format!("https://{shop}/admin/oauth/access_token");

        let params = [
            ("client_id", self.inner.api_key.as_str()),
            ("client_secret", self.inner.api_secret.expose_secret()),
            ("code", code),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AdminShopifyError::OAuth(format!(
                "Token exchange failed: {text}"
            )));
        }

        let token_response: OAuthTokenResponse = response.json().await?;

        Ok(OAuthToken {
            shop: shop.to_string(),
            access_token: SecretString::from(token_response.access_token),
            scope: token_response.scope,
            obtained_at: chrono::Utc::now().timestamp(),
        })
    }

    /// Verify the `hmac` parameter of an OAuth callback.
    ///
    /// The message is every other parameter (except `signature`) as
    /// `key=value`, sorted by key and joined with `&`.
    #[must_use]
    pub fn verify_callback(&self, params: &[(String, String)]) -> bool {
        let Some(provided) = params
            .iter()
            .find(|(k, _)| k == "hmac")
            .map(|(_, v)| v.as_str())
        else {
            return false;
        };

        let mut pairs: Vec<(&str, &str)> = params
            .iter()
            .filter(|(k, _)| k != "hmac" && k != "signature")
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort_unstable();

        let message = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        verify_hex_hmac(&self.inner.api_secret, &message, provided)
    }
}

/// Constant-time check of a hex-encoded HMAC-SHA256 over `message`.
pub(crate) fn verify_hex_hmac(secret: &SecretString, message: &str, provided_hex: &str) -> bool {
    let Ok(provided) = hex::decode(provided_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&provided).is_ok()
}

/// Hex-encoded HMAC-SHA256 of `message`.
///
/// Returns `None` only if the key is rejected, which HMAC never does.
#[must_use]
pub fn sign_hex(secret: &SecretString, message: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()).ok()?;
    mac.update(message.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}
