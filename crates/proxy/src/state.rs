//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::config::ProxyConfig;
use crate::db::{RepositoryError, ShopSession, ShopSessionRepository};
use crate::shopify::{AdminClient, OAuthClient};
use crate::tenant::ShopDomain;

/// Sessions are re-read from the database after this long.
const SESSION_CACHE_TTL: Duration = Duration::from_secs(300);
const SESSION_CACHE_CAPACITY: u64 = 1000;
/// Pending installs must complete within this window.
const OAUTH_STATE_TTL: Duration = Duration::from_secs(600);
const OAUTH_STATE_CAPACITY: u64 = 10_000;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ProxyConfig,
    pool: PgPool,
    http: reqwest::Client,
    oauth: OAuthClient,
    sessions: Cache<String, ShopSession>,
    /// OAuth `state` nonce -> shop it was issued for.
    oauth_states: Cache<String, String>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ProxyConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.shopify.http_timeout)
            .user_agent(concat!("wholesale-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let oauth = OAuthClient::new(
            http.clone(),
            &config.shopify.api_key,
            config.shopify.api_secret.clone(),
        );

        let sessions = Cache::builder()
            .max_capacity(SESSION_CACHE_CAPACITY)
            .time_to_live(SESSION_CACHE_TTL)
            .build();

        let oauth_states = Cache::builder()
            .max_capacity(OAUTH_STATE_CAPACITY)
            .time_to_live(OAUTH_STATE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                http,
                oauth,
                sessions,
                oauth_states,
            }),
        })
    }

    /// Get a reference to the proxy configuration.
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the OAuth client.
    #[must_use]
    pub fn oauth(&self) -> &OAuthClient {
        &self.inner.oauth
    }

    /// Pending OAuth `state` values.
    #[must_use]
    pub fn oauth_states(&self) -> &Cache<String, String> {
        &self.inner.oauth_states
    }

    /// Load a shop's offline session, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lookup query fails.
    pub async fn shop_session(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<ShopSession>, RepositoryError> {
        if let Some(session) = self.inner.sessions.get(shop.as_str()).await {
            return Ok(Some(session));
        }

        let session = ShopSessionRepository::new(self.pool())
            .get_by_shop(shop.as_str())
            .await?;

        if let Some(session) = &session {
            self.inner
                .sessions
                .insert(shop.as_str().to_string(), session.clone())
                .await;
        }

        Ok(session)
    }

    /// Replace a shop's session in the database and the cache.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the save fails.
    pub async fn store_session(&self, session: ShopSession) -> Result<(), RepositoryError> {
        ShopSessionRepository::new(self.pool()).save(&session).await?;
        self.inner
            .sessions
            .insert(session.shop.clone(), session)
            .await;
        Ok(())
    }

    /// Drop a cached session, e.g. after Shopify rejected its token.
    pub async fn forget_session(&self, shop: &ShopDomain) {
        self.inner.sessions.invalidate(shop.as_str()).await;
    }

    /// Build an Admin API client from a session.
    #[must_use]
    pub fn admin_client(&self, session: &ShopSession) -> AdminClient {
        AdminClient::new(
            self.inner.http.clone(),
            &session.shop,
            &self.inner.config.shopify.api_version,
            session.access_token.clone(),
        )
    }
}
