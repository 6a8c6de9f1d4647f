//! Database operations for the proxy's `PostgreSQL`.
//!
//! ## Tables
//!
//! - `shop_session` - Offline Admin API access token per installed shop
//!
//! The proxy keeps no business data of its own; customers and companies
//! live in Shopify.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/proxy/migrations/` and run via:
//! ```bash
//! cargo run -p wholesale-cli -- migrate
//! ```

pub mod sessions;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use sessions::{ShopSession, ShopSessionRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
