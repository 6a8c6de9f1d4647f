//! Offline session repository.
//!
//! Stores the Admin API access token obtained when a shop installs the app.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use super::RepositoryError;

// =============================================================================
// Types
// =============================================================================

/// A shop's offline session.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopSession {
    /// Shop domain (e.g., acme.myshopify.com).
    pub shop: String,
    /// Offline access token (HIGH PRIVILEGE - redacted in debug output).
    pub access_token: SecretString,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl std::fmt::Debug for ShopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSession")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct ShopSessionRow {
    shop: String,
    access_token: String,
    scope: String,
    obtained_at: i64,
}

impl From<ShopSessionRow> for ShopSession {
    fn from(row: ShopSessionRow) -> Self {
        Self {
            shop: row.shop,
            access_token: SecretString::from(row.access_token),
            scopes: split_scopes(&row.scope),
            obtained_at: row.obtained_at,
        }
    }
}

pub(crate) fn split_scopes(scope: &str) -> Vec<String> {
    scope
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shop session database operations.
pub struct ShopSessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopSessionRepository<'a> {
    /// Create a new shop session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the session for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_shop(&self, shop: &str) -> Result<Option<ShopSession>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopSessionRow>(
            r"
            SELECT shop, access_token, scope, obtained_at
            FROM shop_session
            WHERE shop = $1
            ",
        )
        .bind(shop)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ShopSession::from))
    }

    /// Save or replace the session for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, session: &ShopSession) -> Result<(), RepositoryError> {
        let scope = session.scopes.join(",");

        sqlx::query(
            r"
            INSERT INTO shop_session (shop, access_token, scope, obtained_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (shop) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                scope = EXCLUDED.scope,
                obtained_at = EXCLUDED.obtained_at,
                updated_at = NOW()
            ",
        )
        .bind(&session.shop)
        .bind(session.access_token.expose_secret())
        .bind(scope)
        .bind(session.obtained_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete the session for a shop (e.g., after uninstall).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop has no session.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, shop: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop_session WHERE shop = $1")
            .bind(shop)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_scopes() {
        assert_eq!(
            split_scopes("read_customers, write_companies,,"),
            vec!["read_customers", "write_companies"]
        );
        assert!(split_scopes("").is_empty());
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = ShopSession {
            shop: "acme.myshopify.com".to_string(),
            access_token: SecretString::from("shpat_very_secret"),
            scopes: vec!["write_customers".to_string()],
            obtained_at: 1_700_000_000,
        };

        let debug = format!("{session:?}");
        assert!(debug.contains("acme.myshopify.com"));
        assert!(!debug.contains("shpat_very_secret"));
    }
}
