//! Shop session commands.
//!
//! Installing through `/auth/install` stores sessions automatically; these
//! commands cover custom-app tokens and clean-up.

use secrecy::SecretString;
use wholesale_proxy::config::ToolConfig;
use wholesale_proxy::db::{self, RepositoryError, ShopSession, ShopSessionRepository};
use wholesale_proxy::tenant::ShopDomain;

use super::CommandError;

/// Store or replace a shop's offline token.
pub async fn set(shop: &str, token: String, scope: &str) -> Result<(), CommandError> {
    let shop = parse_shop(shop)?;
    let config = ToolConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;

    let session = ShopSession {
        shop: shop.as_str().to_string(),
        access_token: SecretString::from(token),
        scopes: scope
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        obtained_at: chrono::Utc::now().timestamp(),
    };

    ShopSessionRepository::new(&pool).save(&session).await?;

    tracing::info!(shop = %shop, scopes = ?session.scopes, "Session stored");
    Ok(())
}

/// Remove a shop's session.
pub async fn delete(shop: &str) -> Result<(), CommandError> {
    let shop = parse_shop(shop)?;
    let config = ToolConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;

    match ShopSessionRepository::new(&pool).delete(shop.as_str()).await {
        Ok(()) => tracing::info!(shop = %shop, "Session deleted"),
        Err(RepositoryError::NotFound) => tracing::warn!(shop = %shop, "No session to delete"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub(crate) fn parse_shop(shop: &str) -> Result<ShopDomain, CommandError> {
    ShopDomain::parse(shop).ok_or_else(|| CommandError::InvalidShop(shop.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shop() {
        assert!(parse_shop("acme.myshopify.com").is_ok());
        assert!(matches!(
            parse_shop("acme.com"),
            Err(CommandError::InvalidShop(_))
        ));
    }
}
