//! App install (OAuth authorization code grant).

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::db::ShopSession;
use crate::db::sessions::split_scopes;
use crate::error::AppError;
use crate::state::AppState;
use crate::tenant::ShopDomain;

#[derive(Debug, Deserialize)]
pub struct InstallQuery {
    pub shop: String,
}

/// Redirect the merchant to Shopify's consent screen.
#[instrument(skip_all, fields(shop = %params.shop))]
pub async fn install(
    State(state): State<AppState>,
    Query(params): Query<InstallQuery>,
) -> Result<Redirect, AppError> {
    let shop = ShopDomain::parse(&params.shop)
        .ok_or_else(|| AppError::BadRequest("Invalid shop domain".to_string()))?;

    let nonce = Uuid::new_v4().simple().to_string();
    state
        .oauth_states()
        .insert(nonce.clone(), shop.as_str().to_string())
        .await;

    let config = state.config();
    let url = state.oauth().authorization_url(
        shop.as_str(),
        &config.oauth_redirect_uri(),
        &config.shopify.scopes,
        &nonce,
    );

    Ok(Redirect::to(&url))
}

/// Finish the install: check the callback, exchange the code and store the
/// offline token.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    if !state.oauth().verify_callback(&params) {
        tracing::warn!("OAuth callback HMAC did not verify");
        return Err(AppError::Unauthorized("Invalid OAuth signature".to_string()));
    }

    let shop = param(&params, "shop")
        .and_then(ShopDomain::parse)
        .ok_or_else(|| AppError::BadRequest("Invalid shop domain".to_string()))?;
    let nonce = param(&params, "state")
        .ok_or_else(|| AppError::BadRequest("Missing state".to_string()))?;
    let code = param(&params, "code")
        .ok_or_else(|| AppError::BadRequest("Missing code".to_string()))?;

    // Single use: a replayed callback finds no state.
    let issued_for = state.oauth_states().remove(nonce).await;
    if issued_for.as_deref() != Some(shop.as_str()) {
        tracing::warn!(shop = %shop, "OAuth state mismatch");
        return Err(AppError::Unauthorized("OAuth state mismatch".to_string()));
    }

    let token = state.oauth().exchange_code(shop.as_str(), code).await?;

    state
        .store_session(ShopSession {
            shop: token.shop,
            access_token: token.access_token,
            scopes: split_scopes(&token.scope),
            obtained_at: token.obtained_at,
        })
        .await?;

    tracing::info!(shop = %shop, "App installed");

    Ok(Redirect::to(&format!(
        "https://{shop}/admin/apps/{}",
        state.oauth().api_key()
    )))
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
