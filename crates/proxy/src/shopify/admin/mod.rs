//! Shopify Admin API GraphQL client for a single shop.
//!
//! One `AdminClient` is built per request from the shop's offline session.
//! The underlying `reqwest::Client` (and its connection pool) is shared.

use std::sync::Arc;

use graphql_client::GraphQLQuery;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use super::{AdminShopifyError, GraphQLError, GraphQLErrorLocation};

mod companies;
mod conversions;
mod customers;
mod directory;
pub mod queries;

/// Shopify Admin API GraphQL client.
///
/// Provides typed access to the customer and B2B company operations the
/// registration workflow needs. Authenticates with a shop's offline access
/// token.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    shop: String,
    api_version: String,
    access_token: SecretString,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("shop", &self.inner.shop)
            .field("api_version", &self.inner.api_version)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (carries timeouts)
    /// * `shop` - Shop domain, e.g. `acme.myshopify.com`
    /// * `api_version` - Admin API version, e.g. `2025-01`
    /// * `access_token` - The shop's offline access token
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        shop: &str,
        api_version: &str,
        access_token: SecretString,
    ) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
                client,
                shop: shop.to_string(),
                api_version: api_version.to_string(),
                access_token,
            }),
        }
    }

    /// Get the shop domain.
    #[must_use]
    pub fn shop(&self) -> &str {
        &self.inner.shop
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}/admin/api/{}/graphql.json",
            self.inner.shop, self.inner.api_version
        )
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, AdminShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(self.endpoint())
            .header("X-Shopify-Access-Token", self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(2);
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid or revoked access token".to_string(),
            ));
        }

        let graphql_response: graphql_client::Response<Q::ResponseData> = response.json().await?;
        into_data(graphql_response)
    }
}

/// Unwrap a GraphQL response envelope, converting `errors` into
/// `AdminShopifyError::GraphQL`.
///
/// Any `errors` entry fails the whole operation, even when partial `data`
/// came back.
fn into_data<T>(response: graphql_client::Response<T>) -> Result<T, AdminShopifyError> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        let converted_errors: Vec<GraphQLError> = errors
            .into_iter()
            .map(|e| GraphQLError {
                message: e.message,
                locations: e
                    .locations
                    .unwrap_or_default()
                    .into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect(),
                path: e
                    .path
                    .unwrap_or_default()
                    .into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(key) => serde_json::Value::String(key),
                        graphql_client::PathFragment::Index(index) => serde_json::Value::from(index),
                    })
                    .collect(),
            })
            .collect();
        return Err(AdminShopifyError::GraphQL(converted_errors));
    }

    response
        .data
        .ok_or_else(|| AdminShopifyError::graphql("No data in response"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Result<serde_json::Value, AdminShopifyError> {
        let response: graphql_client::Response<serde_json::Value> =
            serde_json::from_value(json).unwrap();
        into_data(response)
    }

    #[test]
    fn test_into_data_returns_data() {
        let data = parse(serde_json::json!({ "data": { "customers": { "nodes": [] } } })).unwrap();
        assert_eq!(data["customers"]["nodes"], serde_json::json!([]));
    }

    #[test]
    fn test_into_data_converts_errors() {
        let err = parse(serde_json::json!({
            "data": null,
            "errors": [{
                "message": "Field 'companyLocationTaxSettingsUpdate' doesn't exist on type 'Mutation'",
                "locations": [{ "line": 2, "column": 3 }],
                "path": ["mutation CompanyLocationTaxSettingsUpdate", 0]
            }]
        }))
        .unwrap_err();

        let AdminShopifyError::GraphQL(errors) = &err else {
            panic!("expected GraphQL error, got {err:?}");
        };
        let first = errors.first().unwrap();
        assert_eq!(first.locations.first().map(|l| l.line), Some(2));
        assert_eq!(first.path.len(), 2);
        assert!(err.is_unsupported_field());
    }

    #[test]
    fn test_into_data_errors_win_over_partial_data() {
        let err = parse(serde_json::json!({
            "data": { "company": null },
            "errors": [{ "message": "Throttled" }]
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: Throttled");
    }

    #[test]
    fn test_into_data_missing_data() {
        let err = parse(serde_json::json!({})).unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: No data in response");
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = AdminClient::new(
            reqwest::Client::new(),
            "acme.myshopify.com",
            "2025-01",
            SecretString::from("shpat_super_secret"),
        );
        let debug = format!("{client:?}");
        assert!(debug.contains("acme.myshopify.com"));
        assert!(!debug.contains("shpat_super_secret"));
        assert_eq!(
            client.endpoint(),
            "https://acme.myshopify.com/admin/api/2025-01/graphql.json"
        );
    }
}
