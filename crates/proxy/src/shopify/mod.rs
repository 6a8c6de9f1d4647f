//! Shopify Admin API access for the wholesale registration workflow.
//!
//! # Security
//!
//! **The offline access tokens used here can create and modify customers and
//! companies.** They are loaded per shop from the session store and never
//! leave the server.
//!
//! # Architecture
//!
//! - [`Directory`] is the seam the registration workflow talks to: a small set
//!   of typed customer/company operations. Tests substitute an in-memory
//!   implementation.
//! - [`AdminClient`] implements it over the GraphQL Admin API, using
//!   `graphql_client`'s request/response envelope and `reqwest` for transport.
//! - [`OAuthClient`] performs the app install handshake that produces the
//!   offline tokens.
//!
//! # Example
//!
//! ```rust,ignore
//! use wholesale_proxy::shopify::{AdminClient, CustomerSearch, Directory};
//!
//! let client = AdminClient::new(http, "acme.myshopify.com", "2025-01", token);
//! let matches = client
//!     .search_customers(&CustomerSearch::by_query("email:jo@acme.test", 5))
//!     .await?;
//! ```

mod admin;
pub mod oauth;
pub mod types;

pub use admin::AdminClient;
pub use oauth::{OAuthClient, OAuthToken};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;
use wholesale_core::{
    CompanyContactId, CompanyContactRoleId, CompanyId, CompanyLocationId, CustomerId,
};

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User errors from a mutation (e.g., invalid input).
    #[error("User error: {}", format_user_errors(.0))]
    UserErrors(Vec<UserError>),

    /// OAuth handshake failed.
    #[error("OAuth error: {0}")]
    OAuth(String),
}

impl AdminShopifyError {
    /// Build a single GraphQL error from a message.
    #[must_use]
    pub fn graphql(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }])
    }

    /// Build a single user error from a message.
    #[must_use]
    pub fn user_error(field: &[&str], message: impl Into<String>, code: Option<&str>) -> Self {
        Self::UserErrors(vec![UserError {
            field: field.iter().map(|f| (*f).to_string()).collect(),
            message: message.into(),
            code: code.map(String::from),
        }])
    }

    /// Returns `true` if a create was rejected because the email is already
    /// used by another customer.
    #[must_use]
    pub fn is_email_taken(&self) -> bool {
        match self {
            Self::UserErrors(errors) => errors.iter().any(UserError::is_taken),
            Self::GraphQL(errors) => errors
                .iter()
                .any(|e| e.message.to_lowercase().contains("has already been taken")),
            _ => false,
        }
    }

    /// Returns `true` if the query used a field or mutation that does not
    /// exist in this shop's API version or plan.
    #[must_use]
    pub fn is_unsupported_field(&self) -> bool {
        match self {
            Self::GraphQL(errors) => errors.iter().any(|e| {
                let message = e.message.to_lowercase();
                message.contains("doesn't exist on type") || message.contains("does not exist on type")
            }),
            _ => false,
        }
    }
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

/// A `userErrors` entry from a mutation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserError {
    /// Path to the offending input field.
    pub field: Vec<String>,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code, when the payload type exposes one.
    pub code: Option<String>,
}

impl UserError {
    fn is_taken(&self) -> bool {
        self.code.as_deref() == Some("TAKEN")
            || self.message.to_lowercase().contains("has already been taken")
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| {
            if e.field.is_empty() {
                e.message.clone()
            } else {
                format!("{}: {}", e.field.join("."), e.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// The remote customer/company directory the registration workflow runs
/// against.
///
/// Every method is a single remote call. None of them are transactional
/// with each other.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Search customers. Results are in the remote system's order and may
    /// include partial matches.
    async fn search_customers(
        &self,
        search: &CustomerSearch,
    ) -> Result<Vec<Customer>, AdminShopifyError>;

    /// Create a customer.
    async fn create_customer(&self, input: &CustomerInput) -> Result<Customer, AdminShopifyError>;

    /// Update a customer. Fields left as `None` are not sent.
    async fn update_customer(
        &self,
        id: &CustomerId,
        input: &CustomerInput,
    ) -> Result<Customer, AdminShopifyError>;

    /// First `first` companies with their `custom` namespace metafields.
    async fn list_companies(&self, first: i64) -> Result<Vec<Company>, AdminShopifyError>;

    /// Create a company, optionally with an inline contact.
    async fn create_company(
        &self,
        input: &CompanyCreateInput,
    ) -> Result<CreatedCompany, AdminShopifyError>;

    /// Set a single-line text metafield on an owner.
    async fn set_metafield(
        &self,
        owner_id: &str,
        metafield: &MetafieldInput,
    ) -> Result<(), AdminShopifyError>;

    /// The company's first location, if it has one.
    async fn first_location(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<CompanyLocation>, AdminShopifyError>;

    /// Rename a company location.
    async fn rename_location(
        &self,
        location_id: &CompanyLocationId,
        name: &str,
    ) -> Result<(), AdminShopifyError>;

    /// Assign an address to a company location.
    async fn assign_location_address(
        &self,
        location_id: &CompanyLocationId,
        address: &wholesale_core::CompanyAddress,
        address_types: &[AddressType],
    ) -> Result<(), AdminShopifyError>;

    /// Set the tax registration id of a company location.
    async fn set_location_tax_id(
        &self,
        location_id: &CompanyLocationId,
        tax_registration_id: &str,
    ) -> Result<(), AdminShopifyError>;

    /// Make an existing customer a contact of a company.
    async fn assign_customer_as_contact(
        &self,
        company_id: &CompanyId,
        customer_id: &CustomerId,
    ) -> Result<CompanyContactId, AdminShopifyError>;

    /// Make a company contact the company's main contact.
    async fn assign_main_contact(
        &self,
        company_id: &CompanyId,
        contact_id: &CompanyContactId,
    ) -> Result<(), AdminShopifyError>;

    /// The company's default role and its role catalog.
    async fn company_roles(&self, company_id: &CompanyId)
    -> Result<CompanyRoles, AdminShopifyError>;

    /// Grant a contact a role at a location.
    async fn assign_contact_role(
        &self,
        contact_id: &CompanyContactId,
        role_id: &CompanyContactRoleId,
        location_id: &CompanyLocationId,
    ) -> Result<(), AdminShopifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_shopify_error_display() {
        let err = AdminShopifyError::NotFound("company-123".to_string());
        assert_eq!(err.to_string(), "Not found: company-123");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = AdminShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_user_error_formatting() {
        let err = AdminShopifyError::UserErrors(vec![
            UserError {
                field: vec!["input".to_string(), "email".to_string()],
                message: "Email has already been taken".to_string(),
                code: None,
            },
            UserError {
                field: vec![],
                message: "Something else".to_string(),
                code: None,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "User error: input.email: Email has already been taken; Something else"
        );
    }

    #[test]
    fn test_email_taken_detection() {
        let by_message = AdminShopifyError::user_error(
            &["email"],
            "Email has already been taken",
            None,
        );
        assert!(by_message.is_email_taken());

        let by_code = AdminShopifyError::user_error(
            &["companyContact", "email"],
            "Email address is in use",
            Some("TAKEN"),
        );
        assert!(by_code.is_email_taken());

        let other = AdminShopifyError::user_error(&["phone"], "Phone is invalid", Some("INVALID"));
        assert!(!other.is_email_taken());

        assert!(!AdminShopifyError::RateLimited(2).is_email_taken());
    }

    #[test]
    fn test_unsupported_field_detection() {
        let err = AdminShopifyError::graphql(
            "Field 'companyLocationTaxSettingsUpdate' doesn't exist on type 'Mutation'",
        );
        assert!(err.is_unsupported_field());

        let err = AdminShopifyError::graphql("Access denied for companyLocationUpdate field.");
        assert!(!err.is_unsupported_field());

        let err = AdminShopifyError::user_error(&[], "doesn't exist on type", None);
        assert!(!err.is_unsupported_field());
    }

    #[test]
    fn test_rate_limited_error() {
        let err = AdminShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
