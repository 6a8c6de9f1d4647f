//! Domain types for the Shopify Admin API customer and B2B company objects.
//!
//! These types are decoupled from the GraphQL wire shapes so the
//! registration workflow and its test doubles never touch raw responses.

use serde::{Deserialize, Serialize};
use wholesale_core::{CompanyContactId, CompanyContactRoleId, CompanyId, CompanyLocationId, CustomerId};

/// Metafield namespace holding registration data.
pub const COMPANY_EMAIL_NAMESPACE: &str = "custom";

/// Metafield key holding the company's email, the join key for lookups.
pub const COMPANY_EMAIL_KEY: &str = "companyEmail";

// =============================================================================
// Customers
// =============================================================================

/// A customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub tags: Vec<String>,
}

/// Parameters for a customer search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSearch {
    /// Shopify search syntax query; `None` lists all customers.
    pub query: Option<String>,
    /// Page size.
    pub first: i64,
    /// Sort by creation date, newest first, instead of relevance.
    pub newest_first: bool,
}

impl CustomerSearch {
    /// Search by query string, in relevance order.
    #[must_use]
    pub fn by_query(query: impl Into<String>, first: i64) -> Self {
        Self {
            query: Some(query.into()),
            first,
            newest_first: false,
        }
    }

    /// The most recently created customers, unfiltered.
    #[must_use]
    pub const fn recent(first: i64) -> Self {
        Self {
            query: None,
            first,
            newest_first: true,
        }
    }
}

/// Input for creating or updating a customer.
///
/// `None` fields are omitted from the request, so an update never clears a
/// value it was not asked to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// Full tag list (Shopify replaces tags wholesale on update).
    pub tags: Option<Vec<String>>,
}

// =============================================================================
// Companies
// =============================================================================

/// A metafield value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    pub namespace: String,
    pub key: String,
    pub value: String,
}

/// A B2B company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub metafields: Vec<Metafield>,
}

impl Company {
    /// Value of the metafield with the given namespace and key.
    #[must_use]
    pub fn metafield(&self, namespace: &str, key: &str) -> Option<&str> {
        self.metafields
            .iter()
            .find(|m| m.namespace == namespace && m.key == key)
            .map(|m| m.value.as_str())
    }

    /// The `custom.companyEmail` metafield.
    #[must_use]
    pub fn company_email(&self) -> Option<&str> {
        self.metafield(COMPANY_EMAIL_NAMESPACE, COMPANY_EMAIL_KEY)
    }
}

/// A company location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLocation {
    pub id: CompanyLocationId,
    pub name: String,
}

/// A company contact role (e.g. "Location admin", "Ordering only").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRole {
    pub id: CompanyContactRoleId,
    pub name: String,
}

/// The roles a company can grant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyRoles {
    pub default_role: Option<CompanyRole>,
    pub roles: Vec<CompanyRole>,
}

/// Inline contact attached to a company at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyContactInput {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Input for creating a company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyCreateInput {
    pub name: String,
    /// Inline contact; creates (or fails on) a customer with that email.
    pub contact: Option<CompanyContactInput>,
    /// Name of the location created with the company.
    pub location_name: Option<String>,
}

/// Result of a company creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCompany {
    pub id: CompanyId,
    /// Main contact created from the inline contact input.
    pub main_contact_id: Option<CompanyContactId>,
    /// Customer behind the inline contact.
    pub main_contact_customer_id: Option<CustomerId>,
}

/// Input for setting a metafield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetafieldInput {
    pub namespace: String,
    pub key: String,
    /// Shopify metafield type, e.g. `single_line_text_field`.
    pub kind: String,
    pub value: String,
}

impl MetafieldInput {
    /// The `custom.companyEmail` metafield.
    #[must_use]
    pub fn company_email(email: &str) -> Self {
        Self {
            namespace: COMPANY_EMAIL_NAMESPACE.to_string(),
            key: COMPANY_EMAIL_KEY.to_string(),
            kind: "single_line_text_field".to_string(),
            value: email.to_string(),
        }
    }
}

/// Company address types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    Billing,
    Shipping,
}
