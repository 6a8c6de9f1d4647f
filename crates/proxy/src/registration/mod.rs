//! Wholesale registration: the upsert-and-link workflow.
//!
//! One submission becomes, in order:
//!
//! 1. a customer lookup by user email,
//! 2. a company lookup by the `custom.companyEmail` metafield, then a merge
//!    into the customer record found in step 1,
//! 3. a reused or newly created company,
//! 4. an address (and tax id) on the company's first location,
//! 5. a reused or newly created customer,
//! 6. the contact links between them.
//!
//! Every remote call is separate and non-transactional. Only the two
//! lookups are fatal, and both run before the first write. Anything after
//! them is recorded and the run carries on, so a partially linked
//! registration is a normal outcome.

mod company;
mod events;
mod identity;
mod workflow;

pub use company::{choose_role, resolve_company};
pub use events::{Stage, StepOutcome, WorkflowEvent};
pub use identity::{find_taken_customer, resolve_customer};

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use wholesale_core::{CompanyId, CustomerId, Registrant};

use crate::shopify::{AdminShopifyError, Directory};
use workflow::Run;

/// Companies scanned when matching a company email.
pub const DEFAULT_COMPANY_SCAN_LIMIT: i64 = 50;

/// Tunables for a registration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Tag applied to every registered customer.
    pub customer_tag: String,
    /// Country code used when an address is submitted without one.
    pub default_country: String,
    /// Companies scanned by the company lookup.
    pub company_scan_limit: i64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            customer_tag: "wholesale".to_string(),
            default_country: "US".to_string(),
            company_scan_limit: DEFAULT_COMPANY_SCAN_LIMIT,
        }
    }
}

/// Fatal workflow errors. Nothing has been written when one is returned.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("customer lookup failed: {0}")]
    CustomerLookup(#[source] AdminShopifyError),

    #[error("company lookup failed: {0}")]
    CompanyLookup(#[source] AdminShopifyError),
}

impl WorkflowError {
    /// The underlying directory error.
    #[must_use]
    pub const fn directory_error(&self) -> &AdminShopifyError {
        match self {
            Self::CustomerLookup(e) | Self::CompanyLookup(e) => e,
        }
    }
}

/// Result of a completed run.
///
/// Serializes to the storefront response body:
/// `{ success, companyId, customerId, message, customerError }`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    /// A company id exists at the end of the run.
    pub success: bool,
    pub company_id: Option<CompanyId>,
    pub customer_id: Option<CustomerId>,
    pub message: String,
    /// Why the customer could not be created or updated, if it could not.
    pub customer_error: Option<String>,
    /// Why the company could not be created, if it could not.
    #[serde(skip)]
    pub company_error: Option<String>,
    #[serde(skip)]
    pub events: Vec<WorkflowEvent>,
}

impl RegistrationOutcome {
    /// Events for one step, in the order they happened.
    pub fn events_for<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a WorkflowEvent> {
        self.events.iter().filter(move |e| e.step == step)
    }
}

/// Runs registrations against a [`Directory`].
pub struct Orchestrator<'a> {
    directory: &'a dyn Directory,
    settings: &'a WorkflowSettings,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub const fn new(directory: &'a dyn Directory, settings: &'a WorkflowSettings) -> Self {
        Self {
            directory,
            settings,
        }
    }

    /// Register one submission.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError` if the customer or company lookup fails.
    /// Failures of later steps are reported in the outcome instead.
    #[instrument(
        skip_all,
        fields(
            company = registrant.company_name.as_deref().unwrap_or_default(),
            has_address = registrant.has_address(),
        )
    )]
    pub async fn register(
        &self,
        registrant: &Registrant,
    ) -> Result<RegistrationOutcome, WorkflowError> {
        let outcome = Run::new(self.directory, self.settings, registrant)
            .execute()
            .await?;

        tracing::info!(
            success = outcome.success,
            company_id = outcome.company_id.as_ref().map(CompanyId::as_str),
            customer_id = outcome.customer_id.as_ref().map(CustomerId::as_str),
            customer_error = outcome.customer_error.as_deref(),
            "Registration finished"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_wire_format() {
        let outcome = RegistrationOutcome {
            success: true,
            company_id: Some(CompanyId::from_legacy_id(7)),
            customer_id: None,
            message: "Wholesale registration completed".to_string(),
            customer_error: None,
            company_error: Some("hidden".to_string()),
            events: vec![],
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "companyId": "gid://shopify/Company/7",
                "customerId": null,
                "message": "Wholesale registration completed",
                "customerError": null
            })
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = WorkflowSettings::default();
        assert_eq!(settings.customer_tag, "wholesale");
        assert_eq!(settings.default_country, "US");
        assert_eq!(settings.company_scan_limit, 50);
    }
}
