//! Structured record of what a registration run did.

use serde::Serialize;
use wholesale_core::{CompanyId, CompanyLocationId, CustomerId};

/// Workflow stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ResolvingIdentity,
    ResolvingCompany,
    CreatingOrReusingCompany,
    AssigningAddress,
    AssigningTax,
    CreatingOrReusingCustomer,
    LinkingContact,
    Done,
}

impl Stage {
    /// The stage that follows this one. `Done` is terminal.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::ResolvingIdentity => Self::ResolvingCompany,
            Self::ResolvingCompany => Self::CreatingOrReusingCompany,
            Self::CreatingOrReusingCompany => Self::AssigningAddress,
            Self::AssigningAddress => Self::AssigningTax,
            Self::AssigningTax => Self::CreatingOrReusingCustomer,
            Self::CreatingOrReusingCustomer => Self::LinkingContact,
            Self::LinkingContact | Self::Done => Self::Done,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResolvingIdentity => "resolving_identity",
            Self::ResolvingCompany => "resolving_company",
            Self::CreatingOrReusingCompany => "creating_or_reusing_company",
            Self::AssigningAddress => "assigning_address",
            Self::AssigningTax => "assigning_tax",
            Self::CreatingOrReusingCustomer => "creating_or_reusing_customer",
            Self::LinkingContact => "linking_contact",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// The remote call succeeded (or a lookup completed).
    Succeeded,
    /// The step's precondition did not hold; no remote call was made.
    Skipped,
    /// The remote call failed in an expected, tolerated way.
    SoftFailed,
    /// The remote call failed; the run continued without its effect.
    Failed,
}

/// One step of a registration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEvent {
    pub stage: Stage,
    /// Short machine-readable step name, e.g. `assign_main_contact`.
    pub step: &'static str,
    pub outcome: StepOutcome,
    pub customer_id: Option<CustomerId>,
    pub company_id: Option<CompanyId>,
    pub location_id: Option<CompanyLocationId>,
    /// Error text or other context.
    pub detail: Option<String>,
}

impl WorkflowEvent {
    /// Emit this event to `tracing`.
    ///
    /// Failures log at WARN (which the Sentry layer turns into events);
    /// everything else logs at INFO.
    pub fn trace(&self) {
        let customer_id = self.customer_id.as_ref().map(CustomerId::as_str);
        let company_id = self.company_id.as_ref().map(CompanyId::as_str);
        let location_id = self.location_id.as_ref().map(CompanyLocationId::as_str);
        let detail = self.detail.as_deref().unwrap_or_default();

        if self.outcome == StepOutcome::Failed {
            tracing::warn!(
                stage = %self.stage,
                step = self.step,
                outcome = ?self.outcome,
                customer_id,
                company_id,
                location_id,
                detail,
                "Registration step failed"
            );
        } else {
            tracing::info!(
                stage = %self.stage,
                step = self.step,
                outcome = ?self.outcome,
                customer_id,
                company_id,
                location_id,
                detail,
                "Registration step"
            );
        }
    }
}
