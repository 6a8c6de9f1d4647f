//! The upsert-and-link state machine.
//!
//! A [`Run`] owns everything learned so far and advances one [`Stage`] at a
//! time. Only the two lookups can abort a run; every mutation after them is
//! recorded as an event and the run moves on.

use wholesale_core::{
    CompanyContactId, CompanyId, CompanyLocationId, CustomerId, Registrant, merge_phone,
    union_tags,
};

use super::{
    RegistrationOutcome, WorkflowError, WorkflowSettings,
    company::{choose_role, resolve_company},
    events::{Stage, StepOutcome, WorkflowEvent},
    identity::{find_taken_customer, resolve_customer},
};
use crate::shopify::{
    AddressType, AdminShopifyError, Company, CompanyContactInput, CompanyCreateInput,
    CompanyLocation, Customer, CustomerInput, Directory, MetafieldInput,
};

/// How the company in this run came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompanyOrigin {
    /// Matched by company email.
    Reused,
    /// Created with the registrant as inline contact.
    CreatedWithContact,
    /// Created without a contact.
    Created,
}

pub(super) struct Run<'a> {
    directory: &'a dyn Directory,
    settings: &'a WorkflowSettings,
    registrant: &'a Registrant,
    user_email: Option<String>,
    company_email: Option<String>,

    stage: Stage,
    /// Customer existed before this run (found by lookup or by the
    /// email-taken fallback).
    customer_pre_existing: bool,
    /// Found by the identity lookup; merged once both lookups are done.
    existing_customer: Option<Customer>,
    /// A new customer must be linked to the company explicitly.
    contact_pending: bool,
    matched_company: Option<Company>,
    company_origin: Option<CompanyOrigin>,
    inline_customer_id: Option<CustomerId>,
    location: Option<CompanyLocation>,

    customer_id: Option<CustomerId>,
    company_id: Option<CompanyId>,
    customer_error: Option<String>,
    company_error: Option<String>,
    events: Vec<WorkflowEvent>,
}

impl<'a> Run<'a> {
    pub(super) fn new(
        directory: &'a dyn Directory,
        settings: &'a WorkflowSettings,
        registrant: &'a Registrant,
    ) -> Self {
        Self {
            directory,
            settings,
            registrant,
            user_email: registrant.normalized_user_email(),
            company_email: registrant.normalized_company_email(),
            stage: Stage::ResolvingIdentity,
            customer_pre_existing: false,
            existing_customer: None,
            contact_pending: false,
            matched_company: None,
            company_origin: None,
            inline_customer_id: None,
            location: None,
            customer_id: None,
            company_id: None,
            customer_error: None,
            company_error: None,
            events: Vec::new(),
        }
    }

    /// Drive the run to `Done`.
    pub(super) async fn execute(mut self) -> Result<RegistrationOutcome, WorkflowError> {
        while self.stage != Stage::Done {
            match self.stage {
                Stage::ResolvingIdentity => self.resolve_identity().await?,
                Stage::ResolvingCompany => self.resolve_company().await?,
                Stage::CreatingOrReusingCompany => self.create_or_reuse_company().await,
                Stage::AssigningAddress => self.assign_address().await,
                Stage::AssigningTax => self.assign_tax().await,
                Stage::CreatingOrReusingCustomer => self.create_or_reuse_customer().await,
                Stage::LinkingContact => self.link_contact().await,
                Stage::Done => {}
            }
            self.stage = self.stage.next();
        }

        Ok(self.finish())
    }

    // =========================================================================
    // Stages
    // =========================================================================

    /// Look the registrant up by user email. The merge into a record found
    /// here waits until the company lookup has also succeeded.
    async fn resolve_identity(&mut self) -> Result<(), WorkflowError> {
        let Some(email) = self.user_email.clone() else {
            self.record("lookup_customer", StepOutcome::Skipped, Some("no user email"));
            return Ok(());
        };

        let existing = resolve_customer(self.directory, &email)
            .await
            .map_err(WorkflowError::CustomerLookup)?;

        let Some(customer) = existing else {
            self.record("lookup_customer", StepOutcome::Succeeded, Some("not found"));
            return Ok(());
        };

        self.customer_id = Some(customer.id.clone());
        self.customer_pre_existing = true;
        self.record("lookup_customer", StepOutcome::Succeeded, Some("found"));
        self.existing_customer = Some(customer);
        Ok(())
    }

    /// Look the company up, then apply the first write of the run: the
    /// merge into a customer found by [`Self::resolve_identity`].
    async fn resolve_company(&mut self) -> Result<(), WorkflowError> {
        self.lookup_company().await?;

        if let Some(customer) = self.existing_customer.take() {
            self.merge_into_customer(&customer, "update_customer").await;
        }
        Ok(())
    }

    async fn lookup_company(&mut self) -> Result<(), WorkflowError> {
        let Some(email) = self.company_email.clone() else {
            self.record("lookup_company", StepOutcome::Skipped, Some("no company email"));
            return Ok(());
        };

        self.matched_company = resolve_company(self.directory, &email, self.settings.company_scan_limit)
            .await
            .map_err(WorkflowError::CompanyLookup)?;

        let detail = if self.matched_company.is_some() { "found" } else { "not found" };
        self.record("lookup_company", StepOutcome::Succeeded, Some(detail));
        Ok(())
    }

    async fn create_or_reuse_company(&mut self) {
        if let Some(company) = self.matched_company.take() {
            self.company_id = Some(company.id);
            self.company_origin = Some(CompanyOrigin::Reused);
            self.record("reuse_company", StepOutcome::Succeeded, Some(company.name.as_str()));
            return;
        }

        let name = self.registrant.company_display_name();
        let inline_contact = if self.customer_pre_existing {
            None
        } else {
            self.user_email.clone().map(|email| CompanyContactInput {
                email,
                first_name: self.registrant.first_name.clone(),
                last_name: self.registrant.last_name.clone(),
                phone: merge_phone(self.registrant.phone.as_deref()),
            })
        };
        let mut input = CompanyCreateInput {
            location_name: Some(
                self.registrant
                    .location
                    .clone()
                    .unwrap_or_else(|| name.clone()),
            ),
            name,
            contact: inline_contact,
        };

        let mut result = self.directory.create_company(&input).await;

        if input.contact.is_some()
            && let Err(e) = &result
            && e.is_email_taken()
        {
            // Someone registered this email between the lookup and now.
            self.record(
                "create_company_with_contact",
                StepOutcome::SoftFailed,
                Some(&e.to_string()),
            );
            self.contact_pending = true;
            input.contact = None;
            result = self.directory.create_company(&input).await;
        }

        let created = match result {
            Ok(created) => created,
            Err(e) => {
                let message = e.to_string();
                self.record("create_company", StepOutcome::Failed, Some(&message));
                self.company_error = Some(message);
                return;
            }
        };

        self.company_id = Some(created.id.clone());
        self.company_origin = Some(if input.contact.is_some() {
            CompanyOrigin::CreatedWithContact
        } else {
            CompanyOrigin::Created
        });

        if input.contact.is_some() {
            self.inline_customer_id = created.main_contact_customer_id;
            if self.inline_customer_id.is_none() {
                // No customer came back with the contact; create and link
                // it explicitly instead.
                self.contact_pending = true;
            }
        } else if !self.customer_pre_existing {
            self.contact_pending = true;
        }
        self.record("create_company", StepOutcome::Succeeded, None);

        if let Some(email) = self.company_email.clone() {
            let metafield = MetafieldInput::company_email(&email);
            let result = self.directory.set_metafield(created.id.as_str(), &metafield).await;
            self.record_result("set_company_email", &result);
        }
    }

    async fn assign_address(&mut self) {
        let Some(company_id) = self.company_id.clone() else {
            self.record("assign_address", StepOutcome::Skipped, Some("no company"));
            return;
        };
        let Some(address) = self.registrant.shipping_address(&self.settings.default_country) else {
            self.record("assign_address", StepOutcome::Skipped, Some("no address"));
            return;
        };

        let location = match self.directory.first_location(&company_id).await {
            Ok(Some(location)) => location,
            Ok(None) => {
                self.record("find_location", StepOutcome::Failed, Some("company has no location"));
                return;
            }
            Err(e) => {
                self.record("find_location", StepOutcome::Failed, Some(&e.to_string()));
                return;
            }
        };
        self.location = Some(location.clone());
        self.record("find_location", StepOutcome::Succeeded, None);

        let registrant = self.registrant;
        if let Some(label) = registrant.location.as_deref()
            && label != location.name
        {
            let result = self.directory.rename_location(&location.id, label).await;
            self.record_result("rename_location", &result);
        }

        let result = self
            .directory
            .assign_location_address(&location.id, &address, &[AddressType::Shipping])
            .await;
        self.record_result("assign_address", &result);
    }

    async fn assign_tax(&mut self) {
        let registrant = self.registrant;
        let Some(tax_id) = registrant.tax_id.as_deref() else {
            self.record("set_tax_id", StepOutcome::Skipped, Some("no tax id"));
            return;
        };
        let Some(location_id) = self.location.as_ref().map(|l| l.id.clone()) else {
            self.record("set_tax_id", StepOutcome::Skipped, Some("no location"));
            return;
        };

        match self.directory.set_location_tax_id(&location_id, tax_id).await {
            Ok(()) => self.record("set_tax_id", StepOutcome::Succeeded, None),
            Err(e) if e.is_unsupported_field() => {
                self.record("set_tax_id", StepOutcome::SoftFailed, Some(&e.to_string()));
            }
            Err(e) => self.record("set_tax_id", StepOutcome::Failed, Some(&e.to_string())),
        }
    }

    async fn create_or_reuse_customer(&mut self) {
        if self.customer_id.is_some() {
            self.record("reuse_customer", StepOutcome::Skipped, Some("customer already exists"));
            return;
        }

        if let Some(customer_id) = self.inline_customer_id.clone() {
            self.customer_id = Some(customer_id.clone());
            let input = CustomerInput {
                phone: merge_phone(self.registrant.phone.as_deref()),
                tags: Some(union_tags(&[], &self.settings.customer_tag)),
                ..CustomerInput::default()
            };
            if let Err(e) = self.directory.update_customer(&customer_id, &input).await {
                let message = e.to_string();
                self.record("tag_contact_customer", StepOutcome::Failed, Some(&message));
                self.customer_error = Some(message);
            } else {
                self.record("tag_contact_customer", StepOutcome::Succeeded, None);
            }
            return;
        }

        let input = CustomerInput {
            email: self.user_email.clone(),
            first_name: self.registrant.first_name.clone(),
            last_name: self.registrant.last_name.clone(),
            phone: merge_phone(self.registrant.phone.as_deref()),
            tags: Some(vec![self.settings.customer_tag.clone()]),
        };

        let error = match self.directory.create_customer(&input).await {
            Ok(customer) => {
                self.customer_id = Some(customer.id);
                self.record("create_customer", StepOutcome::Succeeded, None);
                return;
            }
            Err(e) => e,
        };

        let Some(email) = self.user_email.clone().filter(|_| error.is_email_taken()) else {
            let message = error.to_string();
            self.record("create_customer", StepOutcome::Failed, Some(&message));
            self.customer_error = Some(message);
            return;
        };

        self.record(
            "create_customer",
            StepOutcome::SoftFailed,
            Some(&error.to_string()),
        );

        let Some(customer) = find_taken_customer(self.directory, &email).await else {
            let message = format!("{error}; no customer with email {email} could be found");
            self.record("find_taken_customer", StepOutcome::Failed, Some(&message));
            self.customer_error = Some(message);
            return;
        };

        self.customer_id = Some(customer.id.clone());
        self.customer_pre_existing = true;
        self.contact_pending = false;
        self.record("find_taken_customer", StepOutcome::Succeeded, None);

        self.merge_into_customer(&customer, "update_found_customer").await;
    }

    async fn link_contact(&mut self) {
        let (Some(company_id), Some(customer_id)) = (self.company_id.clone(), self.customer_id.clone())
        else {
            self.record("link_contact", StepOutcome::Skipped, Some("missing company or customer"));
            return;
        };

        if self.customer_pre_existing {
            self.link_existing_customer(&company_id, &customer_id).await;
        } else if self.contact_pending || self.company_origin == Some(CompanyOrigin::Reused) {
            let result = self
                .directory
                .assign_customer_as_contact(&company_id, &customer_id)
                .await;
            self.record_result("assign_contact", &result);
        } else {
            self.record("link_contact", StepOutcome::Skipped, Some("linked at company creation"));
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Contact, main contact, then a role at the first location. Each step
    /// runs as long as its inputs are available.
    async fn link_existing_customer(&mut self, company_id: &CompanyId, customer_id: &CustomerId) {
        let contact_id = match self
            .directory
            .assign_customer_as_contact(company_id, customer_id)
            .await
        {
            Ok(contact_id) => {
                self.record("assign_contact", StepOutcome::Succeeded, Some(contact_id.as_str()));
                Some(contact_id)
            }
            Err(e) => {
                self.record("assign_contact", StepOutcome::Failed, Some(&e.to_string()));
                None
            }
        };

        let Some(contact_id) = contact_id else {
            self.record("assign_main_contact", StepOutcome::Skipped, Some("no contact"));
            self.record("assign_role", StepOutcome::Skipped, Some("no contact"));
            return;
        };

        let result = self.directory.assign_main_contact(company_id, &contact_id).await;
        self.record_result("assign_main_contact", &result);

        self.assign_role(company_id, &contact_id).await;
    }

    async fn assign_role(&mut self, company_id: &CompanyId, contact_id: &CompanyContactId) {
        let role = match self.directory.company_roles(company_id).await {
            Ok(roles) => choose_role(&roles).cloned(),
            Err(e) => {
                self.record("company_roles", StepOutcome::Failed, Some(&e.to_string()));
                return;
            }
        };
        let Some(role) = role else {
            self.record("assign_role", StepOutcome::Skipped, Some("company has no roles"));
            return;
        };

        let Some(location_id) = self.location_id_for(company_id).await else {
            self.record("assign_role", StepOutcome::Skipped, Some("no location"));
            return;
        };

        let result = self
            .directory
            .assign_contact_role(contact_id, &role.id, &location_id)
            .await;
        self.record_result("assign_role", &result);
    }

    /// The company's first location, fetched if the address stage did not.
    async fn location_id_for(&mut self, company_id: &CompanyId) -> Option<CompanyLocationId> {
        if let Some(location) = &self.location {
            return Some(location.id.clone());
        }

        match self.directory.first_location(company_id).await {
            Ok(location) => {
                self.location = location;
                self.location.as_ref().map(|l| l.id.clone())
            }
            Err(e) => {
                self.record("find_location", StepOutcome::Failed, Some(&e.to_string()));
                None
            }
        }
    }

    /// Apply the submission to an existing customer: names, phone when one
    /// was submitted, and the wholesale tag unioned into existing tags.
    async fn merge_into_customer(&mut self, customer: &Customer, step: &'static str) {
        let input = CustomerInput {
            email: None,
            first_name: self.registrant.first_name.clone(),
            last_name: self.registrant.last_name.clone(),
            phone: merge_phone(self.registrant.phone.as_deref()),
            tags: Some(union_tags(&customer.tags, &self.settings.customer_tag)),
        };

        if let Err(e) = self.directory.update_customer(&customer.id, &input).await {
            let message = e.to_string();
            self.record(step, StepOutcome::Failed, Some(&message));
            self.customer_error = Some(message);
        } else {
            self.record(step, StepOutcome::Succeeded, None);
        }
    }

    fn record_result<T>(&mut self, step: &'static str, result: &Result<T, AdminShopifyError>) {
        match result {
            Ok(_) => self.record(step, StepOutcome::Succeeded, None),
            Err(e) => self.record(step, StepOutcome::Failed, Some(&e.to_string())),
        }
    }

    fn record(&mut self, step: &'static str, outcome: StepOutcome, detail: Option<&str>) {
        let event = WorkflowEvent {
            stage: self.stage,
            step,
            outcome,
            customer_id: self.customer_id.clone(),
            company_id: self.company_id.clone(),
            location_id: self.location.as_ref().map(|l| l.id.clone()),
            detail: detail.map(String::from),
        };
        event.trace();
        self.events.push(event);
    }

    fn finish(self) -> RegistrationOutcome {
        let success = self.company_id.is_some();
        let message = match (&self.company_id, &self.company_error, &self.customer_error) {
            (Some(_), _, None) => "Wholesale registration completed".to_string(),
            (Some(_), _, Some(_)) => {
                "Company registered, but the customer account could not be updated".to_string()
            }
            (None, Some(e), _) => format!("Company could not be created: {e}"),
            (None, None, _) => "Company could not be created".to_string(),
        };

        RegistrationOutcome {
            success,
            company_id: self.company_id,
            customer_id: self.customer_id,
            message,
            customer_error: self.customer_error,
            company_error: self.company_error,
            events: self.events,
        }
    }
}
