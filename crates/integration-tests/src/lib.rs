//! Test support for the wholesale registration proxy.
//!
//! # Running Tests
//!
//! ```bash
//! # Workflow scenarios (no network, no database)
//! cargo test -p wholesale-integration-tests
//!
//! # Live tests against a running proxy
//! PROXY_BASE_URL=http://localhost:3000 cargo test -p wholesale-integration-tests -- --ignored
//! ```
//!
//! [`InMemoryDirectory`] stands in for the Shopify Admin API. It keeps
//! customers and companies in memory, records every call in order, and can
//! be told to fail specific operations or to hide customers from search
//! (as Shopify's lagging search index does).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use wholesale_core::{
    CompanyAddress, CompanyContactId, CompanyContactRoleId, CompanyId, CompanyLocationId,
    CustomerId, normalize_email,
};
use wholesale_proxy::shopify::{
    AddressType, AdminShopifyError, Company, CompanyCreateInput, CompanyLocation, CompanyRole,
    CompanyRoles, CreatedCompany, Customer, CustomerInput, CustomerSearch, Directory, Metafield,
    MetafieldInput,
};

/// Message Shopify returns when an email belongs to another customer.
pub const EMAIL_TAKEN: &str = "Email has already been taken";

/// Message Shopify returns when the customer is already one of the
/// company's contacts.
pub const ALREADY_A_CONTACT: &str = "Customer is already associated with a company contact";

/// Message Shopify returns for a mutation missing from the shop's schema.
pub const TAX_MUTATION_MISSING: &str =
    "Field 'companyLocationTaxSettingsUpdate' doesn't exist on type 'Mutation'";

/// One recorded directory call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SearchCustomers(CustomerSearch),
    CreateCustomer(CustomerInput),
    UpdateCustomer(CustomerId, CustomerInput),
    ListCompanies(i64),
    CreateCompany(CompanyCreateInput),
    SetMetafield(String, MetafieldInput),
    FirstLocation(CompanyId),
    RenameLocation(CompanyLocationId, String),
    AssignLocationAddress(CompanyLocationId, CompanyAddress),
    SetLocationTaxId(CompanyLocationId, String),
    AssignCustomerAsContact(CompanyId, CustomerId),
    AssignMainContact(CompanyId, CompanyContactId),
    CompanyRoles(CompanyId),
    AssignContactRole(CompanyContactId, CompanyContactRoleId, CompanyLocationId),
}

impl Call {
    /// The GraphQL operation this call stands for.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::SearchCustomers(_) => "customers",
            Self::CreateCustomer(_) => "customerCreate",
            Self::UpdateCustomer(..) => "customerUpdate",
            Self::ListCompanies(_) => "companies",
            Self::CreateCompany(_) => "companyCreate",
            Self::SetMetafield(..) => "metafieldsSet",
            Self::FirstLocation(_) => "companyLocations",
            Self::RenameLocation(..) => "companyLocationUpdate",
            Self::AssignLocationAddress(..) => "companyLocationAssignAddress",
            Self::SetLocationTaxId(..) => "companyLocationTaxSettingsUpdate",
            Self::AssignCustomerAsContact(..) => "companyAssignCustomerAsContact",
            Self::AssignMainContact(..) => "companyAssignMainContact",
            Self::CompanyRoles(_) => "companyContactRoles",
            Self::AssignContactRole(..) => "companyContactAssignRole",
        }
    }
}

/// A failure to inject into an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The request never got an answer.
    Transport,
    /// A top-level GraphQL error.
    GraphQL(String),
    /// A mutation `userErrors` entry.
    UserError(String),
}

impl Failure {
    fn to_error(&self) -> AdminShopifyError {
        match self {
            Self::Transport => AdminShopifyError::RateLimited(2),
            Self::GraphQL(message) => AdminShopifyError::graphql(message.clone()),
            Self::UserError(message) => AdminShopifyError::user_error(&[], message.clone(), None),
        }
    }
}

/// A stored customer.
#[derive(Debug, Clone)]
pub struct StoredCustomer {
    pub customer: Customer,
    /// Visible to filtered searches.
    pub searchable: bool,
}

/// A stored company with its B2B structure.
#[derive(Debug, Clone)]
pub struct StoredCompany {
    pub company: Company,
    pub locations: Vec<StoredLocation>,
    /// Contact id -> customer id.
    pub contacts: Vec<(CompanyContactId, CustomerId)>,
    pub main_contact: Option<CompanyContactId>,
    pub roles: CompanyRoles,
    pub role_assignments: Vec<(CompanyContactId, CompanyContactRoleId, CompanyLocationId)>,
}

/// A stored company location.
#[derive(Debug, Clone)]
pub struct StoredLocation {
    pub location: CompanyLocation,
    pub address: Option<CompanyAddress>,
    pub tax_id: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    customers: Vec<StoredCustomer>,
    companies: Vec<StoredCompany>,
    calls: Vec<Call>,
    failures: HashMap<&'static str, Failure>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn email_taken(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.customers.iter().any(|c| {
            c.customer
                .email
                .as_deref()
                .is_some_and(|e| normalize_email(e) == email)
        })
    }

    fn new_customer(&mut self, input: &CustomerInput) -> Customer {
        let customer = Customer {
            id: CustomerId::from_legacy_id(self.next_id()),
            email: input.email.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            phone: input.phone.clone(),
            tags: input.tags.clone().unwrap_or_default(),
        };
        self.customers.push(StoredCustomer {
            customer: customer.clone(),
            searchable: true,
        });
        customer
    }

    fn company_mut(&mut self, id: &CompanyId) -> Result<&mut StoredCompany, AdminShopifyError> {
        self.companies
            .iter_mut()
            .find(|c| &c.company.id == id)
            .ok_or_else(|| AdminShopifyError::NotFound(id.to_string()))
    }

    fn location_mut(
        &mut self,
        id: &CompanyLocationId,
    ) -> Result<&mut StoredLocation, AdminShopifyError> {
        self.companies
            .iter_mut()
            .flat_map(|c| c.locations.iter_mut())
            .find(|l| &l.location.id == id)
            .ok_or_else(|| AdminShopifyError::NotFound(id.to_string()))
    }
}

/// Default role catalog of a new company, as Shopify seeds it.
#[must_use]
pub fn default_roles() -> CompanyRoles {
    let admin = CompanyRole {
        id: CompanyContactRoleId::from_legacy_id(9001),
        name: "Location admin".to_string(),
    };
    let ordering = CompanyRole {
        id: CompanyContactRoleId::from_legacy_id(9002),
        name: "Ordering only".to_string(),
    };
    CompanyRoles {
        default_role: None,
        roles: vec![admin, ordering],
    }
}

/// An in-memory [`Directory`].
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: Mutex<State>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an existing customer. Hidden customers are only returned by
    /// unfiltered listings.
    pub fn insert_customer(
        &self,
        email: &str,
        phone: Option<&str>,
        tags: &[&str],
        searchable: bool,
    ) -> CustomerId {
        let mut state = self.state();
        let id = CustomerId::from_legacy_id(state.next_id());
        state.customers.push(StoredCustomer {
            customer: Customer {
                id: id.clone(),
                email: Some(email.to_string()),
                first_name: None,
                last_name: None,
                phone: phone.map(String::from),
                tags: tags.iter().map(|t| (*t).to_string()).collect(),
            },
            searchable,
        });
        id
    }

    /// Add an existing company with one location and the default roles.
    pub fn insert_company(&self, name: &str, company_email: Option<&str>) -> CompanyId {
        let mut state = self.state();
        let id = CompanyId::from_legacy_id(state.next_id());
        let location_id = CompanyLocationId::from_legacy_id(state.next_id());
        state.companies.push(StoredCompany {
            company: Company {
                id: id.clone(),
                name: name.to_string(),
                metafields: company_email
                    .map(|email| {
                        vec![Metafield {
                            namespace: "custom".to_string(),
                            key: "companyEmail".to_string(),
                            value: email.to_string(),
                        }]
                    })
                    .unwrap_or_default(),
            },
            locations: vec![StoredLocation {
                location: CompanyLocation {
                    id: location_id,
                    name: name.to_string(),
                },
                address: None,
                tax_id: None,
            }],
            contacts: vec![],
            main_contact: None,
            roles: default_roles(),
            role_assignments: vec![],
        });
        id
    }

    /// Make `operation` (a [`Call::operation`] name) fail from now on.
    pub fn fail(&self, operation: &'static str, failure: Failure) {
        self.state().failures.insert(operation, failure);
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Operation names of every call so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<&'static str> {
        self.state().calls.iter().map(Call::operation).collect()
    }

    /// Number of calls to `operation`.
    #[must_use]
    pub fn count(&self, operation: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    #[must_use]
    pub fn customer(&self, id: &CustomerId) -> Option<Customer> {
        self.state()
            .customers
            .iter()
            .find(|c| &c.customer.id == id)
            .map(|c| c.customer.clone())
    }

    #[must_use]
    pub fn customers(&self) -> Vec<Customer> {
        self.state()
            .customers
            .iter()
            .map(|c| c.customer.clone())
            .collect()
    }

    #[must_use]
    pub fn company(&self, id: &CompanyId) -> Option<StoredCompany> {
        self.state()
            .companies
            .iter()
            .find(|c| &c.company.id == id)
            .cloned()
    }

    #[must_use]
    pub fn company_count(&self) -> usize {
        self.state().companies.len()
    }

    /// Record the call, then fail it if a failure was injected.
    fn enter(&self, call: Call) -> Result<MutexGuard<'_, State>, AdminShopifyError> {
        let mut state = self.state();
        let operation = call.operation();
        state.calls.push(call);
        match state.failures.get(operation) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(state),
        }
    }
}

/// The term of an `email:` query, without quotes.
fn search_term(query: &str) -> String {
    let term = query.strip_prefix("email:").unwrap_or(query);
    normalize_email(term.trim_matches('"'))
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn search_customers(
        &self,
        search: &CustomerSearch,
    ) -> Result<Vec<Customer>, AdminShopifyError> {
        let state = self.enter(Call::SearchCustomers(search.clone()))?;
        let limit = usize::try_from(search.first).unwrap_or(0);

        let results: Vec<Customer> = match &search.query {
            // Like Shopify, filtered search matches substrings.
            Some(query) => {
                let term = search_term(query);
                state
                    .customers
                    .iter()
                    .filter(|c| c.searchable)
                    .filter(|c| {
                        c.customer
                            .email
                            .as_deref()
                            .is_some_and(|e| normalize_email(e).contains(&term))
                    })
                    .take(limit)
                    .map(|c| c.customer.clone())
                    .collect()
            }
            None => {
                let mut all: Vec<Customer> =
                    state.customers.iter().map(|c| c.customer.clone()).collect();
                if search.newest_first {
                    all.reverse();
                }
                all.into_iter().take(limit).collect()
            }
        };

        Ok(results)
    }

    async fn create_customer(&self, input: &CustomerInput) -> Result<Customer, AdminShopifyError> {
        let mut state = self.enter(Call::CreateCustomer(input.clone()))?;

        if input.email.as_deref().is_some_and(|e| state.email_taken(e)) {
            return Err(AdminShopifyError::user_error(
                &["email"],
                EMAIL_TAKEN,
                Some("TAKEN"),
            ));
        }

        Ok(state.new_customer(input))
    }

    async fn update_customer(
        &self,
        id: &CustomerId,
        input: &CustomerInput,
    ) -> Result<Customer, AdminShopifyError> {
        let mut state = self.enter(Call::UpdateCustomer(id.clone(), input.clone()))?;

        let stored = state
            .customers
            .iter_mut()
            .find(|c| &c.customer.id == id)
            .ok_or_else(|| AdminShopifyError::NotFound(id.to_string()))?;
        let customer = &mut stored.customer;

        if let Some(email) = &input.email {
            customer.email = Some(email.clone());
        }
        if let Some(first_name) = &input.first_name {
            customer.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &input.last_name {
            customer.last_name = Some(last_name.clone());
        }
        if let Some(phone) = &input.phone {
            customer.phone = Some(phone.clone());
        }
        if let Some(tags) = &input.tags {
            customer.tags.clone_from(tags);
        }

        Ok(customer.clone())
    }

    async fn list_companies(&self, first: i64) -> Result<Vec<Company>, AdminShopifyError> {
        let state = self.enter(Call::ListCompanies(first))?;
        Ok(state
            .companies
            .iter()
            .take(usize::try_from(first).unwrap_or(0))
            .map(|c| c.company.clone())
            .collect())
    }

    async fn create_company(
        &self,
        input: &CompanyCreateInput,
    ) -> Result<CreatedCompany, AdminShopifyError> {
        let mut state = self.enter(Call::CreateCompany(input.clone()))?;

        if let Some(contact) = &input.contact
            && state.email_taken(&contact.email)
        {
            return Err(AdminShopifyError::user_error(
                &["input", "companyContact", "email"],
                EMAIL_TAKEN,
                Some("TAKEN"),
            ));
        }

        let id = CompanyId::from_legacy_id(state.next_id());
        let location_id = CompanyLocationId::from_legacy_id(state.next_id());

        let (main_contact, main_contact_customer_id) = match &input.contact {
            Some(contact) => {
                let customer = state.new_customer(&CustomerInput {
                    email: Some(contact.email.clone()),
                    first_name: contact.first_name.clone(),
                    last_name: contact.last_name.clone(),
                    phone: contact.phone.clone(),
                    tags: None,
                });
                let contact_id = CompanyContactId::from_legacy_id(state.next_id());
                (Some((contact_id, customer.id.clone())), Some(customer.id))
            }
            None => (None, None),
        };

        state.companies.push(StoredCompany {
            company: Company {
                id: id.clone(),
                name: input.name.clone(),
                metafields: vec![],
            },
            locations: vec![StoredLocation {
                location: CompanyLocation {
                    id: location_id,
                    name: input
                        .location_name
                        .clone()
                        .unwrap_or_else(|| input.name.clone()),
                },
                address: None,
                tax_id: None,
            }],
            contacts: main_contact.iter().cloned().collect(),
            main_contact: main_contact.as_ref().map(|(contact_id, _)| contact_id.clone()),
            roles: default_roles(),
            role_assignments: vec![],
        });

        Ok(CreatedCompany {
            id,
            main_contact_id: main_contact.map(|(contact_id, _)| contact_id),
            main_contact_customer_id,
        })
    }

    async fn set_metafield(
        &self,
        owner_id: &str,
        metafield: &MetafieldInput,
    ) -> Result<(), AdminShopifyError> {
        let mut state = self.enter(Call::SetMetafield(owner_id.to_string(), metafield.clone()))?;
        let company = state.company_mut(&CompanyId::new(owner_id))?;

        company
            .company
            .metafields
            .retain(|m| !(m.namespace == metafield.namespace && m.key == metafield.key));
        company.company.metafields.push(Metafield {
            namespace: metafield.namespace.clone(),
            key: metafield.key.clone(),
            value: metafield.value.clone(),
        });
        Ok(())
    }

    async fn first_location(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<CompanyLocation>, AdminShopifyError> {
        let mut state = self.enter(Call::FirstLocation(company_id.clone()))?;
        let company = state.company_mut(company_id)?;
        Ok(company.locations.first().map(|l| l.location.clone()))
    }

    async fn rename_location(
        &self,
        location_id: &CompanyLocationId,
        name: &str,
    ) -> Result<(), AdminShopifyError> {
        let mut state =
            self.enter(Call::RenameLocation(location_id.clone(), name.to_string()))?;
        state.location_mut(location_id)?.location.name = name.to_string();
        Ok(())
    }

    async fn assign_location_address(
        &self,
        location_id: &CompanyLocationId,
        address: &CompanyAddress,
        _address_types: &[AddressType],
    ) -> Result<(), AdminShopifyError> {
        let mut state = self.enter(Call::AssignLocationAddress(
            location_id.clone(),
            address.clone(),
        ))?;
        state.location_mut(location_id)?.address = Some(address.clone());
        Ok(())
    }

    async fn set_location_tax_id(
        &self,
        location_id: &CompanyLocationId,
        tax_registration_id: &str,
    ) -> Result<(), AdminShopifyError> {
        let mut state = self.enter(Call::SetLocationTaxId(
            location_id.clone(),
            tax_registration_id.to_string(),
        ))?;
        state.location_mut(location_id)?.tax_id = Some(tax_registration_id.to_string());
        Ok(())
    }

    async fn assign_customer_as_contact(
        &self,
        company_id: &CompanyId,
        customer_id: &CustomerId,
    ) -> Result<CompanyContactId, AdminShopifyError> {
        let mut state = self.enter(Call::AssignCustomerAsContact(
            company_id.clone(),
            customer_id.clone(),
        ))?;
        if state
            .company_mut(company_id)?
            .contacts
            .iter()
            .any(|(_, existing)| existing == customer_id)
        {
            return Err(AdminShopifyError::user_error(
                &["customerId"],
                ALREADY_A_CONTACT,
                None,
            ));
        }

        let contact_id = CompanyContactId::from_legacy_id(state.next_id());
        state
            .company_mut(company_id)?
            .contacts
            .push((contact_id.clone(), customer_id.clone()));
        Ok(contact_id)
    }

    async fn assign_main_contact(
        &self,
        company_id: &CompanyId,
        contact_id: &CompanyContactId,
    ) -> Result<(), AdminShopifyError> {
        let mut state =
            self.enter(Call::AssignMainContact(company_id.clone(), contact_id.clone()))?;
        state.company_mut(company_id)?.main_contact = Some(contact_id.clone());
        Ok(())
    }

    async fn company_roles(
        &self,
        company_id: &CompanyId,
    ) -> Result<CompanyRoles, AdminShopifyError> {
        let mut state = self.enter(Call::CompanyRoles(company_id.clone()))?;
        Ok(state.company_mut(company_id)?.roles.clone())
    }

    async fn assign_contact_role(
        &self,
        contact_id: &CompanyContactId,
        role_id: &CompanyContactRoleId,
        location_id: &CompanyLocationId,
    ) -> Result<(), AdminShopifyError> {
        let mut state = self.enter(Call::AssignContactRole(
            contact_id.clone(),
            role_id.clone(),
            location_id.clone(),
        ))?;

        let company = state
            .companies
            .iter_mut()
            .find(|c| c.contacts.iter().any(|(id, _)| id == contact_id))
            .ok_or_else(|| AdminShopifyError::NotFound(contact_id.to_string()))?;
        company
            .role_assignments
            .push((contact_id.clone(), role_id.clone(), location_id.clone()));
        Ok(())
    }
}
