//! Registration workflow scenarios against an in-memory directory.

#![allow(clippy::unwrap_used)]

use wholesale_core::{CompanyContactRoleId, Registrant};
use wholesale_integration_tests::{
    ALREADY_A_CONTACT, Call, Failure, InMemoryDirectory, TAX_MUTATION_MISSING,
};
use wholesale_proxy::registration::{
    Orchestrator, RegistrationOutcome, StepOutcome, WorkflowError, WorkflowSettings,
    resolve_customer,
};

fn registrant() -> Registrant {
    Registrant {
        company_name: Some("Acme Supply".to_string()),
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        location: Some("Acme HQ".to_string()),
        tax_id: None,
        phone: Some("+15551234567".to_string()),
        company_email: Some("Orders@Acme.test".to_string()),
        user_email: Some("jane@acme.test".to_string()),
        address1: Some("1 Main St".to_string()),
        address2: None,
        country: Some("us".to_string()),
        state: Some("IL".to_string()),
        city: Some("Springfield".to_string()),
        zip_code: Some("62701".to_string()),
    }
}

async fn register(directory: &InMemoryDirectory, registrant: &Registrant) -> RegistrationOutcome {
    let settings = WorkflowSettings::default();
    Orchestrator::new(directory, &settings)
        .register(registrant)
        .await
        .unwrap()
}

fn position(operations: &[&str], operation: &str) -> usize {
    operations
        .iter()
        .position(|op| *op == operation)
        .unwrap_or_else(|| panic!("{operation} was not called: {operations:?}"))
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn test_identity_resolution_is_stable() {
    let directory = InMemoryDirectory::new();
    directory.insert_customer("jane@acme.test.example", None, &[], true);
    let id = directory.insert_customer("Jane@Acme.test", None, &[], true);

    let first = resolve_customer(&directory, " JANE@acme.test ").await.unwrap();
    let second = resolve_customer(&directory, "jane@acme.test").await.unwrap();

    assert_eq!(first.map(|c| c.id), Some(id.clone()));
    assert_eq!(second.map(|c| c.id), Some(id));
}

#[tokio::test]
async fn test_existing_phone_is_kept_when_none_submitted() {
    let directory = InMemoryDirectory::new();
    let id = directory.insert_customer("jane@acme.test", Some("+15550000000"), &[], true);

    let mut submission = registrant();
    submission.phone = None;
    let outcome = register(&directory, &submission).await;

    assert_eq!(outcome.customer_id.as_ref(), Some(&id));
    let update = directory
        .calls()
        .into_iter()
        .find_map(|call| match call {
            Call::UpdateCustomer(_, input) => Some(input),
            _ => None,
        })
        .unwrap();
    assert_eq!(update.phone, None);
    assert_eq!(
        directory.customer(&id).unwrap().phone.as_deref(),
        Some("+15550000000")
    );
}

#[tokio::test]
async fn test_submitted_phone_replaces_existing() {
    let directory = InMemoryDirectory::new();
    let id = directory.insert_customer("jane@acme.test", Some("+15550000000"), &[], true);

    register(&directory, &registrant()).await;

    assert_eq!(
        directory.customer(&id).unwrap().phone.as_deref(),
        Some("+15551234567")
    );
}

#[tokio::test]
async fn test_wholesale_tag_is_unioned() {
    let directory = InMemoryDirectory::new();
    let id = directory.insert_customer("jane@acme.test", None, &["vip", "newsletter"], true);

    register(&directory, &registrant()).await;
    assert_eq!(
        directory.customer(&id).unwrap().tags,
        vec!["vip", "newsletter", "wholesale"]
    );

    // A second registration does not duplicate the tag.
    register(&directory, &registrant()).await;
    assert_eq!(
        directory.customer(&id).unwrap().tags,
        vec!["vip", "newsletter", "wholesale"]
    );
}

#[tokio::test]
async fn test_registering_again_keeps_existing_contact() {
    let directory = InMemoryDirectory::new();
    let customer_id = directory.insert_customer("jane@acme.test", None, &[], true);

    let first = register(&directory, &registrant()).await;
    let company_id = first.company_id.unwrap();
    let main_contact = directory.company(&company_id).unwrap().main_contact;
    assert!(main_contact.is_some());

    let second = register(&directory, &registrant()).await;

    // The company is reused and the customer is already its contact, so
    // the contact, main-contact and role steps do not run again.
    assert!(second.success);
    assert_eq!(second.company_id.as_ref(), Some(&company_id));
    assert_eq!(second.customer_id.as_ref(), Some(&customer_id));
    assert!(second.customer_error.is_none());

    let assign = second.events_for("assign_contact").next().unwrap();
    assert_eq!(assign.outcome, StepOutcome::Failed);
    assert!(assign.detail.as_deref().unwrap().contains(ALREADY_A_CONTACT));
    let main = second.events_for("assign_main_contact").next().unwrap();
    assert_eq!(main.outcome, StepOutcome::Skipped);

    assert_eq!(directory.count("companyAssignCustomerAsContact"), 2);
    assert_eq!(directory.count("companyAssignMainContact"), 1);
    assert_eq!(directory.count("companyContactAssignRole"), 1);

    let company = directory.company(&company_id).unwrap();
    assert_eq!(company.contacts.len(), 1);
    assert_eq!(company.main_contact, main_contact);
}

// ============================================================================
// Company
// ============================================================================

#[tokio::test]
async fn test_matching_company_email_reuses_company() {
    let directory = InMemoryDirectory::new();
    directory.insert_company("Other Co", Some("buying@other.test"));
    let company_id = directory.insert_company("Acme Supply", Some(" ORDERS@acme.test"));

    let outcome = register(&directory, &registrant()).await;

    assert!(outcome.success);
    assert_eq!(outcome.company_id.as_ref(), Some(&company_id));
    assert_eq!(directory.count("companyCreate"), 0);
    assert_eq!(directory.count("metafieldsSet"), 0);
    assert_eq!(directory.company_count(), 2);

    // The new customer is linked to the reused company.
    let customer_id = outcome.customer_id.unwrap();
    let company = directory.company(&company_id).unwrap();
    assert!(company.contacts.iter().any(|(_, c)| c == &customer_id));

    // The location takes the submitted label.
    assert_eq!(company.locations[0].location.name, "Acme HQ");
}

#[tokio::test]
async fn test_new_company_gets_company_email_metafield() {
    let directory = InMemoryDirectory::new();

    let outcome = register(&directory, &registrant()).await;

    let company = directory.company(outcome.company_id.as_ref().unwrap()).unwrap();
    assert_eq!(company.company.company_email(), Some("orders@acme.test"));
}

#[tokio::test]
async fn test_no_address_skips_address_and_tax() {
    let directory = InMemoryDirectory::new();
    let mut submission = registrant();
    submission.address1 = None;
    submission.tax_id = Some("12-3456789".to_string());

    let outcome = register(&directory, &submission).await;

    assert!(outcome.success);
    assert_eq!(directory.count("companyLocationAssignAddress"), 0);
    assert_eq!(directory.count("companyLocationTaxSettingsUpdate"), 0);
}

#[tokio::test]
async fn test_company_create_failure_is_reported() {
    let directory = InMemoryDirectory::new();
    directory.fail(
        "companyCreate",
        Failure::UserError("Name is too long".to_string()),
    );

    let outcome = register(&directory, &registrant()).await;

    assert!(!outcome.success);
    assert_eq!(outcome.company_id, None);
    assert!(outcome.message.contains("Company could not be created"));
    assert!(outcome.message.contains("Name is too long"));
    // The customer is still created, just not linked.
    assert!(outcome.customer_id.is_some());
    assert_eq!(directory.count("companyAssignCustomerAsContact"), 0);
}

// ============================================================================
// Scenarios
// ============================================================================

/// New user, new company: the customer comes from the inline contact.
#[tokio::test]
async fn test_scenario_new_user_new_company() {
    let directory = InMemoryDirectory::new();

    let outcome = register(&directory, &registrant()).await;

    assert!(outcome.success);
    assert_eq!(outcome.customer_error, None);
    assert_eq!(outcome.message, "Wholesale registration completed");
    let company_id = outcome.company_id.unwrap();
    let customer_id = outcome.customer_id.unwrap();

    let create = directory
        .calls()
        .into_iter()
        .find_map(|call| match call {
            Call::CreateCompany(input) => Some(input),
            _ => None,
        })
        .unwrap();
    let contact = create.contact.unwrap();
    assert_eq!(contact.email, "jane@acme.test");
    assert_eq!(create.location_name.as_deref(), Some("Acme HQ"));
    assert_eq!(directory.count("customerCreate"), 0);

    let company = directory.company(&company_id).unwrap();
    let location = &company.locations[0];
    let address = location.address.as_ref().unwrap();
    assert_eq!(address.address1, "1 Main St");
    assert_eq!(address.country_code, "US");
    assert_eq!(address.zone_code.as_deref(), Some("IL"));

    let customer = directory.customer(&customer_id).unwrap();
    assert_eq!(customer.tags, vec!["wholesale"]);
    assert!(company.contacts.iter().any(|(_, c)| c == &customer_id));
}

/// Existing customer, new company: linked explicitly, in order.
#[tokio::test]
async fn test_scenario_existing_customer_new_company() {
    let directory = InMemoryDirectory::new();
    let customer_id = directory.insert_customer("jane@acme.test", None, &[], true);

    let outcome = register(&directory, &registrant()).await;

    assert!(outcome.success);
    assert_eq!(outcome.customer_id.as_ref(), Some(&customer_id));
    let company_id = outcome.company_id.unwrap();

    let calls = directory.calls();
    assert!(calls.iter().any(|call| matches!(
        call,
        Call::CreateCompany(input) if input.contact.is_none()
    )));

    let operations = directory.operations();
    let update = position(&operations, "customerUpdate");
    let create = position(&operations, "companyCreate");
    let contact = position(&operations, "companyAssignCustomerAsContact");
    let main = position(&operations, "companyAssignMainContact");
    let role = position(&operations, "companyContactAssignRole");
    assert!(update < create && create < contact && contact < main && main < role);

    let company = directory.company(&company_id).unwrap();
    let (contact_id, _) = company
        .contacts
        .iter()
        .find(|(_, c)| c == &customer_id)
        .unwrap();
    assert_eq!(company.main_contact.as_ref(), Some(contact_id));

    // No default role: the "admin" role wins over "Ordering only".
    let (_, role_id, location_id) = &company.role_assignments[0];
    assert_eq!(role_id, &CompanyContactRoleId::from_legacy_id(9001));
    assert_eq!(location_id, &company.locations[0].location.id);
}

/// `customerCreate` reports the email as taken; the fallback finds the
/// customer the lookup could not see.
#[tokio::test]
async fn test_scenario_email_taken_fallback() {
    let directory = InMemoryDirectory::new();
    directory.insert_company("Acme Supply", Some("orders@acme.test"));
    let hidden = directory.insert_customer("jane@acme.test", None, &["retail"], false);

    let outcome = register(&directory, &registrant()).await;

    assert!(outcome.success);
    assert_eq!(outcome.customer_error, None);
    assert_eq!(outcome.customer_id.as_ref(), Some(&hidden));
    assert_eq!(directory.count("customerCreate"), 1);
    assert_eq!(
        directory.customer(&hidden).unwrap().tags,
        vec!["retail", "wholesale"]
    );

    let fallback = outcome.events_for("find_taken_customer").next().unwrap();
    assert_eq!(fallback.outcome, StepOutcome::Succeeded);

    // Found after the conflict, so it is treated like an existing customer.
    assert_eq!(directory.count("companyAssignMainContact"), 1);
}

/// The email is taken by the time the company is created with its inline
/// contact: the company is created without it and the customer is found.
#[tokio::test]
async fn test_inline_contact_email_taken_retries_without_contact() {
    let directory = InMemoryDirectory::new();
    let hidden = directory.insert_customer("jane@acme.test", None, &[], false);

    let outcome = register(&directory, &registrant()).await;

    assert!(outcome.success);
    assert_eq!(outcome.customer_id.as_ref(), Some(&hidden));
    assert_eq!(directory.company_count(), 1);

    let creates: Vec<_> = directory
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::CreateCompany(input) => Some(input),
            _ => None,
        })
        .collect();
    assert_eq!(creates.len(), 2);
    assert!(creates[0].contact.is_some());
    assert!(creates[1].contact.is_none());

    let company = directory.company(outcome.company_id.as_ref().unwrap()).unwrap();
    assert!(company.contacts.iter().any(|(_, c)| c == &hidden));
}

/// The tax mutation is missing from the shop's schema.
#[tokio::test]
async fn test_scenario_tax_mutation_unsupported() {
    let directory = InMemoryDirectory::new();
    directory.fail(
        "companyLocationTaxSettingsUpdate",
        Failure::GraphQL(TAX_MUTATION_MISSING.to_string()),
    );
    let mut submission = registrant();
    submission.tax_id = Some("12-3456789".to_string());

    let outcome = register(&directory, &submission).await;

    assert!(outcome.success);
    assert!(outcome.company_id.is_some());
    assert!(outcome.customer_id.is_some());
    assert_eq!(outcome.customer_error, None);
    assert_eq!(outcome.message, "Wholesale registration completed");

    let tax = outcome.events_for("set_tax_id").next().unwrap();
    assert_eq!(tax.outcome, StepOutcome::SoftFailed);
}

#[tokio::test]
async fn test_tax_id_is_set_when_supported() {
    let directory = InMemoryDirectory::new();
    let mut submission = registrant();
    submission.tax_id = Some("12-3456789".to_string());

    let outcome = register(&directory, &submission).await;

    let company = directory.company(outcome.company_id.as_ref().unwrap()).unwrap();
    assert_eq!(company.locations[0].tax_id.as_deref(), Some("12-3456789"));
}

// ============================================================================
// Fatal errors
// ============================================================================

#[tokio::test]
async fn test_customer_lookup_failure_aborts_before_writes() {
    let directory = InMemoryDirectory::new();
    directory.fail("customers", Failure::Transport);
    let settings = WorkflowSettings::default();

    let result = Orchestrator::new(&directory, &settings)
        .register(&registrant())
        .await;

    assert!(matches!(result, Err(WorkflowError::CustomerLookup(_))));
    assert_eq!(directory.operations(), vec!["customers"]);
}

#[tokio::test]
async fn test_company_lookup_failure_aborts_before_company_writes() {
    let directory = InMemoryDirectory::new();
    directory.fail("companies", Failure::Transport);
    let settings = WorkflowSettings::default();

    let result = Orchestrator::new(&directory, &settings)
        .register(&registrant())
        .await;

    assert!(matches!(result, Err(WorkflowError::CompanyLookup(_))));
    assert_eq!(directory.count("companyCreate"), 0);
    assert_eq!(directory.count("customerCreate"), 0);
}

#[tokio::test]
async fn test_company_lookup_failure_leaves_existing_customer_untouched() {
    let directory = InMemoryDirectory::new();
    let id = directory.insert_customer("jane@acme.test", None, &["vip"], true);
    directory.fail("companies", Failure::Transport);
    let settings = WorkflowSettings::default();

    let result = Orchestrator::new(&directory, &settings)
        .register(&registrant())
        .await;

    assert!(matches!(result, Err(WorkflowError::CompanyLookup(_))));
    assert_eq!(directory.operations(), vec!["customers", "companies"]);
    let customer = directory.customer(&id).unwrap();
    assert_eq!(customer.tags, vec!["vip"]);
    assert_eq!(customer.phone, None);
}

#[tokio::test]
async fn test_customer_update_failure_keeps_company() {
    let directory = InMemoryDirectory::new();
    directory.insert_customer("jane@acme.test", None, &[], true);
    directory.fail(
        "customerUpdate",
        Failure::UserError("Phone is invalid".to_string()),
    );

    let outcome = register(&directory, &registrant()).await;

    assert!(outcome.success);
    assert!(outcome.company_id.is_some());
    assert!(outcome.customer_error.as_deref().unwrap().contains("Phone is invalid"));
    assert_eq!(
        outcome.message,
        "Company registered, but the customer account could not be updated"
    );
}
