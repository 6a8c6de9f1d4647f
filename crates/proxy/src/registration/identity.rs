//! Customer lookup by email.

use tracing::instrument;
use wholesale_core::normalize_email;

use crate::shopify::{AdminShopifyError, Customer, CustomerSearch, Directory};

/// Results requested for the primary `email:` lookup.
const LOOKUP_LIMIT: i64 = 5;
/// Results requested for the bare-email prefix search.
const PREFIX_LIMIT: i64 = 10;
/// Most recent customers scanned when both searches miss.
const RECENT_SCAN_LIMIT: i64 = 250;

/// Find the customer whose email matches `email` exactly.
///
/// The email is trimmed and lowercased first; a blank email is "not found"
/// without a remote call. The directory's search may tokenize or
/// substring-match, so every result is re-checked.
///
/// # Errors
///
/// Returns the directory error if the search request fails.
#[instrument(skip(directory))]
pub async fn resolve_customer(
    directory: &dyn Directory,
    email: &str,
) -> Result<Option<Customer>, AdminShopifyError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Ok(None);
    }

    let results = directory
        .search_customers(&CustomerSearch::by_query(
            format!("email:{email}"),
            LOOKUP_LIMIT,
        ))
        .await?;

    Ok(first_exact_match(results, &email))
}

/// Locate a customer that `customerCreate` reported as already taken.
///
/// The search index can lag behind writes, so the primary lookup may have
/// missed a customer that does exist. Tries, in order: a quoted `email:`
/// query, the bare email, then the most recently created customers filtered
/// locally. A failing tier is logged and the next one is tried.
#[instrument(skip(directory))]
pub async fn find_taken_customer(directory: &dyn Directory, email: &str) -> Option<Customer> {
    let email = normalize_email(email);
    if email.is_empty() {
        return None;
    }

    let tiers = [
        CustomerSearch::by_query(format!("email:\"{email}\""), LOOKUP_LIMIT),
        CustomerSearch::by_query(email.clone(), PREFIX_LIMIT),
        CustomerSearch::recent(RECENT_SCAN_LIMIT),
    ];

    for search in &tiers {
        match directory.search_customers(search).await {
            Ok(results) => {
                if let Some(customer) = first_exact_match(results, &email) {
                    tracing::info!(
                        customer_id = %customer.id,
                        query = ?search.query,
                        "Found existing customer after email conflict"
                    );
                    return Some(customer);
                }
            }
            Err(e) => {
                tracing::warn!(query = ?search.query, error = %e, "Fallback customer search failed");
            }
        }
    }

    tracing::warn!("Email reported as taken but no matching customer was found");
    None
}

fn first_exact_match(customers: Vec<Customer>, normalized_email: &str) -> Option<Customer> {
    customers.into_iter().find(|c| {
        c.email
            .as_deref()
            .is_some_and(|e| normalize_email(e) == normalized_email)
    })
}

#[cfg(test)]
mod tests {
    use wholesale_core::CustomerId;

    use super::*;

    fn customer(id: u64, email: Option<&str>) -> Customer {
        Customer {
            id: CustomerId::from_legacy_id(id),
            email: email.map(String::from),
            first_name: None,
            last_name: None,
            phone: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_exact_match_skips_partial_hits() {
        let found = first_exact_match(
            vec![
                customer(1, Some("jo@acme.test.example")),
                customer(2, None),
                customer(3, Some(" JO@ACME.TEST ")),
            ],
            "jo@acme.test",
        );
        assert_eq!(found.map(|c| c.id), Some(CustomerId::from_legacy_id(3)));
    }

    #[test]
    fn test_exact_match_none() {
        assert!(first_exact_match(vec![customer(1, Some("x@y.test"))], "jo@acme.test").is_none());
    }
}
