//! Type conversions from GraphQL response types to domain types.
//!
//! These functions convert the wire types in `queries` into our clean
//! domain types, and fold mutation `userErrors` into `AdminShopifyError`.

mod companies;
mod customers;

pub use companies::{convert_company, convert_created_company, convert_location, convert_roles};
pub use customers::{convert_customer, customer_input};

use super::queries::UserErrorNode;
use crate::shopify::{AdminShopifyError, UserError};

/// Convert `userErrors` into an error when any are present.
///
/// # Errors
///
/// Returns `AdminShopifyError::UserErrors` if `errors` is non-empty.
pub fn check_user_errors(errors: Vec<UserErrorNode>) -> Result<(), AdminShopifyError> {
    if errors.is_empty() {
        return Ok(());
    }

    Err(AdminShopifyError::UserErrors(
        errors
            .into_iter()
            .map(|e| UserError {
                field: e.field.unwrap_or_default(),
                message: e.message,
                code: e.code,
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_user_errors_empty() {
        assert!(check_user_errors(vec![]).is_ok());
    }

    #[test]
    fn test_check_user_errors_converts() {
        let result = check_user_errors(vec![UserErrorNode {
            field: Some(vec!["input".to_string(), "email".to_string()]),
            message: "Email has already been taken".to_string(),
            code: None,
        }]);

        let Err(AdminShopifyError::UserErrors(errors)) = result else {
            panic!("expected user errors");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().map(|e| e.field.join(".")), Some("input.email".to_string()));
    }
}
