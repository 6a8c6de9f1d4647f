//! Customer type conversion functions.

use wholesale_core::CustomerId;

use super::super::queries::{self, CustomerNode};
use crate::shopify::types::{Customer, CustomerInput};

pub fn convert_customer(node: CustomerNode) -> Customer {
    Customer {
        id: CustomerId::new(node.id),
        email: node.email,
        first_name: node.first_name,
        last_name: node.last_name,
        phone: node.phone,
        tags: node.tags,
    }
}

/// Build the wire `CustomerInput`; `id` is set for updates only.
pub fn customer_input(id: Option<&CustomerId>, input: &CustomerInput) -> queries::CustomerInput {
    queries::CustomerInput {
        id: id.map(|id| id.as_str().to_string()),
        email: input.email.clone(),
        first_name: input.first_name.clone(),
        last_name: input.last_name.clone(),
        phone: input.phone.clone(),
        tags: input.tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_customer() {
        let customer = convert_customer(CustomerNode {
            id: "gid://shopify/Customer/12".to_string(),
            email: Some("jo@acme.test".to_string()),
            first_name: Some("Jo".to_string()),
            last_name: None,
            phone: None,
            tags: vec!["vip".to_string()],
        });

        assert_eq!(customer.id.legacy_id(), Some(12));
        assert_eq!(customer.tags, vec!["vip".to_string()]);
    }

    #[test]
    fn test_customer_input_for_update_carries_id() {
        let id = CustomerId::from_legacy_id(12);
        let input = customer_input(
            Some(&id),
            &CustomerInput {
                phone: Some("+15555550100".to_string()),
                ..CustomerInput::default()
            },
        );

        assert_eq!(input.id.as_deref(), Some("gid://shopify/Customer/12"));
        assert!(input.email.is_none());
        assert_eq!(input.phone.as_deref(), Some("+15555550100"));
    }
}
