//! GraphQL operation definitions for the Shopify Admin API.
//!
//! Each operation implements `graphql_client::GraphQLQuery` by hand: the
//! document lives next to its `Variables` and `ResponseData` types, so
//! `AdminClient::execute::<Op>()` works exactly as it would with generated
//! code, without vendoring the multi-megabyte Admin schema.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

/// Declare an operation struct and its `GraphQLQuery` impl.
macro_rules! operation {
    ($name:ident, $module:ident, $document:expr) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: stringify!($name),
                }
            }
        }
    };
}

// =============================================================================
// Shared selections
// =============================================================================

/// `{ nodes { ... } }` connection wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

/// Any object selected by `id` only.
#[derive(Debug, Clone, Deserialize)]
pub struct IdNode {
    pub id: String,
}

/// `userErrors { field message code }`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserErrorNode {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNode {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationNode {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetafieldNode {
    pub namespace: String,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleNode {
    pub id: String,
    pub name: String,
}

/// `CustomerInput` (create and update share it; `id` only on update).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// `customerCreate`/`customerUpdate` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    pub customer: Option<CustomerNode>,
    #[serde(default)]
    pub user_errors: Vec<UserErrorNode>,
}

/// Payload of a mutation whose result object we only need the id of.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserErrorsPayload {
    #[serde(default)]
    pub user_errors: Vec<UserErrorNode>,
}

// =============================================================================
// Customer operations
// =============================================================================

operation!(
    FindCustomers,
    find_customers,
    r"query FindCustomers($query: String, $first: Int!, $sortKey: CustomerSortKeys, $reverse: Boolean) {
  customers(first: $first, query: $query, sortKey: $sortKey, reverse: $reverse) {
    nodes { id email firstName lastName phone tags }
  }
}"
);

pub mod find_customers {
    use super::{CustomerNode, Deserialize, Nodes, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub query: Option<String>,
        pub first: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sort_key: Option<String>,
        pub reverse: bool,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub customers: Nodes<CustomerNode>,
    }
}

operation!(
    CustomerCreate,
    customer_create,
    r"mutation CustomerCreate($input: CustomerInput!) {
  customerCreate(input: $input) {
    customer { id email firstName lastName phone tags }
    userErrors { field message }
  }
}"
);

pub mod customer_create {
    use super::{CustomerInput, CustomerPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CustomerInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_create: Option<CustomerPayload>,
    }
}

operation!(
    CustomerUpdate,
    customer_update,
    r"mutation CustomerUpdate($input: CustomerInput!) {
  customerUpdate(input: $input) {
    customer { id email firstName lastName phone tags }
    userErrors { field message }
  }
}"
);

pub mod customer_update {
    use super::{CustomerInput, CustomerPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CustomerInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_update: Option<CustomerPayload>,
    }
}

// =============================================================================
// Company operations
// =============================================================================

operation!(
    FindCompanies,
    find_companies,
    r#"query FindCompanies($first: Int!) {
  companies(first: $first) {
    nodes {
      id
      name
      metafields(first: 20, namespace: "custom") {
        nodes { namespace key value }
      }
    }
  }
}"#
);

pub mod find_companies {
    use super::{Deserialize, MetafieldNode, Nodes, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CompanyNode {
        pub id: String,
        pub name: String,
        pub metafields: Nodes<MetafieldNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub companies: Nodes<CompanyNode>,
    }
}

operation!(
    CompanyCreate,
    company_create,
    r"mutation CompanyCreate($input: CompanyCreateInput!) {
  companyCreate(input: $input) {
    company {
      id
      name
      mainContact { id customer { id } }
    }
    userErrors { field message code }
  }
}"
);

pub mod company_create {
    use super::{Deserialize, IdNode, Serialize, UserErrorNode};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CompanyCreateInput,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CompanyCreateInput {
        pub company: CompanyInput,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub company_contact: Option<CompanyContactInput>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub company_location: Option<CompanyLocationInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CompanyInput {
        pub name: String,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CompanyContactInput {
        pub email: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub first_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub last_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub phone: Option<String>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CompanyLocationInput {
        pub name: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct MainContactNode {
        pub id: String,
        pub customer: Option<IdNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CompanyNode {
        pub id: String,
        pub main_contact: Option<MainContactNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CompanyCreatePayload {
        pub company: Option<CompanyNode>,
        #[serde(default)]
        pub user_errors: Vec<UserErrorNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub company_create: Option<CompanyCreatePayload>,
    }
}

operation!(
    MetafieldsSet,
    metafields_set,
    r"mutation MetafieldsSet($metafields: [MetafieldsSetInput!]!) {
  metafieldsSet(metafields: $metafields) {
    metafields { id }
    userErrors { field message code }
  }
}"
);

pub mod metafields_set {
    use super::{Deserialize, Serialize, UserErrorsPayload};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub metafields: Vec<MetafieldsSetInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MetafieldsSetInput {
        pub owner_id: String,
        pub namespace: String,
        pub key: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub metafields_set: Option<UserErrorsPayload>,
    }
}

operation!(
    CompanyFirstLocation,
    company_first_location,
    r"query CompanyFirstLocation($companyId: ID!) {
  company(id: $companyId) {
    locations(first: 1) {
      nodes { id name }
    }
  }
}"
);

pub mod company_first_location {
    use super::{Deserialize, LocationNode, Nodes, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub company_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CompanyNode {
        pub locations: Nodes<LocationNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub company: Option<CompanyNode>,
    }
}

operation!(
    CompanyRolesQuery,
    company_roles_query,
    r"query CompanyRolesQuery($companyId: ID!) {
  company(id: $companyId) {
    defaultRole { id name }
    contactRoles(first: 20) {
      nodes { id name }
    }
  }
}"
);

pub mod company_roles_query {
    use super::{Deserialize, Nodes, RoleNode, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub company_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CompanyNode {
        pub default_role: Option<RoleNode>,
        pub contact_roles: Nodes<RoleNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub company: Option<CompanyNode>,
    }
}

// =============================================================================
// Company location operations
// =============================================================================

operation!(
    CompanyLocationUpdate,
    company_location_update,
    r"mutation CompanyLocationUpdate($companyLocationId: ID!, $input: CompanyLocationUpdateInput!) {
  companyLocationUpdate(companyLocationId: $companyLocationId, input: $input) {
    companyLocation { id name }
    userErrors { field message code }
  }
}"
);

pub mod company_location_update {
    use super::{Deserialize, Serialize, UserErrorsPayload};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub company_location_id: String,
        pub input: CompanyLocationUpdateInput,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CompanyLocationUpdateInput {
        pub name: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub company_location_update: Option<UserErrorsPayload>,
    }
}

operation!(
    CompanyLocationAssignAddress,
    company_location_assign_address,
    r"mutation CompanyLocationAssignAddress($locationId: ID!, $address: CompanyAddressInput!, $addressTypes: [CompanyAddressType!]!) {
  companyLocationAssignAddress(locationId: $locationId, address: $address, addressTypes: $addressTypes) {
    addresses { id }
    userErrors { field message code }
  }
}"
);

pub mod company_location_assign_address {
    use super::{Deserialize, Serialize, UserErrorsPayload};
    use crate::shopify::AddressType;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub location_id: String,
        pub address: CompanyAddressInput,
        pub address_types: Vec<AddressType>,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CompanyAddressInput {
        pub address1: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub address2: Option<String>,
        pub city: String,
        pub zip: String,
        pub country_code: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub zone_code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub recipient: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub phone: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub company_location_assign_address: Option<UserErrorsPayload>,
    }
}

operation!(
    CompanyLocationTaxSettingsUpdate,
    company_location_tax_settings_update,
    r"mutation CompanyLocationTaxSettingsUpdate($companyLocationId: ID!, $taxRegistrationId: String) {
  companyLocationTaxSettingsUpdate(companyLocationId: $companyLocationId, taxRegistrationId: $taxRegistrationId) {
    companyLocation { id }
    userErrors { field message code }
  }
}"
);

pub mod company_location_tax_settings_update {
    use super::{Deserialize, Serialize, UserErrorsPayload};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub company_location_id: String,
        pub tax_registration_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub company_location_tax_settings_update: Option<UserErrorsPayload>,
    }
}

// =============================================================================
// Contact operations
// =============================================================================

operation!(
    CompanyAssignCustomerAsContact,
    company_assign_customer_as_contact,
    r"mutation CompanyAssignCustomerAsContact($companyId: ID!, $customerId: ID!) {
  companyAssignCustomerAsContact(companyId: $companyId, customerId: $customerId) {
    companyContact { id }
    userErrors { field message code }
  }
}"
);

pub mod company_assign_customer_as_contact {
    use super::{Deserialize, IdNode, Serialize, UserErrorNode};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub company_id: String,
        pub customer_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub company_contact: Option<IdNode>,
        #[serde(default)]
        pub user_errors: Vec<UserErrorNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub company_assign_customer_as_contact: Option<Payload>,
    }
}

operation!(
    CompanyAssignMainContact,
    company_assign_main_contact,
    r"mutation CompanyAssignMainContact($companyId: ID!, $companyContactId: ID!) {
  companyAssignMainContact(companyId: $companyId, companyContactId: $companyContactId) {
    company { id }
    userErrors { field message code }
  }
}"
);

pub mod company_assign_main_contact {
    use super::{Deserialize, Serialize, UserErrorsPayload};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub company_id: String,
        pub company_contact_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub company_assign_main_contact: Option<UserErrorsPayload>,
    }
}

operation!(
    CompanyContactAssignRole,
    company_contact_assign_role,
    r"mutation CompanyContactAssignRole($companyContactId: ID!, $companyContactRoleId: ID!, $companyLocationId: ID!) {
  companyContactAssignRole(companyContactId: $companyContactId, companyContactRoleId: $companyContactRoleId, companyLocationId: $companyLocationId) {
    companyContactRoleAssignment { id }
    userErrors { field message code }
  }
}"
);

pub mod company_contact_assign_role {
    use super::{Deserialize, Serialize, UserErrorsPayload};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub company_contact_id: String,
        pub company_contact_role_id: String,
        pub company_location_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub company_contact_assign_role: Option<UserErrorsPayload>,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_uses_operation_name() {
        let body = CustomerUpdate::build_query(customer_update::Variables {
            input: CustomerInput {
                id: Some("gid://shopify/Customer/1".to_string()),
                tags: Some(vec!["wholesale".to_string()]),
                ..CustomerInput::default()
            },
        });

        assert_eq!(body.operation_name, "CustomerUpdate");
        assert!(body.query.starts_with("mutation CustomerUpdate("));
    }

    #[test]
    fn test_customer_input_omits_unset_fields() {
        let input = CustomerInput {
            id: Some("gid://shopify/Customer/1".to_string()),
            first_name: Some("Jo".to_string()),
            ..CustomerInput::default()
        };

        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": "gid://shopify/Customer/1", "firstName": "Jo" })
        );
    }

    #[test]
    fn test_metafields_set_input_wire_names() {
        let input = metafields_set::MetafieldsSetInput {
            owner_id: "gid://shopify/Company/1".to_string(),
            namespace: "custom".to_string(),
            key: "companyEmail".to_string(),
            kind: "single_line_text_field".to_string(),
            value: "buying@acme.test".to_string(),
        };

        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["ownerId"], "gid://shopify/Company/1");
        assert_eq!(json["type"], "single_line_text_field");
    }

    #[test]
    fn test_company_create_response_decodes() {
        let data: company_create::ResponseData = serde_json::from_value(serde_json::json!({
            "companyCreate": {
                "company": {
                    "id": "gid://shopify/Company/9",
                    "name": "Acme",
                    "mainContact": {
                        "id": "gid://shopify/CompanyContact/3",
                        "customer": { "id": "gid://shopify/Customer/4" }
                    }
                },
                "userErrors": []
            }
        }))
        .unwrap();

        let company = data.company_create.unwrap().company.unwrap();
        assert_eq!(company.id, "gid://shopify/Company/9");
        assert_eq!(
            company.main_contact.unwrap().customer.unwrap().id,
            "gid://shopify/Customer/4"
        );
    }
}
