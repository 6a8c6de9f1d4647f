//! B2B company, location and contact operations for the Admin API.

use tracing::instrument;
use wholesale_core::{
    CompanyAddress, CompanyContactId, CompanyContactRoleId, CompanyId, CompanyLocationId,
    CustomerId,
};

use super::{
    AdminClient, AdminShopifyError,
    conversions::{
        check_user_errors, convert_company, convert_created_company, convert_location,
        convert_roles,
    },
    queries::{
        CompanyAssignCustomerAsContact, CompanyAssignMainContact, CompanyContactAssignRole,
        CompanyCreate, CompanyFirstLocation, CompanyLocationAssignAddress,
        CompanyLocationTaxSettingsUpdate, CompanyLocationUpdate, CompanyRolesQuery, FindCompanies,
        MetafieldsSet, UserErrorsPayload,
        company_assign_customer_as_contact, company_assign_main_contact,
        company_contact_assign_role, company_create, company_first_location,
        company_location_assign_address, company_location_tax_settings_update,
        company_location_update, company_roles_query, find_companies, metafields_set,
    },
};
use crate::shopify::types::{
    AddressType, Company, CompanyCreateInput, CompanyLocation, CompanyRoles, CreatedCompany,
    MetafieldInput,
};

impl AdminClient {
    // =========================================================================
    // Companies
    // =========================================================================

    /// List the first `first` companies with their `custom` metafields.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn find_companies(&self, first: i64) -> Result<Vec<Company>, AdminShopifyError> {
        let response = self
            .execute::<FindCompanies>(find_companies::Variables { first })
            .await?;

        Ok(response
            .companies
            .nodes
            .into_iter()
            .map(convert_company)
            .collect())
    }

    /// Create a company with an optional inline contact and location.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserErrors` if Shopify rejects the input.
    /// When the inline contact's email already belongs to a customer the
    /// error satisfies [`AdminShopifyError::is_email_taken`].
    #[instrument(skip(self, input), fields(shop = %self.shop(), name = %input.name))]
    pub async fn company_create(
        &self,
        input: &CompanyCreateInput,
    ) -> Result<CreatedCompany, AdminShopifyError> {
        let variables = company_create::Variables {
            input: company_create::CompanyCreateInput {
                company: company_create::CompanyInput {
                    name: input.name.clone(),
                },
                company_contact: input.contact.as_ref().map(|c| {
                    company_create::CompanyContactInput {
                        email: c.email.clone(),
                        first_name: c.first_name.clone(),
                        last_name: c.last_name.clone(),
                        phone: c.phone.clone(),
                    }
                }),
                company_location: input.location_name.as_ref().map(|name| {
                    company_create::CompanyLocationInput { name: name.clone() }
                }),
            },
        };

        let response = self.execute::<CompanyCreate>(variables).await?;

        let payload = response
            .company_create
            .ok_or_else(|| AdminShopifyError::graphql("No payload returned from company create"))?;

        check_user_errors(payload.user_errors)?;

        payload
            .company
            .map(convert_created_company)
            .ok_or_else(|| AdminShopifyError::graphql("No company returned from create"))
    }

    /// Set a metafield on any owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self, metafield), fields(shop = %self.shop(), key = %metafield.key))]
    pub async fn metafield_set(
        &self,
        owner_id: &str,
        metafield: &MetafieldInput,
    ) -> Result<(), AdminShopifyError> {
        let variables = metafields_set::Variables {
            metafields: vec![metafields_set::MetafieldsSetInput {
                owner_id: owner_id.to_string(),
                namespace: metafield.namespace.clone(),
                key: metafield.key.clone(),
                kind: metafield.kind.clone(),
                value: metafield.value.clone(),
            }],
        };

        let response = self.execute::<MetafieldsSet>(variables).await?;
        check_payload(response.metafields_set, "metafields set")
    }

    /// Get the roles a company can grant its contacts.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::NotFound` if the company does not exist.
    #[instrument(skip(self), fields(shop = %self.shop(), company_id = %company_id))]
    pub async fn company_contact_roles(
        &self,
        company_id: &CompanyId,
    ) -> Result<CompanyRoles, AdminShopifyError> {
        let response = self
            .execute::<CompanyRolesQuery>(company_roles_query::Variables {
                company_id: company_id.to_string(),
            })
            .await?;

        response
            .company
            .map(convert_roles)
            .ok_or_else(|| AdminShopifyError::NotFound(company_id.to_string()))
    }

    // =========================================================================
    // Locations
    // =========================================================================

    /// Get a company's first location.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::NotFound` if the company does not exist.
    #[instrument(skip(self), fields(shop = %self.shop(), company_id = %company_id))]
    pub async fn company_first_location(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<CompanyLocation>, AdminShopifyError> {
        let response = self
            .execute::<CompanyFirstLocation>(company_first_location::Variables {
                company_id: company_id.to_string(),
            })
            .await?;

        let company = response
            .company
            .ok_or_else(|| AdminShopifyError::NotFound(company_id.to_string()))?;

        Ok(company.locations.nodes.into_iter().next().map(convert_location))
    }

    /// Rename a company location.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self), fields(shop = %self.shop(), location_id = %location_id))]
    pub async fn company_location_rename(
        &self,
        location_id: &CompanyLocationId,
        name: &str,
    ) -> Result<(), AdminShopifyError> {
        let variables = company_location_update::Variables {
            company_location_id: location_id.to_string(),
            input: company_location_update::CompanyLocationUpdateInput {
                name: name.to_string(),
            },
        };

        let response = self.execute::<CompanyLocationUpdate>(variables).await?;
        check_payload(response.company_location_update, "location update")
    }

    /// Assign an address to a company location.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self, address), fields(shop = %self.shop(), location_id = %location_id))]
    pub async fn company_location_assign_address(
        &self,
        location_id: &CompanyLocationId,
        address: &CompanyAddress,
        address_types: &[AddressType],
    ) -> Result<(), AdminShopifyError> {
        let variables = company_location_assign_address::Variables {
            location_id: location_id.to_string(),
            address: company_location_assign_address::CompanyAddressInput {
                address1: address.address1.clone(),
                address2: address.address2.clone(),
                city: address.city.clone(),
                zip: address.zip.clone(),
                country_code: address.country_code.clone(),
                zone_code: address.zone_code.clone(),
                recipient: address.recipient.clone(),
                phone: address.phone.clone(),
            },
            address_types: address_types.to_vec(),
        };

        let response = self.execute::<CompanyLocationAssignAddress>(variables).await?;
        check_payload(response.company_location_assign_address, "address assign")
    }

    /// Set a company location's tax registration id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors. On
    /// API versions without `companyLocationTaxSettingsUpdate` the error
    /// satisfies [`AdminShopifyError::is_unsupported_field`].
    #[instrument(skip(self, tax_registration_id), fields(shop = %self.shop(), location_id = %location_id))]
    pub async fn company_location_set_tax_id(
        &self,
        location_id: &CompanyLocationId,
        tax_registration_id: &str,
    ) -> Result<(), AdminShopifyError> {
        let variables = company_location_tax_settings_update::Variables {
            company_location_id: location_id.to_string(),
            tax_registration_id: tax_registration_id.to_string(),
        };

        let response = self
            .execute::<CompanyLocationTaxSettingsUpdate>(variables)
            .await?;
        check_payload(response.company_location_tax_settings_update, "tax settings update")
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    /// Make an existing customer a contact of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self), fields(shop = %self.shop(), company_id = %company_id, customer_id = %customer_id))]
    pub async fn company_assign_customer_as_contact(
        &self,
        company_id: &CompanyId,
        customer_id: &CustomerId,
    ) -> Result<CompanyContactId, AdminShopifyError> {
        let variables = company_assign_customer_as_contact::Variables {
            company_id: company_id.to_string(),
            customer_id: customer_id.to_string(),
        };

        let response = self
            .execute::<CompanyAssignCustomerAsContact>(variables)
            .await?;

        let payload = response.company_assign_customer_as_contact.ok_or_else(|| {
            AdminShopifyError::graphql("No payload returned from contact assign")
        })?;

        check_user_errors(payload.user_errors)?;

        payload
            .company_contact
            .map(|c| CompanyContactId::new(c.id))
            .ok_or_else(|| AdminShopifyError::graphql("No contact returned from assign"))
    }

    /// Make a contact the company's main contact.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self), fields(shop = %self.shop(), company_id = %company_id, contact_id = %contact_id))]
    pub async fn company_assign_main_contact(
        &self,
        company_id: &CompanyId,
        contact_id: &CompanyContactId,
    ) -> Result<(), AdminShopifyError> {
        let variables = company_assign_main_contact::Variables {
            company_id: company_id.to_string(),
            company_contact_id: contact_id.to_string(),
        };

        let response = self.execute::<CompanyAssignMainContact>(variables).await?;
        check_payload(response.company_assign_main_contact, "main contact assign")
    }

    /// Grant a contact a role at a location.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self), fields(shop = %self.shop(), contact_id = %contact_id))]
    pub async fn company_contact_assign_role(
        &self,
        contact_id: &CompanyContactId,
        role_id: &CompanyContactRoleId,
        location_id: &CompanyLocationId,
    ) -> Result<(), AdminShopifyError> {
        let variables = company_contact_assign_role::Variables {
            company_contact_id: contact_id.to_string(),
            company_contact_role_id: role_id.to_string(),
            company_location_id: location_id.to_string(),
        };

        let response = self.execute::<CompanyContactAssignRole>(variables).await?;
        check_payload(response.company_contact_assign_role, "role assign")
    }
}

/// Fold a mutation payload that carries only `userErrors`.
fn check_payload(
    payload: Option<UserErrorsPayload>,
    action: &str,
) -> Result<(), AdminShopifyError> {
    let payload = payload.ok_or_else(|| {
        AdminShopifyError::graphql(format!("No payload returned from {action}"))
    })?;
    check_user_errors(payload.user_errors)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_payload_ok() {
        let payload: UserErrorsPayload =
            serde_json::from_value(serde_json::json!({ "userErrors": [] })).unwrap();
        assert!(check_payload(Some(payload), "role assign").is_ok());
    }

    #[test]
    fn test_check_payload_user_errors() {
        let payload: UserErrorsPayload = serde_json::from_value(serde_json::json!({
            "userErrors": [{
                "field": ["companyLocationId"],
                "message": "Company location does not exist",
                "code": "RESOURCE_NOT_FOUND"
            }]
        }))
        .unwrap();

        let err = check_payload(Some(payload), "role assign").unwrap_err();
        assert_eq!(
            err.to_string(),
            "User error: companyLocationId: Company location does not exist"
        );
    }

    #[test]
    fn test_check_payload_missing() {
        let err = check_payload(None, "address assign").unwrap_err();
        assert_eq!(
            err.to_string(),
            "GraphQL errors: No payload returned from address assign"
        );
    }
}
