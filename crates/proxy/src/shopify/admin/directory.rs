//! `Directory` implementation backed by the Admin API.

use async_trait::async_trait;
use wholesale_core::{
    CompanyAddress, CompanyContactId, CompanyContactRoleId, CompanyId, CompanyLocationId,
    CustomerId,
};

use super::AdminClient;
use crate::shopify::{
    AddressType, AdminShopifyError, Company, CompanyCreateInput, CompanyLocation, CompanyRoles,
    CreatedCompany, Customer, CustomerInput, CustomerSearch, Directory, MetafieldInput,
};

#[async_trait]
impl Directory for AdminClient {
    async fn search_customers(
        &self,
        search: &CustomerSearch,
    ) -> Result<Vec<Customer>, AdminShopifyError> {
        self.find_customers(search).await
    }

    async fn create_customer(&self, input: &CustomerInput) -> Result<Customer, AdminShopifyError> {
        self.customer_create(input).await
    }

    async fn update_customer(
        &self,
        id: &CustomerId,
        input: &CustomerInput,
    ) -> Result<Customer, AdminShopifyError> {
        self.customer_update(id, input).await
    }

    async fn list_companies(&self, first: i64) -> Result<Vec<Company>, AdminShopifyError> {
        self.find_companies(first).await
    }

    async fn create_company(
        &self,
        input: &CompanyCreateInput,
    ) -> Result<CreatedCompany, AdminShopifyError> {
        self.company_create(input).await
    }

    async fn set_metafield(
        &self,
        owner_id: &str,
        metafield: &MetafieldInput,
    ) -> Result<(), AdminShopifyError> {
        self.metafield_set(owner_id, metafield).await
    }

    async fn first_location(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<CompanyLocation>, AdminShopifyError> {
        self.company_first_location(company_id).await
    }

    async fn rename_location(
        &self,
        location_id: &CompanyLocationId,
        name: &str,
    ) -> Result<(), AdminShopifyError> {
        self.company_location_rename(location_id, name).await
    }

    async fn assign_location_address(
        &self,
        location_id: &CompanyLocationId,
        address: &CompanyAddress,
        address_types: &[AddressType],
    ) -> Result<(), AdminShopifyError> {
        self.company_location_assign_address(location_id, address, address_types)
            .await
    }

    async fn set_location_tax_id(
        &self,
        location_id: &CompanyLocationId,
        tax_registration_id: &str,
    ) -> Result<(), AdminShopifyError> {
        self.company_location_set_tax_id(location_id, tax_registration_id)
            .await
    }

    async fn assign_customer_as_contact(
        &self,
        company_id: &CompanyId,
        customer_id: &CustomerId,
    ) -> Result<CompanyContactId, AdminShopifyError> {
        self.company_assign_customer_as_contact(company_id, customer_id)
            .await
    }

    async fn assign_main_contact(
        &self,
        company_id: &CompanyId,
        contact_id: &CompanyContactId,
    ) -> Result<(), AdminShopifyError> {
        self.company_assign_main_contact(company_id, contact_id).await
    }

    async fn company_roles(
        &self,
        company_id: &CompanyId,
    ) -> Result<CompanyRoles, AdminShopifyError> {
        self.company_contact_roles(company_id).await
    }

    async fn assign_contact_role(
        &self,
        contact_id: &CompanyContactId,
        role_id: &CompanyContactRoleId,
        location_id: &CompanyLocationId,
    ) -> Result<(), AdminShopifyError> {
        self.company_contact_assign_role(contact_id, role_id, location_id)
            .await
    }
}
