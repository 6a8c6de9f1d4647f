//! Customer operations for the Admin API.

use tracing::instrument;
use wholesale_core::CustomerId;

use super::{
    AdminClient, AdminShopifyError,
    conversions::{check_user_errors, convert_customer, customer_input},
    queries::{
        CustomerCreate, CustomerPayload, CustomerUpdate, FindCustomers, customer_create,
        customer_update, find_customers,
    },
};
use crate::shopify::types::{Customer, CustomerInput, CustomerSearch};

impl AdminClient {
    /// Search customers.
    ///
    /// # Arguments
    ///
    /// * `search` - Query, page size and ordering
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn find_customers(
        &self,
        search: &CustomerSearch,
    ) -> Result<Vec<Customer>, AdminShopifyError> {
        let variables = find_customers::Variables {
            query: search.query.clone(),
            first: search.first,
            sort_key: search.newest_first.then(|| "CREATED_AT".to_string()),
            reverse: search.newest_first,
        };

        let response = self.execute::<FindCustomers>(variables).await?;

        Ok(response
            .customers
            .nodes
            .into_iter()
            .map(convert_customer)
            .collect())
    }

    /// Create a new customer.
    ///
    /// # Returns
    ///
    /// Returns the created customer on success.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserErrors` if Shopify rejects the input
    /// (including "Email has already been taken"), or an error if the API
    /// request fails.
    #[instrument(skip(self, input), fields(shop = %self.shop()))]
    pub async fn customer_create(
        &self,
        input: &CustomerInput,
    ) -> Result<Customer, AdminShopifyError> {
        let variables = customer_create::Variables {
            input: customer_input(None, input),
        };

        let response = self.execute::<CustomerCreate>(variables).await?;

        customer_from_payload(response.customer_create, "create")
    }

    /// Update an existing customer.
    ///
    /// # Arguments
    ///
    /// * `id` - Customer ID
    /// * `input` - Fields to change; `None` fields are left as they are
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self, input), fields(shop = %self.shop(), customer_id = %id))]
    pub async fn customer_update(
        &self,
        id: &CustomerId,
        input: &CustomerInput,
    ) -> Result<Customer, AdminShopifyError> {
        let variables = customer_update::Variables {
            input: customer_input(Some(id), input),
        };

        let response = self.execute::<CustomerUpdate>(variables).await?;

        customer_from_payload(response.customer_update, "update")
    }
}

fn customer_from_payload(
    payload: Option<CustomerPayload>,
    action: &str,
) -> Result<Customer, AdminShopifyError> {
    let Some(payload) = payload else {
        return Err(AdminShopifyError::graphql(format!(
            "No payload returned from customer {action}"
        )));
    };

    check_user_errors(payload.user_errors)?;

    payload.customer.map(convert_customer).ok_or_else(|| {
        AdminShopifyError::graphql(format!("No customer returned from {action}"))
    })
}
