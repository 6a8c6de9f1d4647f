//! The wholesale registration submitted from the storefront form.

use serde::{Deserialize, Deserializer, Serialize};

use super::normalize_email;

/// One wholesale registration submission.
///
/// Field names follow the storefront form (`companyName`, `userEmail`, ...,
/// with the legacy `zip_code`). Every field is optional: blank and
/// whitespace-only values deserialize to `None` so the workflow never has to
/// distinguish "missing" from "empty". Unknown fields such as the app proxy's
/// `shop` and `signature` are ignored.
///
/// The form marks company name, first/last name, user email and address
/// line 1 as required, but that is enforced in the browser only; this type
/// accepts whatever arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registrant {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub last_name: Option<String>,
    /// Human-readable label for the company's default location.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub tax_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub phone: Option<String>,
    /// Email identifying the company; stored as the `custom.companyEmail` metafield.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub company_email: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub address1: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub address2: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub city: Option<String>,
    #[serde(default, rename = "zip_code", deserialize_with = "blank_as_none")]
    pub zip_code: Option<String>,
}

/// A company location address built from a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAddress {
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub zip: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,
    /// Province/state code, passed through as submitted.
    pub zone_code: Option<String>,
    pub recipient: Option<String>,
    pub phone: Option<String>,
}

impl Registrant {
    /// Normalized user email, if one was submitted.
    #[must_use]
    pub fn normalized_user_email(&self) -> Option<String> {
        self.user_email.as_deref().map(normalize_email)
    }

    /// Normalized company email, if one was submitted.
    #[must_use]
    pub fn normalized_company_email(&self) -> Option<String> {
        self.company_email.as_deref().map(normalize_email)
    }

    /// "First Last", skipping whichever half is missing.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }

    /// Name to give a newly created company.
    ///
    /// Falls back to the registrant's name, then their email, so the remote
    /// create call is never sent without a name.
    #[must_use]
    pub fn company_display_name(&self) -> String {
        self.company_name
            .clone()
            .or_else(|| self.full_name())
            .or_else(|| self.normalized_user_email())
            .unwrap_or_else(|| "Wholesale customer".to_string())
    }

    /// Returns `true` if address line 1 was submitted.
    ///
    /// Address and tax assignment only happen when it was.
    #[must_use]
    pub const fn has_address(&self) -> bool {
        self.address1.is_some()
    }

    /// Shipping address for the company location.
    ///
    /// Returns `None` without address line 1. A blank country becomes
    /// `default_country`; a blank city or zip becomes an empty string.
    #[must_use]
    pub fn shipping_address(&self, default_country: &str) -> Option<CompanyAddress> {
        let address1 = self.address1.clone()?;
        Some(CompanyAddress {
            address1,
            address2: self.address2.clone(),
            city: self.city.clone().unwrap_or_default(),
            zip: self.zip_code.clone().unwrap_or_default(),
            country_code: self
                .country
                .as_deref()
                .map_or_else(|| default_country.to_string(), str::to_uppercase),
            zone_code: self.state.clone(),
            recipient: self.full_name(),
            phone: self.phone.clone(),
        })
    }
}

/// Deserialize an optional string, mapping blank values to `None`.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_form_field_names() {
        let json = serde_json::json!({
            "companyName": "Acme",
            "firstName": "Jo",
            "lastName": "Doe",
            "userEmail": "Jo@Acme.test",
            "companyEmail": "buying@acme.test",
            "taxId": "12-3456789",
            "address1": "1 Main St",
            "zip_code": "90210",
            "shop": "acme.myshopify.com"
        });

        let registrant: Registrant = serde_json::from_value(json).unwrap();
        assert_eq!(registrant.company_name.as_deref(), Some("Acme"));
        assert_eq!(registrant.tax_id.as_deref(), Some("12-3456789"));
        assert_eq!(registrant.zip_code.as_deref(), Some("90210"));
        assert_eq!(
            registrant.normalized_user_email().as_deref(),
            Some("jo@acme.test")
        );
        assert!(registrant.phone.is_none());
    }

    #[test]
    fn test_blank_fields_become_none() {
        let json = serde_json::json!({
            "phone": "   ",
            "address1": "",
            "city": " Springfield "
        });

        let registrant: Registrant = serde_json::from_value(json).unwrap();
        assert!(registrant.phone.is_none());
        assert!(registrant.address1.is_none());
        assert!(!registrant.has_address());
        assert_eq!(registrant.city.as_deref(), Some("Springfield"));
    }

    #[test]
    fn test_shipping_address_defaults() {
        let registrant = Registrant {
            first_name: Some("Jo".to_string()),
            address1: Some("1 Main St".to_string()),
            ..Registrant::default()
        };

        let address = registrant.shipping_address("US").unwrap();
        assert_eq!(address.country_code, "US");
        assert_eq!(address.city, "");
        assert_eq!(address.zip, "");
        assert_eq!(address.recipient.as_deref(), Some("Jo"));
    }

    #[test]
    fn test_shipping_address_requires_line_one() {
        let registrant = Registrant {
            city: Some("Springfield".to_string()),
            country: Some("CA".to_string()),
            ..Registrant::default()
        };
        assert!(registrant.shipping_address("US").is_none());
    }

    #[test]
    fn test_shipping_address_uppercases_country() {
        let registrant = Registrant {
            address1: Some("1 Main St".to_string()),
            country: Some("ca".to_string()),
            ..Registrant::default()
        };
        assert_eq!(registrant.shipping_address("US").unwrap().country_code, "CA");
    }

    #[test]
    fn test_company_display_name_fallbacks() {
        let mut registrant = Registrant {
            company_name: Some("Acme".to_string()),
            first_name: Some("Jo".to_string()),
            last_name: Some("Doe".to_string()),
            user_email: Some("jo@acme.test".to_string()),
            ..Registrant::default()
        };
        assert_eq!(registrant.company_display_name(), "Acme");

        registrant.company_name = None;
        assert_eq!(registrant.company_display_name(), "Jo Doe");

        registrant.first_name = None;
        registrant.last_name = None;
        assert_eq!(registrant.company_display_name(), "jo@acme.test");
    }
}
