//! Company lookup by the `custom.companyEmail` metafield.

use tracing::instrument;
use wholesale_core::normalize_email;

use crate::shopify::{AdminShopifyError, Company, CompanyRole, CompanyRoles, Directory};

/// Find the company whose `custom.companyEmail` metafield equals
/// `company_email` (trimmed, case-insensitive).
///
/// Only the first `scan_limit` companies are inspected; later ones are
/// invisible to this lookup. When several match, the first scanned wins.
///
/// # Errors
///
/// Returns the directory error if listing companies fails.
#[instrument(skip(directory))]
pub async fn resolve_company(
    directory: &dyn Directory,
    company_email: &str,
    scan_limit: i64,
) -> Result<Option<Company>, AdminShopifyError> {
    let email = normalize_email(company_email);
    if email.is_empty() {
        return Ok(None);
    }

    let companies = directory.list_companies(scan_limit).await?;
    let scanned = companies.len();

    let found = companies.into_iter().find(|company| {
        company
            .company_email()
            .is_some_and(|value| normalize_email(value) == email)
    });

    tracing::debug!(scanned, found = found.is_some(), "Scanned companies for email");
    Ok(found)
}

/// Pick the role to grant a linked contact.
///
/// Preference: the company's default role, then the first role whose name
/// contains "buyer", then "admin", then whatever comes first.
#[must_use]
pub fn choose_role(roles: &CompanyRoles) -> Option<&CompanyRole> {
    let named = |needle: &str| {
        roles
            .roles
            .iter()
            .find(|r| r.name.to_lowercase().contains(needle))
    };

    roles
        .default_role
        .as_ref()
        .or_else(|| named("buyer"))
        .or_else(|| named("admin"))
        .or_else(|| roles.roles.first())
}

#[cfg(test)]
mod tests {
    use wholesale_core::CompanyContactRoleId;

    use super::*;

    fn role(id: u64, name: &str) -> CompanyRole {
        CompanyRole {
            id: CompanyContactRoleId::from_legacy_id(id),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_default_role_wins() {
        let roles = CompanyRoles {
            default_role: Some(role(9, "Ordering only")),
            roles: vec![role(1, "Location admin"), role(2, "Buyer")],
        };
        assert_eq!(choose_role(&roles).map(|r| r.name.as_str()), Some("Ordering only"));
    }

    #[test]
    fn test_buyer_before_admin() {
        let roles = CompanyRoles {
            default_role: None,
            roles: vec![role(1, "Location Admin"), role(2, "Primary BUYER")],
        };
        assert_eq!(choose_role(&roles).map(|r| r.name.as_str()), Some("Primary BUYER"));
    }

    #[test]
    fn test_admin_then_first() {
        let roles = CompanyRoles {
            default_role: None,
            roles: vec![role(1, "Ordering only"), role(2, "Location admin")],
        };
        assert_eq!(choose_role(&roles).map(|r| r.name.as_str()), Some("Location admin"));

        let roles = CompanyRoles {
            default_role: None,
            roles: vec![role(1, "Ordering only"), role(2, "Viewer")],
        };
        assert_eq!(choose_role(&roles).map(|r| r.name.as_str()), Some("Ordering only"));

        assert!(choose_role(&CompanyRoles::default()).is_none());
    }
}
