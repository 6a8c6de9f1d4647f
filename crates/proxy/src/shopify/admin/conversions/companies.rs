//! Company type conversion functions.

use wholesale_core::{CompanyContactId, CompanyContactRoleId, CompanyId, CompanyLocationId, CustomerId};

use super::super::queries::{LocationNode, RoleNode, company_create, company_roles_query, find_companies};
use crate::shopify::types::{
    Company, CompanyLocation, CompanyRole, CompanyRoles, CreatedCompany, Metafield,
};

pub fn convert_company(node: find_companies::CompanyNode) -> Company {
    Company {
        id: CompanyId::new(node.id),
        name: node.name,
        metafields: node
            .metafields
            .nodes
            .into_iter()
            .map(|m| Metafield {
                namespace: m.namespace,
                key: m.key,
                value: m.value,
            })
            .collect(),
    }
}

pub fn convert_created_company(node: company_create::CompanyNode) -> CreatedCompany {
    let (main_contact_id, main_contact_customer_id) = node.main_contact.map_or((None, None), |c| {
        (
            Some(CompanyContactId::new(c.id)),
            c.customer.map(|customer| CustomerId::new(customer.id)),
        )
    });

    CreatedCompany {
        id: CompanyId::new(node.id),
        main_contact_id,
        main_contact_customer_id,
    }
}

pub fn convert_location(node: LocationNode) -> CompanyLocation {
    CompanyLocation {
        id: CompanyLocationId::new(node.id),
        name: node.name,
    }
}

fn convert_role(node: RoleNode) -> CompanyRole {
    CompanyRole {
        id: CompanyContactRoleId::new(node.id),
        name: node.name,
    }
}

pub fn convert_roles(node: company_roles_query::CompanyNode) -> CompanyRoles {
    CompanyRoles {
        default_role: node.default_role.map(convert_role),
        roles: node.contact_roles.nodes.into_iter().map(convert_role).collect(),
    }
}
