//! Newtype ids for type-safe references to remote Shopify entities.
//!
//! Shopify identifies every object with an opaque global id such as
//! `gid://shopify/Customer/123`. Use the `define_gid!` macro to create
//! wrappers that prevent accidentally passing a company id where a customer
//! id is expected.

/// Macro to define a type-safe global id wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`, `legacy_id()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use wholesale_core::define_gid;
/// define_gid!(OrderId, "Order");
///
/// let id = OrderId::new("gid://shopify/Order/42");
/// assert_eq!(id.legacy_id(), Some(42));
/// assert_eq!(OrderId::from_legacy_id(42).as_str(), "gid://shopify/Order/42");
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// The Shopify resource name embedded in the global id.
            pub const RESOURCE: &'static str = $resource;

            /// Wrap a global id string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Build a global id from a numeric (legacy REST) id.
            #[must_use]
            pub fn from_legacy_id(id: u64) -> Self {
                Self(format!("gid://shopify/{}/{}", $resource, id))
            }

            /// Get the underlying global id string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the global id string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Numeric id at the end of the global id, if there is one.
            #[must_use]
            pub fn legacy_id(&self) -> Option<u64> {
                self.0.rsplit('/').next()?.parse().ok()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_gid!(CustomerId, "Customer");
define_gid!(CompanyId, "Company");
define_gid!(CompanyLocationId, "CompanyLocation");
define_gid!(CompanyContactId, "CompanyContact");
define_gid!(CompanyContactRoleId, "CompanyContactRole");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_id() {
        let id = CustomerId::new("gid://shopify/Customer/7391");
        assert_eq!(id.legacy_id(), Some(7391));

        let id = CompanyId::new("not-a-gid");
        assert_eq!(id.legacy_id(), None);
    }

    #[test]
    fn test_from_legacy_id() {
        assert_eq!(
            CompanyLocationId::from_legacy_id(5).as_str(),
            "gid://shopify/CompanyLocation/5"
        );
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = CompanyContactId::new("gid://shopify/CompanyContact/9");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"gid://shopify/CompanyContact/9\"");

        let parsed: CompanyContactId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display() {
        let id = CompanyContactRoleId::from("gid://shopify/CompanyContactRole/1");
        assert_eq!(id.to_string(), "gid://shopify/CompanyContactRole/1");
    }
}
