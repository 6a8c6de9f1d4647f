//! Which shop a request belongs to.
//!
//! Shopify forwards app proxy requests with a signed query string. When the
//! signature checks out the signed `shop` is authoritative. Otherwise, unless
//! signatures are required, the shop is taken from a `shop` parameter and
//! finally from a `*.myshopify.com` `Referer`.

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::Serialize;

use crate::shopify::oauth::verify_hex_hmac;

const SHOP_SUFFIX: &str = ".myshopify.com";

/// A validated `<name>.myshopify.com` domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Parse and validate a shop domain.
    ///
    /// Accepts surrounding whitespace, any case and an `https://` prefix.
    /// The name before `.myshopify.com` may only contain `[a-z0-9-]` and
    /// must start with a letter or digit.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_ascii_lowercase();
        let host = lower
            .strip_prefix("https://")
            .or_else(|| lower.strip_prefix("http://"))
            .unwrap_or(&lower)
            .trim_end_matches('/');

        let name = host.strip_suffix(SHOP_SUFFIX)?;
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric())
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

        valid.then(|| Self(host.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the shop was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopSource {
    /// Signed app proxy query string.
    Signature,
    /// Unsigned `shop` query parameter or form field.
    Parameter,
    /// `Referer` header.
    Referer,
}

/// What a request offers for identifying its shop.
#[derive(Debug, Default)]
pub struct ShopHints<'a> {
    /// Raw query string pairs, in arrival order.
    pub query: &'a [(String, String)],
    /// `shop` field from the request body.
    pub form_shop: Option<&'a str>,
    /// `Referer` header value.
    pub referer: Option<&'a str>,
}

/// Resolve the request's shop.
///
/// Returns `None` when no acceptable source names a valid shop. An invalid
/// signature counts as no signature.
#[must_use]
pub fn resolve_shop(
    hints: &ShopHints<'_>,
    api_secret: &SecretString,
    require_signature: bool,
) -> Option<(ShopDomain, ShopSource)> {
    if verify_proxy_signature(hints.query, api_secret) {
        if let Some(shop) = query_value(hints.query, "shop").and_then(ShopDomain::parse) {
            return Some((shop, ShopSource::Signature));
        }
    } else if query_value(hints.query, "signature").is_some() {
        tracing::warn!("App proxy signature did not verify");
    }

    if require_signature {
        return None;
    }

    if let Some(shop) = query_value(hints.query, "shop")
        .or(hints.form_shop)
        .and_then(ShopDomain::parse)
    {
        return Some((shop, ShopSource::Parameter));
    }

    hints
        .referer
        .and_then(|r| url::Url::parse(r).ok())
        .and_then(|u| u.host_str().and_then(ShopDomain::parse))
        .map(|shop| (shop, ShopSource::Referer))
}

/// Verify the `signature` parameter Shopify adds to app proxy requests.
///
/// The signed message is every other parameter as `key=value`, sorted by
/// key, with repeated keys' values joined by `,`, concatenated with no
/// separator.
#[must_use]
pub fn verify_proxy_signature(query: &[(String, String)], api_secret: &SecretString) -> bool {
    let Some(signature) = query_value(query, "signature") else {
        return false;
    };
    verify_hex_hmac(api_secret, &proxy_signature_message(query), signature)
}

/// The message an app proxy signature covers.
#[must_use]
pub fn proxy_signature_message(query: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in query {
        if key != "signature" {
            grouped.entry(key.as_str()).or_default().push(value.as_str());
        }
    }

    grouped
        .into_iter()
        .map(|(key, values)| format!("{key}={}", values.join(",")))
        .collect()
}

fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::oauth::sign_hex;

    fn secret() -> SecretString {
        SecretString::from("hush")
    }

    fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
        values
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn signed(values: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut query = pairs(values);
        let signature = sign_hex(&secret(), &proxy_signature_message(&query)).unwrap();
        query.push(("signature".to_string(), signature));
        query
    }

    #[test]
    fn test_shop_domain_parse() {
        assert_eq!(
            ShopDomain::parse(" https://Acme-2.myshopify.com/ ").map(|s| s.to_string()),
            Some("acme-2.myshopify.com".to_string())
        );
        assert!(ShopDomain::parse("acme.example.com").is_none());
        assert!(ShopDomain::parse(".myshopify.com").is_none());
        assert!(ShopDomain::parse("-acme.myshopify.com").is_none());
        assert!(ShopDomain::parse("ac_me.myshopify.com").is_none());
        assert!(ShopDomain::parse("evil.com/x.myshopify.com").is_none());
    }

    #[test]
    fn test_signature_message_groups_and_sorts() {
        let query = pairs(&[
            ("shop", "acme.myshopify.com"),
            ("extra", "1"),
            ("extra", "2"),
            ("path_prefix", "/apps/wholesale"),
            ("signature", "ignored"),
        ]);
        assert_eq!(
            proxy_signature_message(&query),
            "extra=1,2path_prefix=/apps/wholesaleshop=acme.myshopify.com"
        );
    }

    #[test]
    fn test_signed_shop_wins() {
        let query = signed(&[("shop", "acme.myshopify.com"), ("timestamp", "1700000000")]);
        let hints = ShopHints {
            query: &query,
            form_shop: Some("other.myshopify.com"),
            referer: None,
        };

        let (shop, source) = resolve_shop(&hints, &secret(), true).unwrap();
        assert_eq!(shop.as_str(), "acme.myshopify.com");
        assert_eq!(source, ShopSource::Signature);
    }

    #[test]
    fn test_bad_signature_is_ignored() {
        let mut query = signed(&[("shop", "acme.myshopify.com")]);
        if let Some((_, shop)) = query.iter_mut().find(|(k, _)| k == "shop") {
            *shop = "evil.myshopify.com".to_string();
        }
        let hints = ShopHints {
            query: &query,
            ..ShopHints::default()
        };

        assert!(resolve_shop(&hints, &secret(), true).is_none());

        let (shop, source) = resolve_shop(&hints, &secret(), false).unwrap();
        assert_eq!(shop.as_str(), "evil.myshopify.com");
        assert_eq!(source, ShopSource::Parameter);
    }

    #[test]
    fn test_form_then_referer_fallback() {
        let hints = ShopHints {
            query: &[],
            form_shop: Some("acme.myshopify.com"),
            referer: Some("https://other.myshopify.com/pages/wholesale"),
        };
        let (shop, source) = resolve_shop(&hints, &secret(), false).unwrap();
        assert_eq!(shop.as_str(), "acme.myshopify.com");
        assert_eq!(source, ShopSource::Parameter);

        let hints = ShopHints {
            query: &[],
            form_shop: None,
            referer: Some("https://other.myshopify.com/pages/wholesale"),
        };
        let (shop, source) = resolve_shop(&hints, &secret(), false).unwrap();
        assert_eq!(shop.as_str(), "other.myshopify.com");
        assert_eq!(source, ShopSource::Referer);
    }

    #[test]
    fn test_unrecognized_referer() {
        let hints = ShopHints {
            query: &[],
            form_shop: Some("not a shop"),
            referer: Some("https://www.acme.test/pages/wholesale"),
        };
        assert!(resolve_shop(&hints, &secret(), false).is_none());
    }
}
