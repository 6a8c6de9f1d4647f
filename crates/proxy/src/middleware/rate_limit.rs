//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Registration is an unauthenticated write path, so it is limited per
//! client IP (~10/min).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Key extractor for requests relayed through Shopify's app proxy.
///
/// Shopify appends the shopper's address to `X-Forwarded-For`; the first
/// entry is used. Direct connections fall back to the peer address.
#[derive(Clone, Copy)]
pub struct ProxyIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ProxyIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        if let Some(ip) = ["x-real-ip", "fly-client-ip"].iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        }) {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ProxyIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for registration: 1 request every 6 seconds, burst of 5.
///
/// Returns `None` if governor rejects the quota.
#[must_use]
pub fn registration_rate_limiter() -> Option<RateLimiterLayer> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()?;
    Some(GovernorLayer::new(Arc::new(config)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tower_governor::key_extractor::KeyExtractor;

    #[test]
    fn test_forwarded_for_takes_first_address() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(
            ProxyIpKeyExtractor.extract(&req).unwrap(),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("198.51.100.2:5000".parse::<SocketAddr>().unwrap()));
        assert_eq!(
            ProxyIpKeyExtractor.extract(&req).unwrap(),
            "198.51.100.2".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_no_address_is_an_error() {
        let req = Request::builder().body(()).unwrap();
        assert!(ProxyIpKeyExtractor.extract(&req).is_err());
    }

    #[test]
    fn test_limiter_builds() {
        assert!(registration_rate_limiter().is_some());
    }
}
