//! Wholesale registration proxy library.
//!
//! Receives wholesale applications through a Shopify app proxy and turns
//! each one into a linked customer, company and location via the Admin
//! GraphQL API.
//!
//! # Security
//!
//! This crate holds HIGH PRIVILEGE access:
//! - The app's client secret (verifies proxy signatures, OAuth callbacks)
//! - Offline Admin API tokens for every installed shop

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod registration;
pub mod routes;
pub mod shopify;
pub mod state;
pub mod tenant;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use state::AppState;

/// Build the application router with its request-scoped middleware.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
