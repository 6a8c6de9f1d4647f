//! HTTP route handlers for the proxy.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (database)
//!
//! # App proxy (rate limited)
//! POST /proxy/register           - Wholesale registration
//! POST /apps/wholesale/register  - Same, for unrewritten proxy paths
//!
//! # Install
//! GET  /auth/install?shop=       - Start OAuth install
//! GET  /auth/callback            - Finish OAuth install
//! ```

pub mod health;
pub mod install;
pub mod proxy;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::registration_rate_limiter;
use crate::state::AppState;

/// Build the router with all routes.
pub fn routes() -> Router<AppState> {
    let register = Router::new()
        .route("/proxy/register", post(proxy::register))
        .route("/apps/wholesale/register", post(proxy::register));

    let register = match registration_rate_limiter() {
        Some(limiter) => register.layer(limiter),
        None => {
            tracing::warn!("Registration rate limiter could not be built; running unlimited");
            register
        }
    };

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/auth/install", get(install::install))
        .route("/auth/callback", get(install::callback))
        .merge(register)
}
