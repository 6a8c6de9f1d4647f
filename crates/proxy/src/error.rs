//! Unified error handling for the proxy.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::registration::WorkflowError;
use crate::shopify::AdminShopifyError;

/// Application-level error type for the proxy.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] AdminShopifyError),

    /// Registration aborted before anything was written.
    #[error("Registration error: {0}")]
    Workflow(#[from] WorkflowError),

    /// The request's shop could not be determined.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The shop has not installed the app (or its token was revoked).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body: `{ "error": ..., "details": ... }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: Option<String>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shopify(e) | Self::Workflow(WorkflowError::CustomerLookup(e) | WorkflowError::CompanyLookup(e))
                if matches!(e, AdminShopifyError::Unauthorized(_)) =>
            {
                StatusCode::UNAUTHORIZED
            }
            Self::Shopify(_) | Self::Workflow(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Proxy request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Database(_) | Self::Internal(_) => ErrorBody {
                error: "Internal server error".to_string(),
                details: None,
            },
            Self::Shopify(_) | Self::Workflow(_) if status == StatusCode::UNAUTHORIZED => ErrorBody {
                error: "Shop authorization failed".to_string(),
                details: Some("Reinstall the app to refresh its access token".to_string()),
            },
            Self::Shopify(_) | Self::Workflow(_) => ErrorBody {
                error: "Registration could not be completed".to_string(),
                details: Some("The store could not be reached. Please try again.".to_string()),
            },
            Self::BadRequest(msg) => ErrorBody {
                error: "Bad request".to_string(),
                details: Some(msg.clone()),
            },
            Self::Unauthorized(msg) => ErrorBody {
                error: "Unauthorized".to_string(),
                details: Some(msg.clone()),
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("missing shop".to_string());
        assert_eq!(err.to_string(), "Bad request: missing shop");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Workflow(WorkflowError::CompanyLookup(
                AdminShopifyError::RateLimited(2)
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Workflow(WorkflowError::CustomerLookup(
                AdminShopifyError::Unauthorized("revoked".to_string())
            ))),
            StatusCode::UNAUTHORIZED
        );
    }
}
