//! App proxy registration handler.

use axum::{
    Form, Json,
    extract::{FromRequest, Query, Request, State},
    http::{HeaderMap, header},
};
use serde::Deserialize;
use tracing::instrument;
use wholesale_core::Registrant;

use crate::error::AppError;
use crate::registration::{Orchestrator, RegistrationOutcome};
use crate::shopify::AdminShopifyError;
use crate::state::AppState;
use crate::tenant::{ShopHints, resolve_shop};

/// Registration submission, form-encoded or JSON.
#[derive(Debug, Deserialize)]
pub struct RegistrationForm {
    #[serde(flatten)]
    pub registrant: Registrant,
    /// Shop named by the storefront form itself.
    #[serde(default)]
    pub shop: Option<String>,
}

impl<S: Send + Sync> FromRequest<S> for RegistrationForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(form) = Json::<Self>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(form)
        } else {
            let Form(form) = Form::<Self>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(form)
        }
    }
}

/// Run the registration workflow for the request's shop.
///
/// Every completed run answers 200, including partial ones; only a missing
/// shop, a missing install or a failed lookup is an error status.
#[instrument(skip_all, fields(shop = tracing::field::Empty, shop_source = tracing::field::Empty))]
pub async fn register(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    form: RegistrationForm,
) -> Result<Json<RegistrationOutcome>, AppError> {
    let shopify = &state.config().shopify;
    let hints = ShopHints {
        query: &query,
        form_shop: form.shop.as_deref(),
        referer: headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok()),
    };

    let (shop, source) = resolve_shop(&hints, &shopify.api_secret, shopify.require_signature)
        .ok_or_else(|| AppError::BadRequest("Could not determine the shop".to_string()))?;

    let span = tracing::Span::current();
    span.record("shop", shop.as_str());
    span.record("shop_source", tracing::field::debug(source));

    let session = state.shop_session(&shop).await?.ok_or_else(|| {
        AppError::Unauthorized(format!("The app is not installed for {shop}"))
    })?;

    let client = state.admin_client(&session);
    let result = Orchestrator::new(&client, &state.config().workflow)
        .register(&form.registrant)
        .await;

    match result {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            if matches!(e.directory_error(), AdminShopifyError::Unauthorized(_)) {
                state.forget_session(&shop).await;
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;

    async fn extract(content_type: &str, body: &'static str) -> Result<RegistrationForm, AppError> {
        let req = Request::builder()
            .method("POST")
            .uri("/proxy/register")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        RegistrationForm::from_request(req, &()).await
    }

    #[tokio::test]
    async fn test_form_submission() {
        let form = extract(
            "application/x-www-form-urlencoded",
            "companyName=Acme&userEmail=Jane%40Acme.test&address1=&zip_code=12345&shop=acme.myshopify.com",
        )
        .await
        .unwrap();

        assert_eq!(form.shop.as_deref(), Some("acme.myshopify.com"));
        assert_eq!(form.registrant.company_name.as_deref(), Some("Acme"));
        assert_eq!(form.registrant.user_email.as_deref(), Some("Jane@Acme.test"));
        assert_eq!(form.registrant.address1, None);
        assert_eq!(form.registrant.zip_code.as_deref(), Some("12345"));
    }

    #[tokio::test]
    async fn test_json_submission() {
        let form = extract(
            "application/json",
            r#"{"companyName":"Acme","companyEmail":"orders@acme.test"}"#,
        )
        .await
        .unwrap();

        assert_eq!(form.shop, None);
        assert_eq!(
            form.registrant.company_email.as_deref(),
            Some("orders@acme.test")
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let err = extract("application/json", "{not json").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
