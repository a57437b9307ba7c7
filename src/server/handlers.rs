use crate::auth::oauth::{AuthQuery, OAuthError};
use crate::config::HostUrl;
use crate::server::AppState;
use crate::webhooks::{
    WebhookOutcome, WebhookRequest, HEADER_API_VERSION, HEADER_HMAC, HEADER_SHOP_DOMAIN,
    HEADER_TOPIC, HEADER_WEBHOOK_ID,
};
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(super) struct BeginRequest {
    #[serde(default)]
    shop: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BeginResponse {
    authorization_url: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ErrorBody {
    error: &'static str,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn with_query(base: &HostUrl, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if base.as_ref().contains('?') { '&' } else { '?' };
    format!("{}{separator}{query}", base.as_ref())
}

pub(super) async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub(super) async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let request = WebhookRequest::new(
        body.to_vec(),
        header(&headers, HEADER_HMAC).unwrap_or_default(),
        header(&headers, HEADER_TOPIC),
        header(&headers, HEADER_SHOP_DOMAIN),
        header(&headers, HEADER_API_VERSION),
        header(&headers, HEADER_WEBHOOK_ID),
    );

    match state.webhooks.receive(&request).await {
        WebhookOutcome::Accepted => StatusCode::OK,
        WebhookOutcome::Rejected(_) => StatusCode::UNAUTHORIZED,
    }
}

pub(super) async fn begin(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BeginRequest>, JsonRejection>,
) -> Response {
    let shop = match payload {
        Ok(Json(BeginRequest { shop: Some(shop) })) => shop,
        Ok(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "Missing shop",
                }),
            )
                .into_response()
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected begin request body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "Invalid request body",
                }),
            )
                .into_response();
        }
    };

    match state.coordinator.begin(&shop) {
        Ok(result) => Json(BeginResponse {
            authorization_url: result.auth_url,
        })
        .into_response(),
        Err(error) => (
            match error {
                OAuthError::TooManyPendingAuthorizations { .. } => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_REQUEST,
            },
            Json(ErrorBody {
                error: error.public_message(),
            }),
        )
            .into_response(),
    }
}

pub(super) async fn callback(
    State(state): State<Arc<AppState>>,
    params: Result<Query<BTreeMap<String, String>>, QueryRejection>,
) -> Redirect {
    let result = match params {
        Ok(Query(params)) => {
            let query = AuthQuery::from_params(params);
            state
                .coordinator
                .callback(&query)
                .await
                .map(|session| (session, query))
        }
        Err(rejection) => Err(OAuthError::InvalidCallback {
            reason: rejection.body_text(),
        }),
    };

    match result {
        Ok((session, query)) => Redirect::to(&with_query(
            state.config.frontend_url(),
            &[
                ("shop", session.shop.as_ref()),
                ("host", query.host().unwrap_or_default()),
            ],
        )),
        Err(error) => Redirect::to(&with_query(
            state.config.frontend_error_url(),
            &[("error", error.public_message())],
        )),
    }
}
