//! Inbound request handling.
//!
//! [`proxy_handler`] serves `/proxy`: it checks the configuration, the
//! query string, the profile's required parameters and (for POST/PUT)
//! the size-limited JSON body, builds an
//! [`OutboundRequest`](outbound::OutboundRequest) with the secret
//! injected, and hands it to the [`forward`](forward::forward) call.
//! [`root_handler`] and [`fallback_handler`] turn away CONNECT so the
//! service is never mistaken for a tunneling proxy.

pub mod forward;
pub mod outbound;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::value::RawValue;

use crate::config::ProxyProfile;
use crate::error::ProxyError;
use crate::server::AppState;
use forward::ForwardOutcome;
use outbound::OutboundRequest;

const CORRELATION_HEADER: &str = "x-correlation-id";

pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    req_headers: HeaderMap,
    query: Result<Query<BTreeMap<String, String>>, QueryRejection>,
    body: Body,
) -> Response {
    let correlation_id = req_headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let mut response = match handle(&state, method, query, body, &correlation_id).await {
        Ok((status, body)) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response(),
        Err(e) => e.into_response(),
    };

    if let Ok(val) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, val);
    }
    response
}

async fn handle(
    state: &AppState,
    method: Method,
    query: Result<Query<BTreeMap<String, String>>, QueryRejection>,
    body: Body,
    correlation_id: &str,
) -> Result<(StatusCode, Bytes), ProxyError> {
    if !state.config.is_complete() {
        tracing::error!(
            correlation_id = %correlation_id,
            "missing API configuration (API_ENDPOINT or API_KEY)"
        );
        return Err(ProxyError::MissingConfiguration);
    }

    let Query(params) = query.map_err(|e| ProxyError::InvalidQuery {
        details: e.body_text(),
    })?;

    if state.profile.requires_date_range() && !has_required_params(&params) {
        tracing::warn!(
            correlation_id = %correlation_id,
            required = ?ProxyProfile::REQUIRED_PARAMS,
            "missing required parameters"
        );
        return Err(ProxyError::MissingParameters);
    }

    let json_body = if outbound::carries_body(&method) {
        let bytes = read_body(body, state.max_body).await?;
        parse_body(&bytes)?
    } else {
        None
    };

    let request = OutboundRequest::new(&state.config, method, params, json_body);

    tracing::info!(
        correlation_id = %correlation_id,
        method = %request.method,
        target = %request.endpoint,
        params = ?request.redacted_params(),
        "forwarding request"
    );

    match forward::forward(&state.http_client, &request, state.timeout).await {
        ForwardOutcome::Success { status, body } => {
            tracing::info!(
                correlation_id = %correlation_id,
                status = status.as_u16(),
                "API response status"
            );
            Ok((status, body))
        }
        ForwardOutcome::Failure { kind, detail } => {
            tracing::error!(
                correlation_id = %correlation_id,
                kind = kind.as_str(),
                error = %detail,
                "API request failed"
            );
            Err(ProxyError::Upstream { details: detail })
        }
    }
}

/// Both parameters must be present and non-empty.
fn has_required_params(params: &BTreeMap<String, String>) -> bool {
    ProxyProfile::REQUIRED_PARAMS
        .iter()
        .all(|name| params.get(*name).is_some_and(|v| !v.is_empty()))
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ProxyError::PayloadTooLarge { limit })
        }
        Err(e) => Err(ProxyError::InvalidBody {
            details: e.to_string(),
        }),
    }
}

/// An empty body means "no payload"; anything else must be JSON.
fn parse_body(body: &Bytes) -> Result<Option<Box<RawValue>>, ProxyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ProxyError::InvalidBody {
            details: e.to_string(),
        })
}

fn reject_connect(uri: &Uri) -> Response {
    tracing::warn!(uri = %uri, "received a CONNECT request; this is not a forward proxy");
    ProxyError::UnsupportedMethod.into_response()
}

/// `/` exists only to answer CONNECT.
pub async fn root_handler(method: Method, uri: Uri) -> Response {
    if method == Method::CONNECT {
        return reject_connect(&uri);
    }
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static("CONNECT"))],
    )
        .into_response()
}

// CONNECT requests usually arrive in authority form (`host:port`) with no
// path, so they never match `/` and land here.
pub async fn fallback_handler(method: Method, uri: Uri) -> Response {
    if method == Method::CONNECT {
        return reject_connect(&uri);
    }
    StatusCode::NOT_FOUND.into_response()
}
