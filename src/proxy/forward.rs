//! The single outbound call made for each `/proxy` request.
//!
//! [`forward`] sends an [`OutboundRequest`] through the shared hyper
//! client (following redirects), buffers the full upstream body, and
//! checks that it is JSON. The body is relayed byte for byte, so large
//! numbers and key order survive. The whole exchange (connect, redirects,
//! body read) is bounded by one timeout. There is no retry: the result
//! is a [`ForwardOutcome`] the handler must match on.

use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::StatusCode;
use serde_json::value::RawValue;
use tower::ServiceExt;

use super::outbound::OutboundRequest;
use crate::server::HttpClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The outbound request could not be built.
    Request,
    /// Connection or protocol error before a response arrived.
    Connect,
    Timeout,
    /// The response body could not be read in full.
    Body,
    /// The body was read but is not JSON.
    Decode,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Body => "body",
            Self::Decode => "decode",
        }
    }
}

#[derive(Debug)]
pub enum ForwardOutcome {
    /// The upstream answered with a JSON body. Both are passed through as-is.
    Success { status: StatusCode, body: Bytes },
    Failure { kind: FailureKind, detail: String },
}

impl ForwardOutcome {
    fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
pub async fn forward(
    client: &HttpClient,
    request: &OutboundRequest,
    timeout: Duration,
) -> ForwardOutcome {
    let http_request = match request.to_http_request() {
        Ok(r) => r,
        Err(e) => return ForwardOutcome::failure(FailureKind::Request, e),
    };

    let start = Instant::now();
    let exchange = async {
        let response = client
            .clone()
            .oneshot(http_request)
            .await
            .map_err(|e| (FailureKind::Connect, error_chain(&e)))?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| (FailureKind::Body, format!("body read error: {}", error_chain(&e))))?
            .to_bytes();
        Ok::<(StatusCode, Bytes), (FailureKind, String)>((status, body))
    };

    let result = tokio::time::timeout(timeout, exchange).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, body) = match result {
        Ok(Ok(response)) => response,
        Ok(Err((kind, detail))) => return ForwardOutcome::failure(kind, detail),
        Err(_) => {
            return ForwardOutcome::failure(
                FailureKind::Timeout,
                format!("request timed out after {}ms", timeout.as_millis()),
            );
        }
    };

    tracing::debug!(
        status = status.as_u16(),
        bytes = body.len(),
        latency_ms,
        "upstream body received"
    );

    let checked = serde_json::from_slice::<&RawValue>(&body).map(|_| ());
    match checked {
        Ok(()) => ForwardOutcome::Success { status, body },
        Err(e) => ForwardOutcome::failure(
            FailureKind::Decode,
            format!("upstream returned status {status} with a non-JSON body: {e}"),
        ),
    }
}

/// Flatten an error and its sources into one line.
///
/// hyper-util's client error displays only as "client error (Connect)";
/// the useful part is further down the chain.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
