//! Unified error types for keyproxy.
//!
//! [`KeyproxyError`] covers process-level failures (bad listen address,
//! socket I/O, invalid startup configuration) and is returned from
//! [`run::execute`](crate::run::execute). [`ProxyError`] covers the
//! per-request failures of the `/proxy` route; every variant converts
//! into an HTTP response, so none of them ever leaves the handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const CONNECT_REJECTION: &str = "CONNECT method is not supported. Use direct HTTPS requests.";

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum KeyproxyError {
    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// A failed `/proxy` request, rendered as the response the caller sees.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Missing API configuration")]
    MissingConfiguration,

    #[error("Missing required parameters: postedFrom and postedTo")]
    MissingParameters,

    #[error("Invalid query string")]
    InvalidQuery { details: String },

    #[error("Invalid JSON body")]
    InvalidBody { details: String },

    #[error("Request body too large")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to contact API")]
    Upstream { details: String },

    #[error("CONNECT method is not supported. Use direct HTTPS requests.")]
    UnsupportedMethod,
}

impl ProxyError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingConfiguration | Self::Upstream { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::MissingParameters | Self::InvalidQuery { .. } | Self::InvalidBody { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMethod => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

/// JSON shape of every error response except the CONNECT rejection.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a str>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        match self {
            Self::UnsupportedMethod => (status, CONNECT_REJECTION).into_response(),
            Self::InvalidQuery { ref details }
            | Self::InvalidBody { ref details }
            | Self::Upstream { ref details } => (
                status,
                Json(ErrorBody {
                    error: &message,
                    details: Some(details.as_str()),
                }),
            )
                .into_response(),
            Self::PayloadTooLarge { limit } => (
                status,
                Json(ErrorBody {
                    error: &message,
                    details: Some(format!("limit is {limit} bytes").as_str()),
                }),
            )
                .into_response(),
            Self::MissingConfiguration | Self::MissingParameters => (
                status,
                Json(ErrorBody {
                    error: &message,
                    details: None,
                }),
            )
                .into_response(),
        }
    }
}
