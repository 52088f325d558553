//! Startup validation of the proxy configuration.
//!
//! A missing endpoint or key is not an error here; the handler reports it
//! per request. What fails startup is a value that is present but can
//! never work: an endpoint that is not an absolute http(s) URL, or a zero
//! outbound timeout.

use url::Url;

use super::ProxyConfig;
use crate::error::ValidationError;

/// Validate the upstream endpoint. Returns `Ok(())` or a human-readable error.
pub fn validate_endpoint(endpoint: &str) -> Result<(), String> {
    match Url::parse(endpoint) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else if parsed.host_str().is_none() {
                Err(format!("'{endpoint}' has no host"))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{endpoint}' is not a valid URL")),
    }
}

pub fn validate(config: &ProxyConfig, timeout_ms: u64) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.endpoint.is_empty() {
        if let Err(message) = validate_endpoint(&config.endpoint) {
            let suggestion = (!config.endpoint.contains("://"))
                .then(|| format!("did you mean 'https://{}'?", config.endpoint));
            errors.push(ValidationError {
                field: "API_ENDPOINT".into(),
                message,
                suggestion,
            });
        }
    }

    if timeout_ms == 0 {
        errors.push(ValidationError {
            field: "REQUEST_TIMEOUT_MS".into(),
            message: "timeout must be greater than zero".into(),
            suggestion: Some("the default is 10000".into()),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
