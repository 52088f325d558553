//! Construction of the request sent to the upstream API.
//!
//! An [`OutboundRequest`] is built once per inbound request from the
//! caller's method, query parameters and (for POST/PUT) JSON body. The
//! body is kept as the raw JSON text the caller sent. The configured secret is written into the `api_key` parameter last, so a
//! client-supplied `api_key` is always replaced.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{header, HeaderValue, Method};
use http_body_util::Full;
use serde_json::value::RawValue;
use url::Url;

use crate::config::ProxyConfig;

pub const API_KEY_PARAM: &str = "api_key";

const REDACTED: &str = "<redacted>";

/// Whether the inbound body is forwarded for this method.
#[must_use]
pub fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT
}

pub struct OutboundRequest {
    pub method: Method,
    pub endpoint: String,
    pub params: BTreeMap<String, String>,
    pub body: Option<Box<RawValue>>,
}

impl OutboundRequest {
    /// Build the outbound request, injecting the configured key.
    ///
    /// `body` is dropped unless the method is POST or PUT.
    #[must_use]
    pub fn new(
        config: &ProxyConfig,
        method: Method,
        mut params: BTreeMap<String, String>,
        body: Option<Box<RawValue>>,
    ) -> Self {
        params.insert(API_KEY_PARAM.to_string(), config.api_key.clone());
        let body = if carries_body(&method) { body } else { None };
        Self {
            method,
            endpoint: config.endpoint.clone(),
            params,
            body,
        }
    }

    /// Parameters safe to log: the injected key is masked.
    #[must_use]
    pub fn redacted_params(&self) -> BTreeMap<&str, &str> {
        self.params
            .iter()
            .map(|(k, v)| {
                if k == API_KEY_PARAM {
                    (k.as_str(), REDACTED)
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect()
    }

    /// Endpoint URL with the outbound parameters applied.
    ///
    /// Query pairs already present on the endpoint are kept unless the
    /// request sets the same key.
    pub fn target_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.endpoint)?;
        let existing: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !self.params.contains_key(k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.set_query(None);
        url.query_pairs_mut()
            .extend_pairs(&existing)
            .extend_pairs(&self.params);
        Ok(url)
    }

    /// Render as a hyper request ready for the client.
    pub fn to_http_request(&self) -> Result<hyper::Request<Full<Bytes>>, String> {
        let url = self.target_url().map_err(|e| format!("invalid endpoint: {e}"))?;
        let body = self
            .body
            .as_ref()
            .map_or_else(Bytes::new, |raw| Bytes::from(raw.get().to_owned()));

        hyper::Request::builder()
            .method(self.method.clone())
            .uri(url.as_str())
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .body(Full::new(body))
            .map_err(|e| e.to_string())
    }
}

impl std::fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundRequest")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint)
            .field("params", &self.redacted_params())
            .field("body", &self.body)
            .finish()
    }
}
