//! Process-wide proxy configuration.
//!
//! [`ProxyConfig`] holds the upstream endpoint and the secret API key.
//! It is assembled once at startup from the CLI / environment, validated
//! by [`validation::validate`], and shared read-only with every request
//! through [`AppState`](crate::server::AppState).

pub mod validation;

use clap::ValueEnum;

/// Upstream endpoint and the credential injected into every outbound call.
///
/// Either field may be empty: the server still starts, but every `/proxy`
/// request is rejected until both are provided.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl ProxyConfig {
    /// Build a config from optional raw values. Empty strings count as unset.
    #[must_use]
    pub fn new(endpoint: Option<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.unwrap_or_default(),
            api_key: api_key.unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.endpoint.is_empty() && !self.api_key.is_empty()
    }
}

// The key must never reach the logs.
impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("ProxyConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &key)
            .finish()
    }
}

/// Which flavor of `/proxy` handler to mount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ProxyProfile {
    /// GET, POST, PUT and DELETE, no required query parameters.
    #[default]
    General,
    /// GET only; `postedFrom` and `postedTo` must both be present.
    Restricted,
}

impl ProxyProfile {
    pub const REQUIRED_PARAMS: [&'static str; 2] = ["postedFrom", "postedTo"];

    #[must_use]
    pub const fn requires_date_range(self) -> bool {
        matches!(self, Self::Restricted)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Restricted => "restricted",
        }
    }
}
