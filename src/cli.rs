//! Command-line interface definitions using clap derive macros.
//!
//! keyproxy has no subcommands: [`Cli`] carries the run options directly.
//! Every flag has an environment variable equivalent for container
//! deployments, and the upstream credentials are normally supplied that
//! way (`API_ENDPOINT`, `API_KEY`).

use clap::{Parser, ValueEnum};

use crate::config::ProxyProfile;

#[derive(Parser)]
#[command(
    name = "keyproxy",
    version,
    about = "HTTP forwarding proxy that injects an API key into upstream requests",
    after_help = "\x1b[1mExamples:\x1b[0m\n  \
        API_ENDPOINT=https://api.example.com/v1 API_KEY=... keyproxy\n  \
        keyproxy --port 9000 --pretty                       Local dev mode\n  \
        keyproxy --profile restricted                       GET only, date range required"
)]
pub struct Cli {
    /// Absolute URL of the upstream API
    #[arg(long, env = "API_ENDPOINT")]
    pub api_endpoint: Option<String>,

    /// Secret injected as the `api_key` query parameter
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Handler variant mounted on /proxy
    #[arg(long, env = "PROXY_PROFILE", value_enum, default_value_t = ProxyProfile::General)]
    pub profile: ProxyProfile,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Tuning --
    /// Upstream request timeout in milliseconds
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        help_heading = "Tuning"
    )]
    pub timeout: u64,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 1_048_576,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}
