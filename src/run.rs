//! Start the proxy server.
//!
//! Builds the immutable [`ProxyConfig`] from the parsed CLI, validates
//! it, and serves the Axum router until Ctrl+C / SIGTERM.

use std::io::IsTerminal;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::Cli;
use crate::config::{validation, ProxyConfig};
use crate::error::KeyproxyError;
use crate::logging::{self, LogFormat};
use crate::server::{self, AppState};

pub async fn execute(cli: Cli) -> Result<(), KeyproxyError> {
    let log_format = LogFormat::resolve(cli.pretty, cli.json, std::io::stdout().is_terminal());
    logging::init(&cli.log_level, log_format);

    let config = ProxyConfig::new(cli.api_endpoint, cli.api_key);
    validation::validate(&config, cli.timeout)
        .map_err(|errors| KeyproxyError::ConfigValidation { errors })?;

    if !config.is_complete() {
        tracing::warn!(
            endpoint_set = !config.endpoint.is_empty(),
            api_key_set = !config.api_key.is_empty(),
            "API_ENDPOINT or API_KEY is not set; every /proxy request will fail"
        );
    }

    let endpoint = config.endpoint.clone();
    let state = Arc::new(AppState::new(
        config,
        cli.profile,
        Duration::from_millis(cli.timeout),
        cli.max_body,
    ));

    let router = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        endpoint = %endpoint,
        profile = cli.profile.as_str(),
        timeout_ms = cli.timeout,
        "keyproxy started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("keyproxy stopped");
    Ok(())
}
