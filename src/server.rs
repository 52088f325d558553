//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared, read-only state holding the
//! proxy config, selected profile, outbound timeout, inbound body limit
//! and HTTP client), [`build_router`] for mounting the `/proxy` and `/`
//! routes, [`build_http_client`] for the redirect-following hyper client,
//! and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.
//!
//! The inbound body limit is enforced by the `/proxy` handler itself,
//! after the configuration check, so a misconfigured proxy answers every
//! request with the same JSON error whatever the body size.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{any, get, MethodRouter};
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::follow_redirect::{FollowRedirect, FollowRedirectLayer};
use tower_http::trace::TraceLayer;

use crate::config::{ProxyConfig, ProxyProfile};
use crate::proxy;

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HyperClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;
/// Follows up to 20 redirects; 301/302 for POST and any 303 switch to GET.
pub type HttpClient = FollowRedirect<HyperClient>;

/// Everything a request handler reads. Nothing in here changes after startup.
pub struct AppState {
    pub config: ProxyConfig,
    pub profile: ProxyProfile,
    pub timeout: Duration,
    pub max_body: usize,
    pub http_client: HttpClient,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: ProxyConfig,
        profile: ProxyProfile,
        timeout: Duration,
        max_body: usize,
    ) -> Self {
        Self {
            config,
            profile,
            timeout,
            max_body,
            http_client: build_http_client(),
        }
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // rustls cannot pick a crypto provider on its own when more than one is
    // compiled in; install `ring` explicitly.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    let client = Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https);
    ServiceBuilder::new()
        .layer(FollowRedirectLayer::new())
        .service(client)
}

fn proxy_methods(profile: ProxyProfile) -> MethodRouter<Arc<AppState>> {
    match profile {
        ProxyProfile::General => get(proxy::proxy_handler)
            .post(proxy::proxy_handler)
            .put(proxy::proxy_handler)
            .delete(proxy::proxy_handler),
        ProxyProfile::Restricted => get(proxy::proxy_handler),
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/proxy", proxy_methods(state.profile))
        .route("/", any(proxy::root_handler))
        .fallback(proxy::fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
