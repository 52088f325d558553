//! keyproxy is an HTTP forwarding proxy that keeps a third-party API key
//! out of client code.
//!
//! Every request to `/proxy` is forwarded to one fixed upstream endpoint
//! with the configured secret injected as the `api_key` query parameter.
//! The upstream JSON body and status code are relayed back unchanged;
//! failures are turned into JSON error responses.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line / environment parsing with clap derive macros.
//! - [`config`] -- The immutable [`ProxyConfig`](config::ProxyConfig), the
//!   handler profile, and startup validation.
//! - [`error`] -- Process-level and per-request error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- Inbound handlers, outbound request construction, and the
//!   single forwarding call.
//! - [`run`] -- Process startup: config assembly, binding, graceful shutdown.
//! - [`server`] -- Axum router, shared application state, HTTP client, and
//!   shutdown signal handling.

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod run;
pub mod server;
