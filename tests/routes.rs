//! Router-level tests for checks that never reach the upstream.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use keyproxy::config::{ProxyConfig, ProxyProfile};
use keyproxy::server::{self, AppState};

// Port 9 (discard) on localhost; none of these tests should ever connect.
const UNREACHABLE: &str = "http://127.0.0.1:9/api";

const MAX_BODY: usize = 1024;

fn router(config: ProxyConfig, profile: ProxyProfile) -> Router {
    let state = Arc::new(AppState::new(
        config,
        profile,
        Duration::from_secs(1),
        MAX_BODY,
    ));
    server::build_router(state)
}

fn configured() -> ProxyConfig {
    ProxyConfig::new(Some(UNREACHABLE.into()), Some("secret".into()))
}

async fn send(router: Router, method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn missing_configuration_returns_500_for_every_method() {
    for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
        let (status, body) = send(
            router(ProxyConfig::default(), ProxyProfile::General),
            method,
            "/proxy?q=1",
            Body::from(r#"{"a":1}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(&body), json!({"error": "Missing API configuration"}));
    }
}

#[tokio::test]
async fn missing_key_alone_is_a_configuration_error() {
    let config = ProxyConfig::new(Some(UNREACHABLE.into()), None);
    let (status, body) = send(
        router(config, ProxyProfile::General),
        Method::GET,
        "/proxy",
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body), json!({"error": "Missing API configuration"}));
}

#[tokio::test]
async fn connect_is_rejected_regardless_of_configuration() {
    for config in [ProxyConfig::default(), configured()] {
        let (status, body) = send(
            router(config, ProxyProfile::General),
            Method::CONNECT,
            "/",
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "CONNECT method is not supported. Use direct HTTPS requests."
        );
    }
}

#[tokio::test]
async fn authority_form_connect_is_rejected() {
    let (status, body) = send(
        router(configured(), ProxyProfile::General),
        Method::CONNECT,
        "example.com:443",
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(String::from_utf8(body).unwrap().starts_with("CONNECT method is not supported"));
}

#[tokio::test]
async fn other_methods_on_root_are_not_allowed() {
    let (status, _) = send(
        router(configured(), ProxyProfile::General),
        Method::GET,
        "/",
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unknown_paths_return_404() {
    let (status, _) = send(
        router(configured(), ProxyProfile::General),
        Method::GET,
        "/elsewhere",
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_is_not_proxied() {
    let (status, _) = send(
        router(configured(), ProxyProfile::General),
        Method::PATCH,
        "/proxy",
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn oversized_body_without_configuration_is_a_configuration_error() {
    let (status, body) = send(
        router(ProxyConfig::default(), ProxyProfile::General),
        Method::POST,
        "/proxy",
        Body::from(vec![b'x'; MAX_BODY * 4]),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body), json!({"error": "Missing API configuration"}));
}

#[tokio::test]
async fn oversized_body_returns_413_json() {
    let (status, body) = send(
        router(configured(), ProxyProfile::General),
        Method::PUT,
        "/proxy",
        Body::from(vec![b' '; MAX_BODY + 1]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        json_body(&body),
        json!({"error": "Request body too large", "details": "limit is 1024 bytes"})
    );
}

#[tokio::test]
async fn malformed_json_body_returns_400() {
    let (status, body) = send(
        router(configured(), ProxyProfile::General),
        Method::POST,
        "/proxy",
        Body::from("{oops"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json_body(&body);
    assert_eq!(body["error"], "Invalid JSON body");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn restricted_profile_requires_date_range() {
    for uri in [
        "/proxy",
        "/proxy?postedFrom=01/01/2024",
        "/proxy?postedTo=01/31/2024",
    ] {
        let (status, body) = send(
            router(configured(), ProxyProfile::Restricted),
            Method::GET,
            uri,
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            json_body(&body),
            json!({"error": "Missing required parameters: postedFrom and postedTo"})
        );
    }
}

#[tokio::test]
async fn restricted_profile_checks_configuration_first() {
    let (status, body) = send(
        router(ProxyConfig::default(), ProxyProfile::Restricted),
        Method::GET,
        "/proxy",
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body), json!({"error": "Missing API configuration"}));
}

#[tokio::test]
async fn restricted_profile_is_get_only() {
    for method in [Method::POST, Method::PUT, Method::DELETE] {
        let (status, _) = send(
            router(configured(), ProxyProfile::Restricted),
            method,
            "/proxy?postedFrom=a&postedTo=b",
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}

#[tokio::test]
async fn general_profile_ignores_date_range() {
    let (status, body) = send(
        router(ProxyConfig::default(), ProxyProfile::General),
        Method::GET,
        "/proxy",
        Body::empty(),
    )
    .await;
    // Reaches the configuration check, not the parameter check.
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body)["error"], "Missing API configuration");
}

#[tokio::test]
async fn correlation_id_is_echoed() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/proxy")
        .header("x-correlation-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = router(ProxyConfig::default(), ProxyProfile::General)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.headers().get("x-correlation-id").unwrap(), "abc-123");
}
