//! REST API layer: route handlers, DTOs, request context and router
//! composition.
//!
//! All resource endpoints are mounted under `/api/v1`. Callers identify
//! themselves with the `X-Account-Id` header.

pub mod context;
pub mod dto;
pub mod extract;
pub mod handlers;
pub mod openapi;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints and the OpenAPI
/// document.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .merge(openapi::routes())
}

/// Builds the servable application: the API router wrapped in tracing,
/// request timeout and CORS middleware, bound to `state`.
///
/// Requests running longer than `request_timeout` are answered with
/// `408 Request Timeout`.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(build_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, header};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    async fn send(
        method: Method,
        uri: &str,
        account: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let app = build_app(AppState::new(16), Duration::from_secs(5));
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(account) = account {
            request = request.header(context::ACCOUNT_HEADER, account);
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let Ok(request) = request.body(body) else {
            panic!("invalid request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router failed");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), 1024 * 1024).await else {
            panic!("unreadable body");
        };
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn call(uri: &str, account: Option<&str>) -> (StatusCode, Value) {
        send(Method::GET, uri, account, None).await
    }

    fn error_kind(body: &Value) -> Option<&str> {
        body.get("error")
            .and_then(|e| e.get("kind"))
            .and_then(Value::as_str)
    }

    #[tokio::test]
    async fn public_listing_needs_no_identity() {
        let (status, body) = call("/api/v1/auctions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("total").and_then(Value::as_u64), Some(0));
    }

    #[tokio::test]
    async fn unknown_auction_uses_error_envelope() {
        let uri = format!("/api/v1/auctions/{}", uuid::Uuid::new_v4());
        let (status, body) = call(&uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_kind(&body), Some("not_found"));
    }

    #[tokio::test]
    async fn account_routes_require_identity() {
        let uri = format!("/api/v1/accounts/{}/balance", uuid::Uuid::new_v4());
        let (status, _) = call(&uri, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&uri, Some("not-a-uuid")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_bid_body_uses_error_envelope() {
        let uri = format!("/api/v1/auctions/{}/bids", uuid::Uuid::new_v4());
        let bidder = uuid::Uuid::new_v4().to_string();
        let (status, body) = send(
            Method::POST,
            &uri,
            Some(&bidder),
            Some(r#"{"amount":"abc","bid_type":"credit"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(&body), Some("invalid_argument"));
    }

    #[tokio::test]
    async fn bid_body_without_content_type_uses_error_envelope() {
        let uri = format!("/api/v1/auctions/{}/bids", uuid::Uuid::new_v4());
        let bidder = uuid::Uuid::new_v4().to_string();
        let app = build_app(AppState::new(16), Duration::from_secs(5));
        let Ok(request) = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(context::ACCOUNT_HEADER, bidder)
            .body(Body::from(r#"{"amount":"10","bid_type":"credit"}"#))
        else {
            panic!("invalid request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router failed");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_query_uses_error_envelope() {
        let account = uuid::Uuid::new_v4().to_string();
        let uri = format!("/api/v1/accounts/{account}/transactions?page=abc");
        let (status, body) = call(&uri, Some(&account)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(&body), Some("invalid_argument"));
    }

    #[tokio::test]
    async fn malformed_path_uses_error_envelope() {
        let (status, body) = call("/api/v1/auctions/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(&body), Some("invalid_argument"));
    }

    #[tokio::test]
    async fn health_is_served_through_middleware() {
        let (status, _) = call("/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
