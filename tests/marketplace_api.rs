//! End-to-end tests driving the REST API over a real socket.
//!
//! Each test boots the full router on an ephemeral port with fresh
//! in-memory state and talks to it with `reqwest`.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::str::FromStr;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

use waste_market_gateway::api;
use waste_market_gateway::app_state::AppState;
use waste_market_gateway::domain::{AccountId, AccountRole};
use waste_market_gateway::service::OpenAccountCommand;

struct TestServer {
    base: String,
    admin: AccountId,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let state = AppState::new(256);
        let admin = AccountId::new();
        let opened = state
            .account_service
            .open_account(OpenAccountCommand {
                account_id: Some(admin),
                role: AccountRole::Administrator,
                display_name: "Operator".to_string(),
                opening_cash: None,
            })
            .await;
        assert!(opened.is_ok());

        let app = api::build_app(state, std::time::Duration::from_secs(30));
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("failed to bind test listener");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has no address");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base: format!("http://{addr}"),
            admin,
            client: reqwest::Client::new(),
        }
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        actor: Option<AccountId>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, format!("{}{path}", self.base));
        if let Some(actor) = actor {
            request = request.header("x-account-id", actor.to_string());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let Ok(response) = request.send().await else {
            panic!("request to {path} failed");
        };
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str, actor: Option<AccountId>) -> (StatusCode, Value) {
        self.send(reqwest::Method::GET, path, actor, None).await
    }

    async fn post(&self, path: &str, actor: Option<AccountId>, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, actor, Some(body))
            .await
    }

    async fn open_company(&self, name: &str, cash: &str, credits: Option<&str>) -> AccountId {
        let (status, body) = self
            .post(
                "/api/v1/accounts",
                Some(self.admin),
                json!({ "role": "company", "display_name": name, "opening_cash": cash }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let Ok(id) = serde_json::from_value::<AccountId>(body["id"].clone()) else {
            panic!("account id missing: {body}");
        };
        if let Some(credits) = credits {
            let (status, body) = self
                .post(
                    &format!("/api/v1/accounts/{id}/credits"),
                    Some(self.admin),
                    json!({ "amount": credits, "source": "sorted cardboard" }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
        }
        id
    }

    async fn live_auction(&self, min_credit: &str, min_cash: &str) -> String {
        let now = Utc::now();
        let (status, body) = self
            .post(
                "/api/v1/auctions",
                Some(self.admin),
                json!({
                    "title": "Baled PET",
                    "material_type": "plastic",
                    "quantity": "500",
                    "unit": "kg",
                    "starting_bid": "100",
                    "minimum_credit_required": min_credit,
                    "minimum_cash_required": min_cash,
                    "start_time": now,
                    "end_time": now + Duration::hours(2),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let Some(id) = body["id"].as_str().map(str::to_string) else {
            panic!("auction id missing: {body}");
        };
        let (status, body) = self
            .post(&format!("/api/v1/auctions/{id}/start"), Some(self.admin), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], "live");
        id
    }
}

fn decimal(value: &Value) -> Decimal {
    let Some(raw) = value.as_str() else {
        panic!("expected decimal string, got {value}");
    };
    let Ok(parsed) = Decimal::from_str(raw) else {
        panic!("invalid decimal {raw}");
    };
    parsed
}

#[tokio::test]
async fn health_reports_healthy() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn bid_and_settle_with_credits() {
    let server = TestServer::start().await;
    let first = server.open_company("Recyco", "0", Some("500")).await;
    let second = server.open_company("Polyloop", "0", Some("300")).await;
    let auction = server.live_auction("50", "0").await;

    let (status, body) = server
        .post(
            &format!("/api/v1/auctions/{auction}/bids"),
            Some(first),
            json!({ "amount": "150", "bid_type": "credit" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "active");

    let (status, body) = server
        .post(
            &format!("/api/v1/auctions/{auction}/bids"),
            Some(second),
            json!({ "amount": "120", "bid_type": "credit" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"]["kind"], "invalid_argument");

    let (status, body) = server
        .post(
            &format!("/api/v1/auctions/{auction}/bids"),
            Some(second),
            json!({ "amount": "200", "bid_type": "credit" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = server
        .get(&format!("/api/v1/auctions/{auction}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["auction"]["current_bid"]), dec!(200));
    assert_eq!(body["bids"][0]["status"], "active");
    assert_eq!(body["bids"][1]["status"], "outbid");

    let (status, body) = server
        .post(
            &format!("/api/v1/auctions/{auction}/close"),
            Some(server.admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["auction"]["status"], "completed");
    assert_eq!(body["auction"]["winner_id"], json!(second));
    assert_eq!(decimal(&body["credit_transaction"]["amount"]), dec!(-200));

    let (status, body) = server
        .get(&format!("/api/v1/accounts/{second}/balance"), Some(second))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["credit_balance"]), dec!(100));

    let (status, body) = server
        .get(&format!("/api/v1/accounts/{first}/bids"), Some(first))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["status"], "lost");
}

#[tokio::test]
async fn ineligible_bidder_gets_reasons() {
    let server = TestServer::start().await;
    let bidder = server.open_company("Scrapco", "5", Some("40")).await;
    let auction = server.live_auction("50", "10").await;

    let (status, body) = server
        .get(&format!("/api/v1/auctions/{auction}/eligibility"), Some(bidder))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eligible"], false);

    let (status, body) = server
        .post(
            &format!("/api/v1/auctions/{auction}/bids"),
            Some(bidder),
            json!({ "amount": "110", "bid_type": "credit" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(body["error"]["code"], 4001);
    let Some(details) = body["error"]["details"].as_array() else {
        panic!("expected details: {body}");
    };
    assert_eq!(details.len(), 2);
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let server = TestServer::start().await;
    let bidder = server.open_company("Metalworks", "1000", None).await;
    let auction = server.live_auction("0", "0").await;

    let (status, body) = server
        .post(
            &format!("/api/v1/auctions/{auction}/bids"),
            Some(bidder),
            json!({ "amount": "150", "bid_type": "cash", "expected_version": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["error"]["kind"], "conflict");
}

#[tokio::test]
async fn caller_identity_is_enforced() {
    let server = TestServer::start().await;
    let company = server.open_company("Greencycle", "0", Some("10")).await;
    let other = server.open_company("Bluecycle", "0", None).await;

    let (status, body) = server
        .get(&format!("/api/v1/accounts/{company}/balance"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, _) = server
        .get(&format!("/api/v1/accounts/{company}/balance"), Some(other))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .get(&format!("/api/v1/accounts/{company}/balance"), Some(server.admin))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .post(
            &format!("/api/v1/accounts/{company}/credits"),
            Some(company),
            json!({ "amount": "1000", "source": "self-service" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(body["error"]["kind"], "forbidden");
}

#[tokio::test]
async fn rejected_redemption_refunds_credits() {
    let server = TestServer::start().await;
    let owner = server.open_company("Paperhub", "0", Some("500")).await;

    let (status, body) = server
        .post(
            &format!("/api/v1/accounts/{owner}/redemptions"),
            Some(owner),
            json!({
                "credits": "200",
                "payment_method": "mobile_banking",
                "payment_details": { "wallet": "017-000" },
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "pending");
    assert_eq!(decimal(&body["cash_amount"]), dec!(200));
    let Some(redemption) = body["id"].as_str().map(str::to_string) else {
        panic!("redemption id missing: {body}");
    };

    let (_, body) = server
        .get(&format!("/api/v1/accounts/{owner}/balance"), Some(owner))
        .await;
    assert_eq!(decimal(&body["credit_balance"]), dec!(300));

    let (status, body) = server
        .post(
            &format!("/api/v1/redemptions/{redemption}/status"),
            Some(server.admin),
            json!({ "status": "rejected", "note": "wallet closed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["redemption"]["status"], "rejected");
    assert_eq!(decimal(&body["refund"]["amount"]), dec!(200));

    let (_, body) = server
        .get(&format!("/api/v1/accounts/{owner}/balance"), Some(owner))
        .await;
    assert_eq!(decimal(&body["credit_balance"]), dec!(500));

    let (status, body) = server
        .post(
            &format!("/api/v1/redemptions/{redemption}/status"),
            Some(server.admin),
            json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = server
        .get(
            &format!("/api/v1/accounts/{owner}/transactions?type=refund"),
            Some(owner),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn malformed_body_gets_error_envelope() {
    let server = TestServer::start().await;
    let bidder = server.open_company("Recyco", "500", Some("200")).await;
    let auction = server.live_auction("0", "0").await;

    let (status, body) = server
        .post(
            &format!("/api/v1/auctions/{auction}/bids"),
            Some(bidder),
            json!({ "amount": "abc", "bid_type": "credit" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"]["kind"], "invalid_argument");

    let (status, body) = server
        .get(
            &format!("/api/v1/accounts/{bidder}/transactions?limit=-1"),
            Some(bidder),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"]["kind"], "invalid_argument");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/auctions/{id}/bids"].is_object());
}
