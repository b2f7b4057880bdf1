//! Bid handlers: place a bid, list bids per auction or per bidder.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::context::AccountContext;
use crate::api::dto::{ListResponse, PlaceBidRequest, UserBidsQuery};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app_state::AppState;
use crate::domain::{AccountId, AuctionId, Bid};
use crate::error::{ErrorResponse, MarketError};

/// `POST /auctions/{id}/bids` — Place a bid as the acting account.
///
/// # Errors
///
/// Returns the bid engine's errors: not found, invalid state, conflict,
/// not eligible, invalid amount or insufficient funds.
#[utoipa::path(
    post,
    path = "/api/v1/auctions/{id}/bids",
    tag = "Bids",
    summary = "Place a bid",
    description = "Places a bid on a live auction. The amount must strictly exceed the current bid and the bidder must meet the auction's thresholds and hold the declared balance. No funds are reserved.",
    params(
        ("id" = uuid::Uuid, Path, description = "Auction UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Bidding account"),
    ),
    request_body = PlaceBidRequest,
    responses(
        (status = 201, description = "Bid accepted", body = Bid),
        (status = 400, description = "Invalid amount or bid type", body = ErrorResponse),
        (status = 403, description = "Bidder not eligible", body = ErrorResponse),
        (status = 404, description = "Auction or bidder not found", body = ErrorResponse),
        (status = 409, description = "Auction not live or version conflict", body = ErrorResponse),
        (status = 422, description = "Insufficient balance", body = ErrorResponse),
    )
)]
pub async fn place_bid(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiJson(req): ApiJson<PlaceBidRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let command = req.into_command(AuctionId::from_uuid(id), ctx.account_id)?;
    let bid = state.auction_service.place_bid(command).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

/// `GET /auctions/{id}/bids` — Bids on an auction, newest first.
///
/// # Errors
///
/// Returns [`MarketError::AuctionNotFound`] if the auction does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/auctions/{id}/bids",
    tag = "Bids",
    summary = "List auction bids",
    params(
        ("id" = uuid::Uuid, Path, description = "Auction UUID"),
    ),
    responses(
        (status = 200, description = "Bids, newest first", body = ListResponse<Bid>),
        (status = 404, description = "Auction not found", body = ErrorResponse),
    )
)]
pub async fn auction_bids(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let bids = state
        .auction_service
        .auction_bids(AuctionId::from_uuid(id))
        .await?;
    Ok(Json(ListResponse::from(bids)))
}

/// `GET /accounts/{id}/bids` — Bids placed by an account, newest first.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] for other accounts without the
/// administrator role, [`MarketError::InvalidArgument`] for an unknown
/// status, or [`MarketError::AccountNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/bids",
    tag = "Bids",
    summary = "List an account's bids",
    params(
        ("id" = uuid::Uuid, Path, description = "Account UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Acting account"),
        UserBidsQuery,
    ),
    responses(
        (status = 200, description = "Bids, newest first", body = ListResponse<Bid>),
        (status = 400, description = "Invalid status filter", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
    )
)]
pub async fn user_bids(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiQuery(query): ApiQuery<UserBidsQuery>,
) -> Result<impl IntoResponse, MarketError> {
    let account_id = AccountId::from_uuid(id);
    state
        .account_service
        .require_owner_or_administrator(ctx.account_id, account_id)
        .await?;
    let bids = state
        .auction_service
        .user_bids(account_id, query.status()?)
        .await?;
    Ok(Json(ListResponse::from(bids)))
}

/// Bid routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auctions/{id}/bids", get(auction_bids).post(place_bid))
        .route("/accounts/{id}/bids", get(user_bids))
}
