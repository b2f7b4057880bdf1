//! Auction handlers: listing, details, eligibility and administration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::context::AccountContext;
use crate::api::dto::{AuctionListQuery, CreateAuctionRequest, EligibilityQuery, ListResponse};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app_state::AppState;
use crate::domain::{AccountId, Auction, AuctionId, Eligibility};
use crate::error::{ErrorResponse, MarketError};
use crate::service::{AuctionDetail, Settlement};

/// `GET /auctions` — List auctions.
///
/// # Errors
///
/// Returns [`MarketError::InvalidArgument`] for an unknown status filter.
#[utoipa::path(
    get,
    path = "/api/v1/auctions",
    tag = "Auctions",
    summary = "List auctions",
    description = "Returns auctions sorted by start time descending. Price bounds apply to the current bid and are inclusive.",
    params(AuctionListQuery),
    responses(
        (status = 200, description = "Matching auctions", body = ListResponse<Auction>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
    )
)]
pub async fn list_auctions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AuctionListQuery>,
) -> Result<impl IntoResponse, MarketError> {
    let filter = query.into_filter()?;
    let auctions = state.auction_service.list_auctions(&filter).await;
    Ok(Json(ListResponse::from(auctions)))
}

/// `GET /auctions/{id}` — Auction with its bids.
///
/// # Errors
///
/// Returns [`MarketError::AuctionNotFound`] if the auction does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/auctions/{id}",
    tag = "Auctions",
    summary = "Get auction details",
    description = "Returns the auction together with its bids, newest first.",
    params(
        ("id" = uuid::Uuid, Path, description = "Auction UUID"),
    ),
    responses(
        (status = 200, description = "Auction details", body = AuctionDetail),
        (status = 404, description = "Auction not found", body = ErrorResponse),
    )
)]
pub async fn get_auction(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let detail = state
        .auction_service
        .get_auction(AuctionId::from_uuid(id))
        .await?;
    Ok(Json(detail))
}

/// `GET /auctions/{id}/eligibility` — Balance threshold check.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] when checking another account
/// without the administrator role, or a not-found error.
#[utoipa::path(
    get,
    path = "/api/v1/auctions/{id}/eligibility",
    tag = "Auctions",
    summary = "Check bidding eligibility",
    description = "Compares the account's credit and cash balances against the auction's minimum thresholds. Defaults to the acting account.",
    params(
        ("id" = uuid::Uuid, Path, description = "Auction UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Acting account"),
        EligibilityQuery,
    ),
    responses(
        (status = 200, description = "Eligibility outcome", body = Eligibility),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Auction or account not found", body = ErrorResponse),
    )
)]
pub async fn check_eligibility(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiQuery(query): ApiQuery<EligibilityQuery>,
) -> Result<impl IntoResponse, MarketError> {
    let account_id = query
        .account_id
        .map_or(ctx.account_id, AccountId::from_uuid);
    state
        .account_service
        .require_owner_or_administrator(ctx.account_id, account_id)
        .await?;
    let eligibility = state
        .auction_service
        .check_eligibility(AuctionId::from_uuid(id), account_id)
        .await?;
    Ok(Json(eligibility))
}

/// `POST /auctions` — Create a scheduled auction (administrator).
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] for non-administrators and
/// [`MarketError::InvalidArgument`] for an invalid request.
#[utoipa::path(
    post,
    path = "/api/v1/auctions",
    tag = "Auctions",
    summary = "Create an auction",
    description = "Creates a scheduled auction. The current bid starts at the starting bid.",
    params(
        ("X-Account-Id" = uuid::Uuid, Header, description = "Administrator account"),
    ),
    request_body = CreateAuctionRequest,
    responses(
        (status = 201, description = "Auction created", body = Auction),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
    )
)]
pub async fn create_auction(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiJson(req): ApiJson<CreateAuctionRequest>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .account_service
        .require_administrator(ctx.account_id)
        .await?;
    let auction = state.auction_service.create_auction(req.into()).await?;
    Ok((StatusCode::CREATED, Json(auction)))
}

/// `POST /auctions/{id}/start` — Open a scheduled auction (administrator).
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`], [`MarketError::AuctionNotFound`] or
/// [`MarketError::InvalidState`].
#[utoipa::path(
    post,
    path = "/api/v1/auctions/{id}/start",
    tag = "Auctions",
    summary = "Start an auction",
    params(
        ("id" = uuid::Uuid, Path, description = "Auction UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Administrator account"),
    ),
    responses(
        (status = 200, description = "Auction is live", body = Auction),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Auction not found", body = ErrorResponse),
        (status = 409, description = "Auction is not scheduled", body = ErrorResponse),
    )
)]
pub async fn start_auction(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .account_service
        .require_administrator(ctx.account_id)
        .await?;
    let auction = state
        .auction_service
        .start_auction(AuctionId::from_uuid(id))
        .await?;
    Ok(Json(auction))
}

/// `POST /auctions/{id}/cancel` — Cancel an auction (administrator).
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`], [`MarketError::AuctionNotFound`] or
/// [`MarketError::InvalidState`].
#[utoipa::path(
    post,
    path = "/api/v1/auctions/{id}/cancel",
    tag = "Auctions",
    summary = "Cancel an auction",
    description = "Cancels a scheduled or live auction. Every open bid becomes lost.",
    params(
        ("id" = uuid::Uuid, Path, description = "Auction UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Administrator account"),
    ),
    responses(
        (status = 200, description = "Auction cancelled", body = Auction),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Auction not found", body = ErrorResponse),
        (status = 409, description = "Auction already ended", body = ErrorResponse),
    )
)]
pub async fn cancel_auction(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .account_service
        .require_administrator(ctx.account_id)
        .await?;
    let auction = state
        .auction_service
        .cancel_auction(AuctionId::from_uuid(id))
        .await?;
    Ok(Json(auction))
}

/// `POST /auctions/{id}/close` — Close and settle a live auction
/// (administrator).
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`], [`MarketError::AuctionNotFound`] or
/// [`MarketError::InvalidState`].
#[utoipa::path(
    post,
    path = "/api/v1/auctions/{id}/close",
    tag = "Auctions",
    summary = "Close an auction",
    description = "Completes a live auction and debits the highest bidder who can still pay.",
    params(
        ("id" = uuid::Uuid, Path, description = "Auction UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Administrator account"),
    ),
    responses(
        (status = 200, description = "Auction settled", body = Settlement),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Auction not found", body = ErrorResponse),
        (status = 409, description = "Auction is not live", body = ErrorResponse),
    )
)]
pub async fn close_auction(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .account_service
        .require_administrator(ctx.account_id)
        .await?;
    let settlement = state
        .auction_service
        .close_auction(AuctionId::from_uuid(id))
        .await?;
    Ok(Json(settlement))
}

/// Auction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auctions", get(list_auctions).post(create_auction))
        .route("/auctions/{id}", get(get_auction))
        .route("/auctions/{id}/eligibility", get(check_eligibility))
        .route("/auctions/{id}/start", post(start_auction))
        .route("/auctions/{id}/cancel", post(cancel_auction))
        .route("/auctions/{id}/close", post(close_auction))
}
