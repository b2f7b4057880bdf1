//! Redemption handlers: request a payout, list requests, process them.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::context::AccountContext;
use crate::api::dto::{AdvanceRedemptionRequest, ListResponse, RedeemRequest, RedemptionListQuery};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app_state::AppState;
use crate::domain::{AccountId, CreditRedemption, RedemptionId};
use crate::error::{ErrorResponse, MarketError};
use crate::service::RedemptionUpdate;

/// `POST /accounts/{id}/redemptions` — Convert own credits into a payout.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] for another account,
/// [`MarketError::InvalidArgument`], [`MarketError::AccountNotFound`] or
/// [`MarketError::InsufficientFunds`].
#[utoipa::path(
    post,
    path = "/api/v1/accounts/{id}/redemptions",
    tag = "Redemptions",
    summary = "Redeem credits",
    description = "Debits the credits immediately and creates a pending payout request at one unit of cash per credit.",
    params(
        ("id" = uuid::Uuid, Path, description = "Account UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Must equal the account"),
    ),
    request_body = RedeemRequest,
    responses(
        (status = 201, description = "Redemption requested", body = CreditRedemption),
        (status = 400, description = "Invalid amount or payment method", body = ErrorResponse),
        (status = 403, description = "Not the account owner", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 422, description = "Insufficient credits", body = ErrorResponse),
    )
)]
pub async fn redeem(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiJson(req): ApiJson<RedeemRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let account_id = AccountId::from_uuid(id);
    ctx.require_self(account_id)?;
    let redemption = state
        .redemption_service
        .redeem(req.into_command(account_id)?)
        .await?;
    Ok((StatusCode::CREATED, Json(redemption)))
}

/// `GET /accounts/{id}/redemptions` — An account's redemptions, newest
/// first.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`], [`MarketError::InvalidArgument`] for
/// an unknown status, or [`MarketError::AccountNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/redemptions",
    tag = "Redemptions",
    summary = "List redemptions",
    params(
        ("id" = uuid::Uuid, Path, description = "Account UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Acting account"),
        RedemptionListQuery,
    ),
    responses(
        (status = 200, description = "Redemptions, newest first", body = ListResponse<CreditRedemption>),
        (status = 400, description = "Invalid status filter", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
    )
)]
pub async fn list_redemptions(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiQuery(query): ApiQuery<RedemptionListQuery>,
) -> Result<impl IntoResponse, MarketError> {
    let account_id = AccountId::from_uuid(id);
    state
        .account_service
        .require_owner_or_administrator(ctx.account_id, account_id)
        .await?;
    let redemptions = state
        .redemption_service
        .list(account_id, query.status()?)
        .await?;
    Ok(Json(ListResponse::from(redemptions)))
}

/// `GET /redemptions/{id}` — One redemption.
///
/// # Errors
///
/// Returns [`MarketError::RedemptionNotFound`] or [`MarketError::Forbidden`]
/// when the acting account neither owns it nor administers.
#[utoipa::path(
    get,
    path = "/api/v1/redemptions/{id}",
    tag = "Redemptions",
    summary = "Get a redemption",
    params(
        ("id" = uuid::Uuid, Path, description = "Redemption UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Acting account"),
    ),
    responses(
        (status = 200, description = "The redemption", body = CreditRedemption),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Redemption not found", body = ErrorResponse),
    )
)]
pub async fn get_redemption(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let redemption = state
        .redemption_service
        .get(RedemptionId::from_uuid(id))
        .await?;
    state
        .account_service
        .require_owner_or_administrator(ctx.account_id, redemption.account_id)
        .await?;
    Ok(Json(redemption))
}

/// `POST /redemptions/{id}/status` — Advance a redemption (administrator).
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`], [`MarketError::InvalidArgument`],
/// [`MarketError::RedemptionNotFound`] or [`MarketError::InvalidState`].
#[utoipa::path(
    post,
    path = "/api/v1/redemptions/{id}/status",
    tag = "Redemptions",
    summary = "Update redemption status",
    description = "Moves a redemption to processing, completed or rejected. Rejection refunds the credits.",
    params(
        ("id" = uuid::Uuid, Path, description = "Redemption UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Administrator account"),
    ),
    request_body = AdvanceRedemptionRequest,
    responses(
        (status = 200, description = "Redemption updated", body = RedemptionUpdate),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Redemption not found", body = ErrorResponse),
        (status = 409, description = "Redemption already finalized", body = ErrorResponse),
    )
)]
pub async fn advance_redemption(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiJson(req): ApiJson<AdvanceRedemptionRequest>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .account_service
        .require_administrator(ctx.account_id)
        .await?;
    let update = state
        .redemption_service
        .advance(req.into_command(RedemptionId::from_uuid(id))?)
        .await?;
    Ok(Json(update))
}

/// Redemption routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/{id}/redemptions",
            get(list_redemptions).post(redeem),
        )
        .route("/redemptions/{id}", get(get_redemption))
        .route("/redemptions/{id}/status", post(advance_redemption))
}
