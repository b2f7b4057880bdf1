//! Account handlers: opening accounts, balances, ledger history and
//! administrative balance changes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::context::AccountContext;
use crate::api::dto::{
    AddCreditsRequest, AdjustCashRequest, ListResponse, OpenAccountRequest, TransactionsQuery,
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app_state::AppState;
use crate::domain::{
    Account, AccountId, Balance, CashAdjustment, CreditTransaction, LedgerSummary, TransactionPage,
};
use crate::error::{ErrorResponse, MarketError};
use crate::service::OpenAccountCommand;

/// `POST /accounts` — Open an account (administrator).
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] for non-administrators and
/// [`MarketError::InvalidArgument`] for an invalid request or a taken
/// identifier.
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "Accounts",
    summary = "Open an account",
    description = "Registers a participant with zero credits and an optional opening cash balance.",
    params(
        ("X-Account-Id" = uuid::Uuid, Header, description = "Administrator account"),
    ),
    request_body = OpenAccountRequest,
    responses(
        (status = 201, description = "Account opened", body = Account),
        (status = 400, description = "Invalid request or identifier taken", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
    )
)]
pub async fn open_account(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiJson(req): ApiJson<OpenAccountRequest>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .account_service
        .require_administrator(ctx.account_id)
        .await?;
    let command = OpenAccountCommand::try_from(req)?;
    let account = state.account_service.open_account(command).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// `GET /accounts/{id}/balance` — Current credit and cash balances.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] or [`MarketError::AccountNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/balance",
    tag = "Accounts",
    summary = "Get balances",
    params(
        ("id" = uuid::Uuid, Path, description = "Account UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Acting account"),
    ),
    responses(
        (status = 200, description = "Current balances", body = Balance),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
    )
)]
pub async fn balance(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let account_id = authorize(&state, &ctx, id).await?;
    let balance = state.account_service.balance(account_id).await?;
    Ok(Json(balance))
}

/// `GET /accounts/{id}/transactions` — Paged credit history.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`], [`MarketError::InvalidArgument`] for
/// an unknown type filter, or [`MarketError::AccountNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/transactions",
    tag = "Accounts",
    summary = "List credit transactions",
    description = "Returns the account's credit transactions, newest first, with page metadata.",
    params(
        ("id" = uuid::Uuid, Path, description = "Account UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Acting account"),
        TransactionsQuery,
    ),
    responses(
        (status = 200, description = "One page of transactions", body = TransactionPage),
        (status = 400, description = "Invalid type filter", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
    )
)]
pub async fn transactions(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiQuery(query): ApiQuery<TransactionsQuery>,
) -> Result<impl IntoResponse, MarketError> {
    let account_id = authorize(&state, &ctx, id).await?;
    let page = state
        .account_service
        .transactions(account_id, query.into_history_query()?)
        .await?;
    Ok(Json(page))
}

/// `GET /accounts/{id}/summary` — Per-type credit totals.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] or [`MarketError::AccountNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/summary",
    tag = "Accounts",
    summary = "Summarize credit history",
    params(
        ("id" = uuid::Uuid, Path, description = "Account UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Acting account"),
    ),
    responses(
        (status = 200, description = "Totals per transaction type", body = LedgerSummary),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
    )
)]
pub async fn summary(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let account_id = authorize(&state, &ctx, id).await?;
    let summary = state.account_service.summary(account_id).await?;
    Ok(Json(summary))
}

/// `GET /accounts/{id}/cash` — Cash adjustment history.
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`] or [`MarketError::AccountNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/cash",
    tag = "Accounts",
    summary = "List cash adjustments",
    params(
        ("id" = uuid::Uuid, Path, description = "Account UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Acting account"),
    ),
    responses(
        (status = 200, description = "Cash adjustments, newest first", body = ListResponse<CashAdjustment>),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
    )
)]
pub async fn cash_history(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let account_id = authorize(&state, &ctx, id).await?;
    let history = state.account_service.cash_history(account_id).await?;
    Ok(Json(ListResponse::from(history)))
}

/// `POST /accounts/{id}/credits` — Record earned or bonus credits
/// (administrator).
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`], [`MarketError::InvalidArgument`] or
/// [`MarketError::AccountNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/accounts/{id}/credits",
    tag = "Accounts",
    summary = "Add credits",
    description = "Records credits earned for a deposit, or a bonus, and notifies the account.",
    params(
        ("id" = uuid::Uuid, Path, description = "Account UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Administrator account"),
    ),
    request_body = AddCreditsRequest,
    responses(
        (status = 201, description = "Credits recorded", body = CreditTransaction),
        (status = 400, description = "Invalid amount or kind", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
    )
)]
pub async fn add_credits(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiJson(req): ApiJson<AddCreditsRequest>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .account_service
        .require_administrator(ctx.account_id)
        .await?;
    let command = req.into_command(AccountId::from_uuid(id))?;
    let tx = state.account_service.add_credits(command).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

/// `POST /accounts/{id}/cash` — Signed cash adjustment (administrator).
///
/// # Errors
///
/// Returns [`MarketError::Forbidden`], [`MarketError::InvalidArgument`],
/// [`MarketError::AccountNotFound`] or [`MarketError::InsufficientFunds`]
/// when a debit would overdraw the account.
#[utoipa::path(
    post,
    path = "/api/v1/accounts/{id}/cash",
    tag = "Accounts",
    summary = "Adjust cash balance",
    params(
        ("id" = uuid::Uuid, Path, description = "Account UUID"),
        ("X-Account-Id" = uuid::Uuid, Header, description = "Administrator account"),
    ),
    request_body = AdjustCashRequest,
    responses(
        (status = 201, description = "Adjustment recorded", body = CashAdjustment),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 422, description = "Balance would go negative", body = ErrorResponse),
    )
)]
pub async fn adjust_cash(
    State(state): State<AppState>,
    ctx: AccountContext,
    ApiPath(id): ApiPath<uuid::Uuid>,
    ApiJson(req): ApiJson<AdjustCashRequest>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .account_service
        .require_administrator(ctx.account_id)
        .await?;
    let adjustment = state
        .account_service
        .adjust_cash(req.into_command(AccountId::from_uuid(id)))
        .await?;
    Ok((StatusCode::CREATED, Json(adjustment)))
}

async fn authorize(
    state: &AppState,
    ctx: &AccountContext,
    id: uuid::Uuid,
) -> Result<AccountId, MarketError> {
    let account_id = AccountId::from_uuid(id);
    state
        .account_service
        .require_owner_or_administrator(ctx.account_id, account_id)
        .await?;
    Ok(account_id)
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(open_account))
        .route("/accounts/{id}/balance", get(balance))
        .route("/accounts/{id}/transactions", get(transactions))
        .route("/accounts/{id}/summary", get(summary))
        .route("/accounts/{id}/cash", get(cash_history).post(adjust_cash))
        .route("/accounts/{id}/credits", post(add_credits))
}
