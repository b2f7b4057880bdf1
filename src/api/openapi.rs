//! OpenAPI document for the REST surface.
//!
//! With the `swagger-ui` feature the document is served through Swagger UI
//! at `/swagger-ui`; the raw JSON is always available at
//! `/api-docs/openapi.json`.

use axum::Router;
use utoipa::OpenApi;

use crate::api::handlers::{account, auction, bid, redemption, system};
use crate::app_state::AppState;

/// Path of the generated OpenAPI JSON document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Aggregated OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "waste-market-gateway",
        description = "Auction bidding, eligibility, credit ledger and redemption API for a waste-management marketplace."
    ),
    paths(
        system::health_handler,
        auction::list_auctions,
        auction::get_auction,
        auction::check_eligibility,
        auction::create_auction,
        auction::start_auction,
        auction::cancel_auction,
        auction::close_auction,
        bid::place_bid,
        bid::auction_bids,
        bid::user_bids,
        account::open_account,
        account::balance,
        account::transactions,
        account::summary,
        account::cash_history,
        account::add_credits,
        account::adjust_cash,
        redemption::redeem,
        redemption::list_redemptions,
        redemption::get_redemption,
        redemption::advance_redemption,
    ),
    tags(
        (name = "Auctions", description = "Auction listing, lifecycle and settlement"),
        (name = "Bids", description = "Bid placement and history"),
        (name = "Accounts", description = "Balances and the credit ledger"),
        (name = "Redemptions", description = "Credit to cash payouts"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Routes serving the OpenAPI document.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()))
}

/// Routes serving the OpenAPI document.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
