//! Auction and bid DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{parse_optional_enum, parse_text};
use crate::domain::{AccountId, AuctionFilter, AuctionId};
use crate::error::MarketError;
use crate::service::{CreateAuctionCommand, PlaceBidCommand};

/// Request body for `POST /auctions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAuctionRequest {
    /// Short title.
    pub title: String,
    /// Material category (e.g. `"plastic"`).
    pub material_type: String,
    /// Lot size.
    pub quantity: Decimal,
    /// Unit of `quantity` (e.g. `"kg"`).
    pub unit: String,
    /// Opening price.
    pub starting_bid: Decimal,
    /// Credit balance a bidder must hold. Defaults to 0.
    #[serde(default)]
    pub minimum_credit_required: Decimal,
    /// Cash balance a bidder must hold. Defaults to 0.
    #[serde(default)]
    pub minimum_cash_required: Decimal,
    /// Scheduled opening time (ISO-8601).
    pub start_time: DateTime<Utc>,
    /// Scheduled closing time (ISO-8601).
    pub end_time: DateTime<Utc>,
}

impl From<CreateAuctionRequest> for CreateAuctionCommand {
    fn from(req: CreateAuctionRequest) -> Self {
        Self {
            title: req.title,
            material_type: req.material_type,
            quantity: req.quantity,
            unit: req.unit,
            starting_bid: req.starting_bid,
            minimum_credit_required: req.minimum_credit_required,
            minimum_cash_required: req.minimum_cash_required,
            start_time: req.start_time,
            end_time: req.end_time,
        }
    }
}

/// Query parameters for `GET /auctions`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuctionListQuery {
    /// `scheduled`, `live`, `completed` or `cancelled`.
    pub status: Option<String>,
    /// Material category, case-insensitive.
    pub material_type: Option<String>,
    /// Inclusive lower bound on the current bid.
    #[param(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    /// Inclusive upper bound on the current bid.
    #[param(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
}

impl AuctionListQuery {
    /// Converts the query into a registry filter.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an unknown status.
    pub fn into_filter(self) -> Result<AuctionFilter, MarketError> {
        Ok(AuctionFilter {
            status: parse_optional_enum("auction status", self.status.as_deref())?,
            material_type: self.material_type.filter(|m| !m.trim().is_empty()),
            min_price: self.min_price,
            max_price: self.max_price,
        })
    }
}

/// Query parameters for `GET /auctions/{id}/eligibility`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EligibilityQuery {
    /// Account to check. Defaults to the acting account.
    pub account_id: Option<uuid::Uuid>,
}

/// Request body for `POST /auctions/{id}/bids`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceBidRequest {
    /// Offered amount; must exceed the current bid.
    pub amount: Decimal,
    /// `credit` or `cash`.
    pub bid_type: String,
    /// Reject with a retryable conflict unless the auction is still at this
    /// version.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl PlaceBidRequest {
    /// Builds the command for `bidder_id` on `auction_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an unknown bid type.
    pub fn into_command(
        self,
        auction_id: AuctionId,
        bidder_id: AccountId,
    ) -> Result<PlaceBidCommand, MarketError> {
        Ok(PlaceBidCommand {
            auction_id,
            bidder_id,
            amount: self.amount,
            bid_type: parse_text(&self.bid_type)?,
            expected_version: self.expected_version,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AuctionStatus, BidType};
    use rust_decimal_macros::dec;

    #[test]
    fn list_query_parses_status() {
        let query = AuctionListQuery {
            status: Some("live".to_string()),
            material_type: Some(" ".to_string()),
            ..AuctionListQuery::default()
        };
        let Ok(filter) = query.into_filter() else {
            panic!("expected filter");
        };
        assert_eq!(filter.status, Some(AuctionStatus::Live));
        assert!(filter.material_type.is_none());

        let bad = AuctionListQuery {
            status: Some("closing".to_string()),
            ..AuctionListQuery::default()
        };
        assert!(bad.into_filter().is_err());
    }

    #[test]
    fn bid_request_rejects_unknown_type() {
        let req = PlaceBidRequest {
            amount: dec!(10),
            bid_type: "voucher".to_string(),
            expected_version: None,
        };
        assert!(matches!(
            req.into_command(AuctionId::new(), AccountId::new()),
            Err(MarketError::InvalidArgument(_))
        ));

        let req = PlaceBidRequest {
            amount: dec!(10),
            bid_type: "credit".to_string(),
            expected_version: Some(3),
        };
        let Ok(cmd) = req.into_command(AuctionId::new(), AccountId::new()) else {
            panic!("expected command");
        };
        assert_eq!(cmd.bid_type, BidType::Credit);
        assert_eq!(cmd.expected_version, Some(3));
    }
}
