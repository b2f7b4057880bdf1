//! Individual offers on an auction.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AccountId, AuctionId, BidId};

/// Balance a bid is declared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BidType {
    /// Paid from the credit balance at settlement.
    Credit,
    /// Paid from the cash balance at settlement.
    Cash,
}

impl BidType {
    /// Returns the bid type as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Cash => "cash",
        }
    }
}

impl FromStr for BidType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Self::Credit),
            "cash" => Ok(Self::Cash),
            other => Err(format!("unknown bid type: {other}")),
        }
    }
}

/// Status of a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    /// Currently the highest bid on a live auction.
    Active,
    /// Superseded by a higher bid.
    Outbid,
    /// Settled as the winning bid.
    Won,
    /// Not selected at settlement or cancellation.
    Lost,
}

impl BidStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Outbid => "outbid",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted offer. Only `status` changes after creation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Bid {
    /// Bid identifier.
    pub id: BidId,
    /// Auction the bid belongs to.
    pub auction_id: AuctionId,
    /// Bidding account.
    pub bidder_id: AccountId,
    /// Offered amount.
    pub bid_amount: Decimal,
    /// Balance the bid is declared against.
    pub bid_type: BidType,
    /// Current status.
    pub status: BidStatus,
    /// Acceptance timestamp.
    pub created_at: DateTime<Utc>,
}

impl Bid {
    /// Creates a new active bid.
    #[must_use]
    pub fn new(
        auction_id: AuctionId,
        bidder_id: AccountId,
        bid_amount: Decimal,
        bid_type: BidType,
    ) -> Self {
        Self {
            id: BidId::new(),
            auction_id,
            bidder_id,
            bid_amount,
            bid_type,
            status: BidStatus::Active,
            created_at: Utc::now(),
        }
    }
}
