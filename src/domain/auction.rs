//! Auction lots and their lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AccountId, AuctionId, BidId};

/// Lifecycle status of an auction.
///
/// Transitions are one-directional: `Scheduled → Live → Completed`, with
/// `Cancelled` reachable from `Scheduled` or `Live`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    /// Created, not yet accepting bids.
    Scheduled,
    /// Accepting bids.
    Live,
    /// Closed and settled.
    Completed,
    /// Withdrawn before completion.
    Cancelled,
}

impl AuctionStatus {
    /// Returns `true` if moving from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Live)
                | (Self::Live, Self::Completed)
                | (Self::Scheduled | Self::Live, Self::Cancelled)
        )
    }

    /// Returns `true` for `Completed` and `Cancelled`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sellable lot of material.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Auction {
    /// Auction identifier.
    pub id: AuctionId,
    /// Short human-readable title.
    pub title: String,
    /// Material category (e.g. `"plastic"`, `"e-waste"`).
    pub material_type: String,
    /// Lot size.
    pub quantity: Decimal,
    /// Unit of `quantity` (e.g. `"kg"`).
    pub unit: String,
    /// Opening price.
    pub starting_bid: Decimal,
    /// Highest accepted bid so far; equals `starting_bid` before any bid.
    pub current_bid: Decimal,
    /// Credit balance a bidder must hold to participate.
    pub minimum_credit_required: Decimal,
    /// Cash balance a bidder must hold to participate.
    pub minimum_cash_required: Decimal,
    /// Lifecycle status.
    pub status: AuctionStatus,
    /// Scheduled opening time.
    pub start_time: DateTime<Utc>,
    /// Scheduled closing time.
    pub end_time: DateTime<Utc>,
    /// Winning account, set only at completion.
    pub winner_id: Option<AccountId>,
    /// Winning bid, set only at completion.
    pub winning_bid_id: Option<BidId>,
    /// Number of accepted bids.
    pub bid_count: u32,
    /// Incremented on every mutation; used for optimistic bid submission.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
}

/// Validated parameters for a new auction.
#[derive(Debug, Clone)]
pub struct NewAuction {
    /// Short human-readable title.
    pub title: String,
    /// Material category.
    pub material_type: String,
    /// Lot size.
    pub quantity: Decimal,
    /// Unit of `quantity`.
    pub unit: String,
    /// Opening price.
    pub starting_bid: Decimal,
    /// Credit threshold for bidders.
    pub minimum_credit_required: Decimal,
    /// Cash threshold for bidders.
    pub minimum_cash_required: Decimal,
    /// Scheduled opening time.
    pub start_time: DateTime<Utc>,
    /// Scheduled closing time.
    pub end_time: DateTime<Utc>,
}

impl Auction {
    /// Creates a scheduled auction whose current bid equals the starting bid.
    #[must_use]
    pub fn new(params: NewAuction) -> Self {
        let now = Utc::now();
        Self {
            id: AuctionId::new(),
            title: params.title,
            material_type: params.material_type,
            quantity: params.quantity,
            unit: params.unit,
            starting_bid: params.starting_bid,
            current_bid: params.starting_bid,
            minimum_credit_required: params.minimum_credit_required,
            minimum_cash_required: params.minimum_cash_required,
            status: AuctionStatus::Scheduled,
            start_time: params.start_time,
            end_time: params.end_time,
            winner_id: None,
            winning_bid_id: None,
            bid_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the auction to `next`, returning the previous status.
    ///
    /// Returns `None` (and leaves the auction untouched) when the
    /// transition is not allowed.
    pub fn transition(&mut self, next: AuctionStatus) -> Option<AuctionStatus> {
        if !self.status.can_transition_to(next) {
            return None;
        }
        let previous = self.status;
        self.status = next;
        self.touch();
        Some(previous)
    }

    /// Records a mutation: bumps the version and the update timestamp.
    pub fn touch(&mut self) {
        self.version = self.version.saturating_add(1);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Auction {
        let now = Utc::now();
        Auction::new(NewAuction {
            title: "PET bales".to_string(),
            material_type: "plastic".to_string(),
            quantity: Decimal::new(500, 0),
            unit: "kg".to_string(),
            starting_bid: Decimal::new(100, 0),
            minimum_credit_required: Decimal::new(50, 0),
            minimum_cash_required: Decimal::ZERO,
            start_time: now,
            end_time: now + Duration::hours(2),
        })
    }

    #[test]
    fn new_auction_starts_scheduled_at_starting_bid() {
        let auction = sample();
        assert_eq!(auction.status, AuctionStatus::Scheduled);
        assert_eq!(auction.current_bid, auction.starting_bid);
        assert!(auction.winner_id.is_none());
        assert_eq!(auction.version, 0);
    }

    #[test]
    fn forward_transitions_are_allowed() {
        let mut auction = sample();
        assert_eq!(
            auction.transition(AuctionStatus::Live),
            Some(AuctionStatus::Scheduled)
        );
        assert_eq!(
            auction.transition(AuctionStatus::Completed),
            Some(AuctionStatus::Live)
        );
        assert_eq!(auction.version, 2);
    }

    #[test]
    fn backward_and_terminal_transitions_are_rejected() {
        let mut auction = sample();
        assert!(auction.transition(AuctionStatus::Completed).is_none());
        assert!(auction.transition(AuctionStatus::Cancelled).is_some());
        assert!(auction.transition(AuctionStatus::Live).is_none());
        assert!(auction.transition(AuctionStatus::Scheduled).is_none());
        assert_eq!(auction.status, AuctionStatus::Cancelled);
    }

    #[test]
    fn cancel_allowed_from_live() {
        assert!(AuctionStatus::Live.can_transition_to(AuctionStatus::Cancelled));
        assert!(!AuctionStatus::Completed.can_transition_to(AuctionStatus::Cancelled));
        assert!(AuctionStatus::Cancelled.is_terminal());
    }
}
