//! Domain events reflecting marketplace state mutations.
//!
//! Every state change emits a [`MarketEvent`] through the
//! [`super::EventBus`]. Events are consumed in-process (notifications, the
//! optional PostgreSQL event log).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{
    AccountId, AuctionId, AuctionStatus, BidId, BidType, CashAdjustment, CreditTransaction,
    PaymentMethod, RedemptionId, RedemptionStatus, TransactionId, TransactionType,
};

/// Category of a participant-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A higher bid superseded the recipient's bid.
    Outbid,
    /// The recipient won an auction.
    AuctionWon,
    /// The recipient's bid did not win.
    AuctionLost,
    /// An auction the recipient bid on was cancelled.
    AuctionCancelled,
    /// Credits were added to the recipient's balance.
    CreditsReceived,
    /// A redemption request changed status.
    RedemptionUpdate,
}

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// Emitted when an auction is created.
    AuctionCreated {
        /// Auction identifier.
        auction_id: AuctionId,
        /// Material category.
        material_type: String,
        /// Opening price.
        starting_bid: Decimal,
        /// Scheduled opening time.
        start_time: DateTime<Utc>,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an auction changes lifecycle status.
    AuctionStatusChanged {
        /// Auction identifier.
        auction_id: AuctionId,
        /// Status before the change.
        from: AuctionStatus,
        /// Status after the change.
        to: AuctionStatus,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a bid is accepted.
    BidPlaced {
        /// Auction identifier.
        auction_id: AuctionId,
        /// New bid identifier.
        bid_id: BidId,
        /// Bidding account.
        bidder_id: AccountId,
        /// Accepted amount (new current bid).
        amount: Decimal,
        /// Balance the bid is declared against.
        bid_type: BidType,
        /// Current bid before this one.
        previous_bid: Decimal,
        /// Acceptance timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a live auction is closed.
    AuctionSettled {
        /// Auction identifier.
        auction_id: AuctionId,
        /// Winning account, if any bidder could pay.
        winner_id: Option<AccountId>,
        /// Winning bid, if any.
        winning_bid_id: Option<BidId>,
        /// Amount debited from the winner.
        amount: Option<Decimal>,
        /// Settlement timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a credit ledger entry is appended.
    CreditsApplied {
        /// Account whose balance changed.
        account_id: AccountId,
        /// Ledger entry identifier.
        transaction_id: TransactionId,
        /// Kind of movement.
        kind: TransactionType,
        /// Signed amount.
        amount: Decimal,
        /// Credit balance after the entry.
        balance_after: Decimal,
        /// Entry timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a cash ledger entry is appended.
    CashAdjusted {
        /// Account whose balance changed.
        account_id: AccountId,
        /// Ledger entry identifier.
        transaction_id: TransactionId,
        /// Signed amount.
        amount: Decimal,
        /// Cash balance after the entry.
        balance_after: Decimal,
        /// Entry timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a redemption request is created.
    RedemptionRequested {
        /// Redemption identifier.
        redemption_id: RedemptionId,
        /// Requesting account.
        account_id: AccountId,
        /// Credits debited.
        credits: Decimal,
        /// Requested payout channel.
        payment_method: PaymentMethod,
        /// Request timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an administrator advances a redemption.
    RedemptionStatusChanged {
        /// Redemption identifier.
        redemption_id: RedemptionId,
        /// Requesting account.
        account_id: AccountId,
        /// Status before the change.
        from: RedemptionStatus,
        /// Status after the change.
        to: RedemptionStatus,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Best-effort participant notification.
    Notification {
        /// Recipient.
        account_id: AccountId,
        /// Notification category.
        kind: NotificationKind,
        /// Short title.
        title: String,
        /// Message body.
        message: String,
        /// Emission timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl MarketEvent {
    /// Returns the identifier of the entity the event is about.
    #[must_use]
    pub fn subject_id(&self) -> uuid::Uuid {
        match self {
            Self::AuctionCreated { auction_id, .. }
            | Self::AuctionStatusChanged { auction_id, .. }
            | Self::BidPlaced { auction_id, .. }
            | Self::AuctionSettled { auction_id, .. } => *auction_id.as_uuid(),
            Self::CreditsApplied { account_id, .. }
            | Self::CashAdjusted { account_id, .. }
            | Self::Notification { account_id, .. } => *account_id.as_uuid(),
            Self::RedemptionRequested { redemption_id, .. }
            | Self::RedemptionStatusChanged { redemption_id, .. } => *redemption_id.as_uuid(),
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::AuctionCreated { .. } => "auction_created",
            Self::AuctionStatusChanged { .. } => "auction_status_changed",
            Self::BidPlaced { .. } => "bid_placed",
            Self::AuctionSettled { .. } => "auction_settled",
            Self::CreditsApplied { .. } => "credits_applied",
            Self::CashAdjusted { .. } => "cash_adjusted",
            Self::RedemptionRequested { .. } => "redemption_requested",
            Self::RedemptionStatusChanged { .. } => "redemption_status_changed",
            Self::Notification { .. } => "notification",
        }
    }
}

impl From<&CreditTransaction> for MarketEvent {
    fn from(tx: &CreditTransaction) -> Self {
        Self::CreditsApplied {
            account_id: tx.account_id,
            transaction_id: tx.id,
            kind: tx.kind,
            amount: tx.amount,
            balance_after: tx.balance_after,
            timestamp: tx.created_at,
        }
    }
}

impl From<&CashAdjustment> for MarketEvent {
    fn from(adj: &CashAdjustment) -> Self {
        Self::CashAdjusted {
            account_id: adj.account_id,
            transaction_id: adj.id,
            amount: adj.amount,
            balance_after: adj.balance_after,
            timestamp: adj.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bid_placed_serializes_with_tag() {
        let event = MarketEvent::BidPlaced {
            auction_id: AuctionId::new(),
            bid_id: BidId::new(),
            bidder_id: AccountId::new(),
            amount: Decimal::new(150, 0),
            bid_type: BidType::Credit,
            previous_bid: Decimal::new(100, 0),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"bid_placed\""));
        assert!(json.contains("\"amount\":\"150\""));
    }

    #[test]
    fn subject_follows_entity() {
        let account_id = AccountId::new();
        let event = MarketEvent::Notification {
            account_id,
            kind: NotificationKind::Outbid,
            title: "Outbid".to_string(),
            message: "x".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.subject_id(), *account_id.as_uuid());
        assert_eq!(event.event_type_str(), "notification");
    }
}
