//! Domain layer: core types, stores and the event system.
//!
//! This module contains the marketplace domain model: identifiers,
//! accounts, auctions, bids, ledger entries and redemptions; the
//! concurrent stores that own them ([`AuctionRegistry`], [`Ledger`],
//! [`RedemptionBook`]); the pure [`check_eligibility`] rule; and the event
//! bus used to broadcast state changes.

pub mod account;
pub mod auction;
pub mod auction_registry;
pub mod bid;
pub mod eligibility;
pub mod event_bus;
pub mod ids;
pub mod ledger;
pub mod ledger_entry;
pub mod market_event;
pub mod notifier;
pub mod redemption;
pub mod redemption_book;

pub use account::{Account, AccountRole, Balance};
pub use auction::{Auction, AuctionStatus, NewAuction};
pub use auction_registry::{AuctionEntry, AuctionFilter, AuctionRegistry};
pub use bid::{Bid, BidStatus, BidType};
pub use eligibility::{Eligibility, check_eligibility};
pub use event_bus::EventBus;
pub use ids::{AccountId, AuctionId, BidId, RedemptionId, TransactionId};
pub use ledger::{AccountBook, HistoryQuery, Ledger, LedgerSummary, TransactionPage, TypeTotal};
pub use ledger_entry::{
    CashAdjustment, CreditTransaction, ReferenceType, TransactionReference, TransactionType,
};
pub use market_event::{MarketEvent, NotificationKind};
pub use notifier::{BusNotifier, Notifier};
pub use redemption::{CreditRedemption, PaymentMethod, RedemptionStatus};
pub use redemption_book::RedemptionBook;
