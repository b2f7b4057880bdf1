//! Service layer: business logic orchestration.
//!
//! [`AuctionService`] runs the bid engine, auction lifecycle and
//! settlement; [`AccountService`] fronts the balance ledger;
//! [`RedemptionService`] handles credit redemptions. All three emit events
//! through the [`super::domain::EventBus`] and notify participants through
//! a [`super::domain::Notifier`].

pub mod account_service;
pub mod auction_service;
pub mod commands;
pub mod redemption_service;
pub mod sweeper;

pub use account_service::AccountService;
pub use auction_service::{AuctionDetail, AuctionService, Settlement, SweepReport};
pub use commands::{
    AddCreditsCommand, AdjustCashCommand, AdvanceRedemptionCommand, CreateAuctionCommand,
    OpenAccountCommand, PlaceBidCommand, RedeemCommand,
};
pub use redemption_service::{RedemptionService, RedemptionUpdate};
pub use sweeper::spawn_sweeper;
