//! # waste-market-gateway
//!
//! REST gateway for the auction side of a waste-management marketplace.
//!
//! Companies bid on lots of recovered material, paying with platform credits
//! or cash. Each participant holds a credit and a cash balance backed by an
//! append-only ledger; credits earned at collection hubs can be redeemed for
//! a cash payout that operators process.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, X-Account-Id)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── AuctionService / AccountService / RedemptionService (service/)
//!     ├── EventBus + Notifier (domain/)
//!     │
//!     ├── AuctionRegistry, Ledger, RedemptionBook (domain/)
//!     │
//!     └── PostgreSQL event log (persistence/, optional)
//! ```
//!
//! Bids are serialized per auction and balance changes per account, so a
//! bid is only ever compared against the latest current bid and a balance
//! can never go negative.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
