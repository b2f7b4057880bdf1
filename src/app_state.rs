//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{AuctionRegistry, BusNotifier, EventBus, Ledger, Notifier, RedemptionBook};
use crate::service::{AccountService, AuctionService, RedemptionService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Bid engine, auction lifecycle and settlement.
    pub auction_service: Arc<AuctionService>,
    /// Accounts and the balance ledger.
    pub account_service: Arc<AccountService>,
    /// Credit redemptions.
    pub redemption_service: Arc<RedemptionService>,
    /// Event bus for in-process subscribers.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires empty stores, the event bus and the bus-backed notifier into
    /// the three services.
    #[must_use]
    pub fn new(event_bus_capacity: usize) -> Self {
        let event_bus = EventBus::new(event_bus_capacity);
        let notifier: Arc<dyn Notifier> = Arc::new(BusNotifier::new(event_bus.clone()));
        let ledger = Arc::new(Ledger::new());

        let auction_service = Arc::new(AuctionService::new(
            Arc::new(AuctionRegistry::new()),
            Arc::clone(&ledger),
            event_bus.clone(),
            Arc::clone(&notifier),
        ));
        let account_service = Arc::new(AccountService::new(
            Arc::clone(&ledger),
            event_bus.clone(),
            Arc::clone(&notifier),
        ));
        let redemption_service = Arc::new(RedemptionService::new(
            ledger,
            Arc::new(RedemptionBook::new()),
            event_bus.clone(),
            notifier,
        ));

        Self {
            auction_service,
            account_service,
            redemption_service,
            event_bus,
        }
    }
}
