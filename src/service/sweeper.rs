//! Periodic auction lifecycle sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::auction_service::AuctionService;

/// Spawns a task running [`AuctionService::sweep`] every `interval`.
///
/// Missed ticks are skipped rather than replayed in a burst.
pub fn spawn_sweeper(service: Arc<AuctionService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            service.sweep(Utc::now()).await;
        }
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use crate::domain::AuctionStatus;
    use crate::service::CreateAuctionCommand;
    use chrono::Duration as TimeDelta;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn sweeper_starts_due_auctions() {
        let state = AppState::new(64);
        let now = Utc::now();
        let Ok(auction) = state
            .auction_service
            .create_auction(CreateAuctionCommand {
                title: "PET bales".to_string(),
                material_type: "plastic".to_string(),
                quantity: dec!(500),
                unit: "kg".to_string(),
                starting_bid: dec!(100),
                minimum_credit_required: dec!(0),
                minimum_cash_required: dec!(0),
                start_time: now - TimeDelta::minutes(1),
                end_time: now + TimeDelta::hours(1),
            })
            .await
        else {
            panic!("expected auction");
        };

        let handle = spawn_sweeper(
            Arc::clone(&state.auction_service),
            Duration::from_millis(10),
        );
        let mut live = false;
        for _ in 0..50 {
            let status = state
                .auction_service
                .get_auction(auction.id)
                .await
                .map(|detail| detail.auction.status);
            if matches!(status, Ok(AuctionStatus::Live)) {
                live = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert!(live);
    }
}
