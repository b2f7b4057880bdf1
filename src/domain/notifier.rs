//! Outbound participant notifications.
//!
//! Delivery is owned outside this service. [`Notifier`] is the seam; the
//! default [`BusNotifier`] turns each call into a
//! [`MarketEvent::Notification`] on the [`EventBus`]. Notifying never blocks
//! and never fails the operation that triggered it.

use std::fmt::Debug;

use chrono::Utc;

use super::market_event::NotificationKind;
use super::{AccountId, EventBus, MarketEvent};

/// Fire-and-forget notification sink.
pub trait Notifier: Debug + Send + Sync {
    /// Queues a notification for `account_id`.
    fn notify(&self, account_id: AccountId, kind: NotificationKind, title: &str, message: &str);
}

/// [`Notifier`] publishing notifications onto the [`EventBus`].
#[derive(Debug, Clone)]
pub struct BusNotifier {
    event_bus: EventBus,
}

impl BusNotifier {
    /// Creates a notifier backed by `event_bus`.
    #[must_use]
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

impl Notifier for BusNotifier {
    fn notify(&self, account_id: AccountId, kind: NotificationKind, title: &str, message: &str) {
        let delivered = self.event_bus.publish(MarketEvent::Notification {
            account_id,
            kind,
            title: title.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        });
        tracing::debug!(%account_id, ?kind, delivered, "notification queued");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notification_reaches_bus_subscribers() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let notifier = BusNotifier::new(bus);
        let account_id = AccountId::new();

        notifier.notify(account_id, NotificationKind::Outbid, "Outbid", "new high bid 150");

        let Ok(MarketEvent::Notification { account_id: to, kind, .. }) = rx.recv().await else {
            panic!("expected notification event");
        };
        assert_eq!(to, account_id);
        assert_eq!(kind, NotificationKind::Outbid);
    }

    #[test]
    fn notifying_without_subscribers_is_silent() {
        let notifier = BusNotifier::new(EventBus::new(4));
        notifier.notify(AccountId::new(), NotificationKind::AuctionWon, "Won", "lot 1");
    }
}
