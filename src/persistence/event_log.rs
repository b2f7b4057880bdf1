//! Background writer appending every bus event to PostgreSQL.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::postgres::PostgresPersistence;
use crate::domain::MarketEvent;

/// Spawns a task that drains `events` into the event log until the bus
/// closes.
///
/// Write failures are logged and the event is dropped; the in-memory
/// state stays authoritative. A lagging receiver logs how many events were
/// skipped and keeps going.
pub fn spawn_event_log(
    persistence: PostgresPersistence,
    mut events: broadcast::Receiver<MarketEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(err) = persistence.save_event(&event).await {
                        tracing::warn!(
                            event_type = event.event_type_str(),
                            subject_id = %event.subject_id(),
                            error = %err,
                            "failed to persist event"
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event log lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::info!("event log writer stopped");
    })
}

/// Spawns a task pruning events older than `after_days` once a day.
pub fn spawn_cleanup(persistence: PostgresPersistence, after_days: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
        loop {
            ticker.tick().await;
            match persistence.delete_old_events(after_days).await {
                Ok(deleted) => tracing::info!(deleted, after_days, "pruned old events"),
                Err(err) => tracing::warn!(error = %err, "event pruning failed"),
            }
        }
    })
}
