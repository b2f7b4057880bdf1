//! Database models for the event log.

use uuid::Uuid;

use crate::domain::MarketEvent;
use crate::error::MarketError;

/// Column values for inserting `event` into `market_events`.
#[derive(Debug, Clone)]
pub struct NewEventRow {
    /// Auction, account or redemption the event is about.
    pub subject_id: Uuid,
    /// Event type discriminator.
    pub event_type: &'static str,
    /// Serialized event.
    pub payload: serde_json::Value,
}

impl TryFrom<&MarketEvent> for NewEventRow {
    type Error = MarketError;

    fn try_from(event: &MarketEvent) -> Result<Self, Self::Error> {
        let payload = serde_json::to_value(event)
            .map_err(|e| MarketError::PersistenceError(format!("event serialization: {e}")))?;
        Ok(Self {
            subject_id: event.subject_id(),
            event_type: event.event_type_str(),
            payload,
        })
    }
}
