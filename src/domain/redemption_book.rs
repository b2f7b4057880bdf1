//! Storage for credit redemption requests.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{AccountId, CreditRedemption, RedemptionId, RedemptionStatus};
use crate::error::MarketError;

/// In-memory store of every [`CreditRedemption`].
///
/// Status changes go through [`RedemptionBook::update`], which runs the
/// caller's closure under the map's write lock so a redemption can never be
/// finalized twice.
#[derive(Debug, Default)]
pub struct RedemptionBook {
    redemptions: RwLock<HashMap<RedemptionId, CreditRedemption>>,
}

impl RedemptionBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new redemption.
    ///
    /// Cannot fail, so callers may debit credits first and record the
    /// redemption afterwards under the same account lock. The ID must be
    /// fresh from [`RedemptionId::new`].
    pub async fn insert(&self, redemption: CreditRedemption) {
        self.redemptions
            .write()
            .await
            .insert(redemption.id, redemption);
    }

    /// Returns a copy of the redemption.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::RedemptionNotFound`] if it does not exist.
    pub async fn get(&self, id: RedemptionId) -> Result<CreditRedemption, MarketError> {
        self.redemptions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(MarketError::RedemptionNotFound(id))
    }

    /// Applies `f` to the stored redemption while holding the write lock.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::RedemptionNotFound`] if it does not exist, or
    /// whatever `f` returns.
    pub async fn update<T, F>(&self, id: RedemptionId, f: F) -> Result<T, MarketError>
    where
        F: FnOnce(&mut CreditRedemption) -> Result<T, MarketError>,
    {
        let mut map = self.redemptions.write().await;
        let redemption = map
            .get_mut(&id)
            .ok_or(MarketError::RedemptionNotFound(id))?;
        f(redemption)
    }

    /// Returns the account's redemptions, optionally filtered by status,
    /// newest first.
    pub async fn list_for_account(
        &self,
        account_id: AccountId,
        status: Option<RedemptionStatus>,
    ) -> Vec<CreditRedemption> {
        let map = self.redemptions.read().await;
        let mut list: Vec<CreditRedemption> = map
            .values()
            .filter(|r| r.account_id == account_id)
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }
}
