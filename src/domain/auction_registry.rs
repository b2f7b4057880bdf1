//! Concurrent auction storage with per-auction fine-grained locking.
//!
//! [`AuctionRegistry`] stores every auction in a `HashMap` where each entry
//! (the auction together with its bids) is individually protected by a
//! [`tokio::sync::RwLock`]. Holding an entry's write lock is what makes the
//! bid read-check-write sequence atomic.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{AccountId, Auction, AuctionId, AuctionStatus, Bid, BidStatus};
use crate::error::MarketError;

/// An auction together with every bid placed on it.
#[derive(Debug)]
pub struct AuctionEntry {
    /// The auction lot.
    pub auction: Auction,
    /// Bids in acceptance order (oldest first).
    pub bids: Vec<Bid>,
}

impl AuctionEntry {
    /// Wraps a freshly created auction with no bids.
    #[must_use]
    pub fn new(auction: Auction) -> Self {
        Self {
            auction,
            bids: Vec::new(),
        }
    }

    #[cfg(test)]
    fn active_bid(&self) -> Option<&Bid> {
        self.bids.iter().find(|b| b.status == BidStatus::Active)
    }

    /// Records an accepted bid.
    ///
    /// Every previously active bid becomes `Outbid`, the new bid is
    /// appended, and the auction's current bid, bid count and version are
    /// updated. Returns the bidders that were outbid. The caller must have
    /// validated the bid and must hold this entry's write lock.
    pub fn record_bid(&mut self, bid: Bid) -> Vec<AccountId> {
        let mut outbid = Vec::new();
        for previous in self.bids.iter_mut().filter(|b| b.status == BidStatus::Active) {
            previous.status = BidStatus::Outbid;
            outbid.push(previous.bidder_id);
        }
        self.auction.current_bid = bid.bid_amount;
        self.auction.bid_count = self.auction.bid_count.saturating_add(1);
        self.auction.touch();
        self.bids.push(bid);
        outbid
    }

    /// Returns the bids sorted newest first.
    #[must_use]
    pub fn bids_newest_first(&self) -> Vec<Bid> {
        let mut bids = self.bids.clone();
        bids.reverse();
        bids
    }
}

/// Filter for [`AuctionRegistry::list`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AuctionFilter {
    /// Exact lifecycle status.
    pub status: Option<AuctionStatus>,
    /// Material category, compared case-insensitively.
    pub material_type: Option<String>,
    /// Inclusive lower bound on the current bid.
    pub min_price: Option<Decimal>,
    /// Inclusive upper bound on the current bid.
    pub max_price: Option<Decimal>,
}

impl AuctionFilter {
    /// Returns `true` if `auction` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, auction: &Auction) -> bool {
        if let Some(status) = self.status
            && auction.status != status
        {
            return false;
        }
        if let Some(material) = &self.material_type
            && !auction.material_type.eq_ignore_ascii_case(material)
        {
            return false;
        }
        if let Some(min) = self.min_price
            && auction.current_bid < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && auction.current_bid > max
        {
            return false;
        }
        true
    }
}

/// Central store for all auctions.
///
/// Uses a `RwLock<HashMap<...>>` for the outer map and per-entry
/// `Arc<RwLock<AuctionEntry>>` for fine-grained per-auction locking.
///
/// # Concurrency
///
/// - Multiple tasks may read the same auction concurrently.
/// - Writes to different auctions are concurrent.
/// - Writes to the same auction are serialized.
#[derive(Debug)]
pub struct AuctionRegistry {
    auctions: RwLock<HashMap<AuctionId, Arc<RwLock<AuctionEntry>>>>,
}

impl AuctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            auctions: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new auction into the registry.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] if an auction with the same
    /// ID already exists.
    pub async fn insert(&self, auction: Auction) -> Result<AuctionId, MarketError> {
        let auction_id = auction.id;
        let mut map = self.auctions.write().await;
        if map.contains_key(&auction_id) {
            return Err(MarketError::InvalidArgument(format!(
                "auction {auction_id} already exists"
            )));
        }
        map.insert(auction_id, Arc::new(RwLock::new(AuctionEntry::new(auction))));
        Ok(auction_id)
    }

    /// Returns the auction entry behind its per-auction lock.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AuctionNotFound`] if no auction with the given
    /// ID exists.
    pub async fn get(
        &self,
        auction_id: AuctionId,
    ) -> Result<Arc<RwLock<AuctionEntry>>, MarketError> {
        let map = self.auctions.read().await;
        map.get(&auction_id)
            .cloned()
            .ok_or(MarketError::AuctionNotFound(auction_id))
    }

    /// Returns the auctions matching `filter`, sorted by start time
    /// descending.
    pub async fn list(&self, filter: &AuctionFilter) -> Vec<Auction> {
        let entries = self.entries().await;
        let mut auctions = Vec::with_capacity(entries.len());
        for entry_lock in entries {
            let entry = entry_lock.read().await;
            if filter.matches(&entry.auction) {
                auctions.push(entry.auction.clone());
            }
        }
        auctions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        auctions
    }

    /// Returns every bid placed by `bidder_id`, optionally filtered by
    /// status, sorted newest first.
    pub async fn bids_by_bidder(
        &self,
        bidder_id: AccountId,
        status: Option<BidStatus>,
    ) -> Vec<Bid> {
        let entries = self.entries().await;
        let mut bids = Vec::new();
        for entry_lock in entries {
            let entry = entry_lock.read().await;
            bids.extend(
                entry
                    .bids
                    .iter()
                    .filter(|b| b.bidder_id == bidder_id)
                    .filter(|b| status.is_none_or(|s| b.status == s))
                    .cloned(),
            );
        }
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bids
    }

    /// Returns the number of auctions in the registry.
    pub async fn len(&self) -> usize {
        self.auctions.read().await.len()
    }

    /// Returns `true` if the registry contains no auctions.
    pub async fn is_empty(&self) -> bool {
        self.auctions.read().await.is_empty()
    }

    /// Clones the entry handles so the outer map lock is not held while
    /// individual entries are awaited.
    async fn entries(&self) -> Vec<Arc<RwLock<AuctionEntry>>> {
        self.auctions.read().await.values().cloned().collect()
    }
}

impl Default for AuctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
