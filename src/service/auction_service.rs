//! Auction service: bid engine, lifecycle administration and settlement.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::commands::{CreateAuctionCommand, PlaceBidCommand};
use crate::domain::{
    AccountId, Auction, AuctionFilter, AuctionId, AuctionRegistry, AuctionStatus, Bid, BidStatus,
    BidType, CashAdjustment, CreditTransaction, Eligibility, EventBus, Ledger, MarketEvent,
    NotificationKind, Notifier, ReferenceType, TransactionReference, TransactionType,
    check_eligibility,
};
use crate::error::MarketError;

/// An auction together with its bids, newest first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuctionDetail {
    /// The auction lot.
    pub auction: Auction,
    /// Bids sorted by creation time descending.
    pub bids: Vec<Bid>,
}

/// Outcome of closing a live auction.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Settlement {
    /// The completed auction.
    pub auction: Auction,
    /// The bid that won, if any bidder could pay.
    pub winning_bid: Option<Bid>,
    /// Ledger entry debiting a credit winner.
    pub credit_transaction: Option<CreditTransaction>,
    /// Ledger entry debiting a cash winner.
    pub cash_adjustment: Option<CashAdjustment>,
}

/// Auctions moved by one [`AuctionService::sweep`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Scheduled auctions that went live.
    pub started: Vec<AuctionId>,
    /// Live auctions that were closed and settled.
    pub closed: Vec<AuctionId>,
}

impl SweepReport {
    /// Returns `true` when the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.closed.is_empty()
    }
}

#[derive(Debug)]
enum Payment {
    Credit(CreditTransaction),
    Cash(CashAdjustment),
}

/// Orchestration layer for auctions and bids.
///
/// Every mutation follows the same pattern: acquire the auction's write
/// lock, check, mutate, release, then emit events and notifications. When
/// settlement debits a winner the account lock is taken while the auction
/// lock is held, never the other way round.
#[derive(Debug, Clone)]
pub struct AuctionService {
    registry: Arc<AuctionRegistry>,
    ledger: Arc<Ledger>,
    event_bus: EventBus,
    notifier: Arc<dyn Notifier>,
}

impl AuctionService {
    /// Creates a new `AuctionService`.
    #[must_use]
    pub fn new(
        registry: Arc<AuctionRegistry>,
        ledger: Arc<Ledger>,
        event_bus: EventBus,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            ledger,
            event_bus,
            notifier,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`AuctionRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<AuctionRegistry> {
        &self.registry
    }

    /// Creates a scheduled auction.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] if the command is invalid.
    pub async fn create_auction(
        &self,
        command: CreateAuctionCommand,
    ) -> Result<Auction, MarketError> {
        let auction = Auction::new(command.validate()?);
        self.registry.insert(auction.clone()).await?;

        let _ = self.event_bus.publish(MarketEvent::AuctionCreated {
            auction_id: auction.id,
            material_type: auction.material_type.clone(),
            starting_bid: auction.starting_bid,
            start_time: auction.start_time,
            timestamp: auction.created_at,
        });

        tracing::info!(
            auction_id = %auction.id,
            material_type = %auction.material_type,
            starting_bid = %auction.starting_bid,
            "auction created"
        );
        Ok(auction)
    }

    /// Opens a scheduled auction for bidding.
    ///
    /// # Errors
    ///
    /// - [`MarketError::AuctionNotFound`] if the auction does not exist.
    /// - [`MarketError::InvalidState`] unless the auction is scheduled.
    pub async fn start_auction(&self, auction_id: AuctionId) -> Result<Auction, MarketError> {
        let entry_lock = self.registry.get(auction_id).await?;
        let mut entry = entry_lock.write().await;
        let from = transition(&mut entry.auction, AuctionStatus::Live)?;
        let auction = entry.auction.clone();
        drop(entry);

        self.publish_status_change(auction_id, from, AuctionStatus::Live);
        tracing::info!(%auction_id, "auction started");
        Ok(auction)
    }

    /// Cancels a scheduled or live auction. Every open bid becomes lost.
    ///
    /// # Errors
    ///
    /// - [`MarketError::AuctionNotFound`] if the auction does not exist.
    /// - [`MarketError::InvalidState`] if the auction already ended.
    pub async fn cancel_auction(&self, auction_id: AuctionId) -> Result<Auction, MarketError> {
        let entry_lock = self.registry.get(auction_id).await?;
        let mut entry = entry_lock.write().await;
        let from = transition(&mut entry.auction, AuctionStatus::Cancelled)?;

        let mut bidders = Vec::new();
        for bid in entry
            .bids
            .iter_mut()
            .filter(|b| matches!(b.status, BidStatus::Active | BidStatus::Outbid))
        {
            bid.status = BidStatus::Lost;
            bidders.push(bid.bidder_id);
        }
        let auction = entry.auction.clone();
        drop(entry);

        self.publish_status_change(auction_id, from, AuctionStatus::Cancelled);
        let message = format!("Auction \"{}\" was cancelled", auction.title);
        for bidder in distinct(bidders) {
            self.notifier.notify(
                bidder,
                NotificationKind::AuctionCancelled,
                "Auction cancelled",
                &message,
            );
        }

        tracing::info!(%auction_id, from = %from, "auction cancelled");
        Ok(auction)
    }

    /// Closes a live auction and settles it.
    ///
    /// Bids are tried from the highest amount down. The first bidder that
    /// still holds the declared balance is debited and wins; every other
    /// bid is lost. When nobody can pay, the auction completes without a
    /// winner.
    ///
    /// # Errors
    ///
    /// - [`MarketError::AuctionNotFound`] if the auction does not exist.
    /// - [`MarketError::InvalidState`] unless the auction is live.
    pub async fn close_auction(&self, auction_id: AuctionId) -> Result<Settlement, MarketError> {
        let entry_lock = self.registry.get(auction_id).await?;
        let mut entry = entry_lock.write().await;
        if !entry.auction.status.can_transition_to(AuctionStatus::Completed) {
            return Err(invalid_transition(&entry.auction, AuctionStatus::Completed));
        }

        let mut candidates: Vec<(usize, AccountId, Decimal, BidType)> = entry
            .bids
            .iter()
            .enumerate()
            .map(|(index, b)| (index, b.bidder_id, b.bid_amount, b.bid_type))
            .collect();
        candidates.sort_by(|a, b| b.2.cmp(&a.2));

        let mut winner: Option<(usize, Payment)> = None;
        for (index, bidder_id, amount, bid_type) in candidates {
            match self.collect_payment(auction_id, bidder_id, amount, bid_type).await {
                Ok(payment) => {
                    winner = Some((index, payment));
                    break;
                }
                Err(err @ (MarketError::InsufficientFunds(_) | MarketError::AccountNotFound(_))) => {
                    tracing::warn!(
                        %auction_id,
                        %bidder_id,
                        %amount,
                        error = %err,
                        "settlement candidate skipped"
                    );
                }
                Err(other) => return Err(other),
            }
        }

        let from = transition(&mut entry.auction, AuctionStatus::Completed)?;
        let winning_index = winner.as_ref().map(|(index, _)| *index);
        for (index, bid) in entry.bids.iter_mut().enumerate() {
            bid.status = if Some(index) == winning_index {
                BidStatus::Won
            } else {
                BidStatus::Lost
            };
        }
        let winning_bid = winning_index.and_then(|i| entry.bids.get(i)).cloned();
        entry.auction.winner_id = winning_bid.as_ref().map(|b| b.bidder_id);
        entry.auction.winning_bid_id = winning_bid.as_ref().map(|b| b.id);
        let auction = entry.auction.clone();
        let losers: Vec<AccountId> = distinct(entry.bids.iter().map(|b| b.bidder_id))
            .into_iter()
            .filter(|id| Some(*id) != auction.winner_id)
            .collect();
        drop(entry);

        let (credit_transaction, cash_adjustment) = match winner.map(|(_, payment)| payment) {
            Some(Payment::Credit(tx)) => {
                let _ = self.event_bus.publish(MarketEvent::from(&tx));
                (Some(tx), None)
            }
            Some(Payment::Cash(adj)) => {
                let _ = self.event_bus.publish(MarketEvent::from(&adj));
                (None, Some(adj))
            }
            None => (None, None),
        };
        self.publish_status_change(auction_id, from, AuctionStatus::Completed);
        let _ = self.event_bus.publish(MarketEvent::AuctionSettled {
            auction_id,
            winner_id: auction.winner_id,
            winning_bid_id: auction.winning_bid_id,
            amount: winning_bid.as_ref().map(|b| b.bid_amount),
            timestamp: Utc::now(),
        });

        if let Some(bid) = &winning_bid {
            self.notifier.notify(
                bid.bidder_id,
                NotificationKind::AuctionWon,
                "Auction won",
                &format!("You won \"{}\" for {}", auction.title, bid.bid_amount),
            );
        }
        let lost_message = format!("Your bid on \"{}\" did not win", auction.title);
        for bidder in losers {
            self.notifier.notify(
                bidder,
                NotificationKind::AuctionLost,
                "Auction closed",
                &lost_message,
            );
        }

        tracing::info!(
            %auction_id,
            winner_id = ?auction.winner_id,
            amount = ?winning_bid.as_ref().map(|b| b.bid_amount),
            "auction settled"
        );
        Ok(Settlement {
            auction,
            winning_bid,
            credit_transaction,
            cash_adjustment,
        })
    }

    /// Places a bid on a live auction.
    ///
    /// Checks run in a fixed order and the first failure wins; nothing is
    /// mutated unless every check passes. No funds are debited.
    ///
    /// # Errors
    ///
    /// In check order:
    /// - [`MarketError::InvalidArgument`] for a non-positive amount.
    /// - [`MarketError::AuctionNotFound`] if the auction does not exist.
    /// - [`MarketError::InvalidState`] unless the auction is live and its
    ///   end time has not passed.
    /// - [`MarketError::Conflict`] if `expected_version` is stale.
    /// - [`MarketError::AccountNotFound`] if the bidder does not exist.
    /// - [`MarketError::NotEligible`] if a balance threshold is not met.
    /// - [`MarketError::InvalidArgument`] unless the amount exceeds the
    ///   current bid.
    /// - [`MarketError::InsufficientFunds`] if the declared balance is below
    ///   the amount.
    pub async fn place_bid(&self, command: PlaceBidCommand) -> Result<Bid, MarketError> {
        command.validate()?;
        let auction_id = command.auction_id;
        let bidder_id = command.bidder_id;

        let entry_lock = self.registry.get(auction_id).await?;
        let mut entry = entry_lock.write().await;

        if entry.auction.status != AuctionStatus::Live {
            return Err(MarketError::InvalidState(format!(
                "auction not live, current status: {}",
                entry.auction.status
            )));
        }
        // The sweeper closes expired auctions on its own schedule.
        if Utc::now() >= entry.auction.end_time {
            return Err(MarketError::InvalidState(format!(
                "auction ended at {}",
                entry.auction.end_time
            )));
        }
        if let Some(expected) = command.expected_version
            && expected != entry.auction.version
        {
            return Err(MarketError::Conflict(format!(
                "auction {auction_id} is at version {}, expected {expected}",
                entry.auction.version
            )));
        }

        let balance = self.ledger.balance(bidder_id).await?;
        let eligibility = check_eligibility(&balance, &entry.auction);
        if !eligibility.eligible {
            return Err(MarketError::NotEligible {
                reasons: eligibility.reasons,
            });
        }
        if command.amount <= entry.auction.current_bid {
            return Err(MarketError::InvalidArgument(format!(
                "bid must exceed current bid of {}",
                entry.auction.current_bid
            )));
        }
        let available = match command.bid_type {
            BidType::Credit => balance.credit_balance,
            BidType::Cash => balance.cash_balance,
        };
        if available < command.amount {
            return Err(MarketError::InsufficientFunds(format!(
                "{} balance {available} is below bid amount {}",
                command.bid_type.as_str(),
                command.amount
            )));
        }

        let previous_bid = entry.auction.current_bid;
        let bid = Bid::new(auction_id, bidder_id, command.amount, command.bid_type);
        let outbid = entry.record_bid(bid.clone());
        let title = entry.auction.title.clone();
        drop(entry);

        let _ = self.event_bus.publish(MarketEvent::BidPlaced {
            auction_id,
            bid_id: bid.id,
            bidder_id,
            amount: bid.bid_amount,
            bid_type: bid.bid_type,
            previous_bid,
            timestamp: bid.created_at,
        });
        let message = format!("A bid of {} was placed on \"{title}\"", bid.bid_amount);
        for outbid_bidder in distinct(outbid).into_iter().filter(|id| *id != bidder_id) {
            self.notifier.notify(
                outbid_bidder,
                NotificationKind::Outbid,
                "You have been outbid",
                &message,
            );
        }

        tracing::info!(
            %auction_id,
            %bidder_id,
            amount = %bid.bid_amount,
            bid_type = bid.bid_type.as_str(),
            "bid placed"
        );
        Ok(bid)
    }

    /// Checks whether an account meets an auction's balance thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AuctionNotFound`] or
    /// [`MarketError::AccountNotFound`].
    pub async fn check_eligibility(
        &self,
        auction_id: AuctionId,
        account_id: AccountId,
    ) -> Result<Eligibility, MarketError> {
        let entry_lock = self.registry.get(auction_id).await?;
        let auction = entry_lock.read().await.auction.clone();
        let balance = self.ledger.balance(account_id).await?;
        Ok(check_eligibility(&balance, &auction))
    }

    /// Returns the auctions matching `filter`, newest start time first.
    pub async fn list_auctions(&self, filter: &AuctionFilter) -> Vec<Auction> {
        self.registry.list(filter).await
    }

    /// Returns an auction with its bids.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AuctionNotFound`] if the auction does not exist.
    pub async fn get_auction(&self, auction_id: AuctionId) -> Result<AuctionDetail, MarketError> {
        let entry_lock = self.registry.get(auction_id).await?;
        let entry = entry_lock.read().await;
        Ok(AuctionDetail {
            auction: entry.auction.clone(),
            bids: entry.bids_newest_first(),
        })
    }

    /// Returns the bids of an auction, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AuctionNotFound`] if the auction does not exist.
    pub async fn auction_bids(&self, auction_id: AuctionId) -> Result<Vec<Bid>, MarketError> {
        let entry_lock = self.registry.get(auction_id).await?;
        let entry = entry_lock.read().await;
        Ok(entry.bids_newest_first())
    }

    /// Returns every bid placed by an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn user_bids(
        &self,
        bidder_id: AccountId,
        status: Option<BidStatus>,
    ) -> Result<Vec<Bid>, MarketError> {
        self.ledger.account(bidder_id).await?;
        Ok(self.registry.bids_by_bidder(bidder_id, status).await)
    }

    /// Starts scheduled auctions whose start time has passed, then closes
    /// live auctions whose end time has passed.
    ///
    /// Failures are logged and skipped; an auction moved concurrently by an
    /// administrator is simply left alone.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        let due_to_start = self
            .registry
            .list(&AuctionFilter {
                status: Some(AuctionStatus::Scheduled),
                ..AuctionFilter::default()
            })
            .await;
        for auction in due_to_start.into_iter().filter(|a| a.start_time <= now) {
            match self.start_auction(auction.id).await {
                Ok(_) => report.started.push(auction.id),
                Err(err) => {
                    tracing::debug!(auction_id = %auction.id, error = %err, "sweep start skipped");
                }
            }
        }

        let due_to_close = self
            .registry
            .list(&AuctionFilter {
                status: Some(AuctionStatus::Live),
                ..AuctionFilter::default()
            })
            .await;
        for auction in due_to_close.into_iter().filter(|a| a.end_time <= now) {
            match self.close_auction(auction.id).await {
                Ok(_) => report.closed.push(auction.id),
                Err(err) => {
                    tracing::warn!(auction_id = %auction.id, error = %err, "sweep close failed");
                }
            }
        }

        if !report.is_empty() {
            tracing::info!(
                started = report.started.len(),
                closed = report.closed.len(),
                "auction sweep completed"
            );
        }
        report
    }

    async fn collect_payment(
        &self,
        auction_id: AuctionId,
        bidder_id: AccountId,
        amount: Decimal,
        bid_type: BidType,
    ) -> Result<Payment, MarketError> {
        let reference = Some(TransactionReference::new(auction_id, ReferenceType::Auction));
        let description = format!("Won auction {auction_id}");
        let book = self.ledger.book(bidder_id).await?;
        let mut guard = book.lock().await;
        match bid_type {
            BidType::Credit => guard
                .apply_credit(TransactionType::Spent, -amount, &description, reference)
                .map(Payment::Credit),
            BidType::Cash => guard
                .apply_cash(-amount, &description, reference)
                .map(Payment::Cash),
        }
    }

    fn publish_status_change(&self, auction_id: AuctionId, from: AuctionStatus, to: AuctionStatus) {
        let _ = self.event_bus.publish(MarketEvent::AuctionStatusChanged {
            auction_id,
            from,
            to,
            timestamp: Utc::now(),
        });
    }
}

fn transition(auction: &mut Auction, next: AuctionStatus) -> Result<AuctionStatus, MarketError> {
    auction
        .transition(next)
        .ok_or_else(|| invalid_transition(auction, next))
}

fn invalid_transition(auction: &Auction, next: AuctionStatus) -> MarketError {
    if auction.status.is_terminal() {
        return MarketError::InvalidState(format!(
            "auction {} already ended as {}",
            auction.id, auction.status
        ));
    }
    MarketError::InvalidState(format!(
        "auction {} cannot move from {} to {next}",
        auction.id, auction.status
    ))
}

/// Deduplicates account IDs, keeping first-seen order.
fn distinct(ids: impl IntoIterator<Item = AccountId>) -> Vec<AccountId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
