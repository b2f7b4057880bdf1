//! Redemption service: credit-to-cash conversion requests.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use super::commands::{AdvanceRedemptionCommand, RedeemCommand};
use crate::domain::{
    AccountId, CreditRedemption, CreditTransaction, EventBus, Ledger, MarketEvent,
    NotificationKind, Notifier, RedemptionBook, RedemptionId, RedemptionStatus, ReferenceType,
    TransactionReference, TransactionType,
};
use crate::error::MarketError;

/// Outcome of an administrative status change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RedemptionUpdate {
    /// The redemption after the change.
    pub redemption: CreditRedemption,
    /// Refund entry written when the redemption was rejected.
    pub refund: Option<CreditTransaction>,
}

/// Orchestration layer for [`CreditRedemption`] requests.
///
/// The account's ledger lock is held across both the balance change and the
/// redemption write, so a debit (or refund) and its redemption record are
/// never observed apart.
#[derive(Debug, Clone)]
pub struct RedemptionService {
    ledger: Arc<Ledger>,
    redemptions: Arc<RedemptionBook>,
    event_bus: EventBus,
    notifier: Arc<dyn Notifier>,
}

impl RedemptionService {
    /// Creates a new `RedemptionService`.
    #[must_use]
    pub fn new(
        ledger: Arc<Ledger>,
        redemptions: Arc<RedemptionBook>,
        event_bus: EventBus,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ledger,
            redemptions,
            event_bus,
            notifier,
        }
    }

    /// Converts credits into a pending cash payout.
    ///
    /// # Errors
    ///
    /// - [`MarketError::InvalidArgument`] for a non-positive amount.
    /// - [`MarketError::AccountNotFound`] for an unknown account.
    /// - [`MarketError::InsufficientFunds`] if the credit balance is too low.
    pub async fn redeem(&self, command: RedeemCommand) -> Result<CreditRedemption, MarketError> {
        command.validate()?;
        let book = self.ledger.book(command.account_id).await?;
        let mut guard = book.lock().await;

        let current = guard.account().credit_balance;
        if current < command.credits {
            return Err(MarketError::InsufficientFunds(format!(
                "insufficient credits: current {current}, requested {}",
                command.credits
            )));
        }

        let redemption = CreditRedemption::pending(
            RedemptionId::new(),
            command.account_id,
            command.credits,
            command.payment_method,
            command.payment_details,
        );
        let tx = guard.apply_credit(
            TransactionType::Redeemed,
            -command.credits,
            &format!(
                "Redeemed {} credits via {}",
                command.credits,
                command.payment_method.as_str()
            ),
            Some(TransactionReference::new(redemption.id, ReferenceType::Redemption)),
        )?;
        self.redemptions.insert(redemption.clone()).await;
        drop(guard);

        let _ = self.event_bus.publish(MarketEvent::from(&tx));
        let _ = self.event_bus.publish(MarketEvent::RedemptionRequested {
            redemption_id: redemption.id,
            account_id: redemption.account_id,
            credits: redemption.credits_redeemed,
            payment_method: redemption.payment_method,
            timestamp: redemption.created_at,
        });

        tracing::info!(
            redemption_id = %redemption.id,
            account_id = %redemption.account_id,
            credits = %redemption.credits_redeemed,
            payment_method = redemption.payment_method.as_str(),
            "redemption requested"
        );
        Ok(redemption)
    }

    /// Returns the account's redemptions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn list(
        &self,
        account_id: AccountId,
        status: Option<RedemptionStatus>,
    ) -> Result<Vec<CreditRedemption>, MarketError> {
        self.ledger.account(account_id).await?;
        Ok(self.redemptions.list_for_account(account_id, status).await)
    }

    /// Returns one redemption.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::RedemptionNotFound`] if it does not exist.
    pub async fn get(&self, redemption_id: RedemptionId) -> Result<CreditRedemption, MarketError> {
        self.redemptions.get(redemption_id).await
    }

    /// Moves a redemption along its processing workflow.
    ///
    /// Rejecting a redemption refunds its credits in the same step.
    ///
    /// # Errors
    ///
    /// - [`MarketError::RedemptionNotFound`] if it does not exist.
    /// - [`MarketError::InvalidState`] for a finalized redemption or a
    ///   transition the workflow does not allow.
    pub async fn advance(
        &self,
        command: AdvanceRedemptionCommand,
    ) -> Result<RedemptionUpdate, MarketError> {
        let next = command.status;
        let account_id = self.redemptions.get(command.redemption_id).await?.account_id;
        let book = self.ledger.book(account_id).await?;
        let mut guard = book.lock().await;

        let (redemption, from, refund) = self
            .redemptions
            .update(command.redemption_id, |r| {
                if r.status.is_final() {
                    return Err(MarketError::InvalidState(format!(
                        "redemption already finalized with status {}",
                        r.status
                    )));
                }
                if !r.status.can_transition_to(next) {
                    return Err(MarketError::InvalidState(format!(
                        "redemption cannot move from {} to {next}",
                        r.status
                    )));
                }
                let refund = if next == RedemptionStatus::Rejected {
                    Some(guard.apply_credit(
                        TransactionType::Refund,
                        r.credits_redeemed,
                        &format!("Refund for rejected redemption {}", r.id),
                        Some(TransactionReference::new(r.id, ReferenceType::Redemption)),
                    )?)
                } else {
                    None
                };
                let from = r.status;
                r.status = next;
                r.admin_note = command.note;
                r.processed_at = Some(Utc::now());
                Ok((r.clone(), from, refund))
            })
            .await?;
        drop(guard);

        if let Some(tx) = &refund {
            let _ = self.event_bus.publish(MarketEvent::from(tx));
        }
        let _ = self.event_bus.publish(MarketEvent::RedemptionStatusChanged {
            redemption_id: redemption.id,
            account_id,
            from,
            to: next,
            timestamp: Utc::now(),
        });
        self.notifier.notify(
            account_id,
            NotificationKind::RedemptionUpdate,
            "Redemption updated",
            &format!(
                "Your redemption of {} credits is now {next}",
                redemption.credits_redeemed
            ),
        );

        tracing::info!(
            redemption_id = %redemption.id,
            %account_id,
            from = %from,
            to = %next,
            refunded = refund.is_some(),
            "redemption advanced"
        );
        Ok(RedemptionUpdate { redemption, refund })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountRole, BusNotifier, HistoryQuery, PaymentMethod};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tokio_test::assert_ok;

    async fn setup(credits: Decimal) -> (RedemptionService, Arc<Ledger>, AccountId) {
        let ledger = Arc::new(Ledger::new());
        let bus = EventBus::new(64);
        let service = RedemptionService::new(
            Arc::clone(&ledger),
            Arc::new(RedemptionBook::new()),
            bus.clone(),
            Arc::new(BusNotifier::new(bus)),
        );
        let account = Account::new(AccountId::new(), AccountRole::Individual, "Ana".to_string());
        let id = account.id;
        assert_ok!(ledger.open_account(account).await);
        assert_ok!(
            ledger
                .apply_transaction(id, TransactionType::Earned, credits, "deposits", None)
                .await
        );
        (service, ledger, id)
    }

    fn redeem(account_id: AccountId, credits: Decimal) -> RedeemCommand {
        RedeemCommand {
            account_id,
            credits,
            payment_method: PaymentMethod::BankTransfer,
            payment_details: serde_json::json!({ "iban": "DE00 1234" }),
        }
    }

    fn advance(redemption_id: RedemptionId, status: RedemptionStatus) -> AdvanceRedemptionCommand {
        AdvanceRedemptionCommand {
            redemption_id,
            status,
            note: Some("checked".to_string()),
        }
    }

    #[tokio::test]
    async fn redeeming_full_balance() {
        let (service, ledger, id) = setup(dec!(500)).await;

        let redemption = assert_ok!(service.redeem(redeem(id, dec!(500))).await);
        assert_eq!(redemption.status, RedemptionStatus::Pending);
        assert_eq!(redemption.cash_amount, dec!(500));

        let balance = assert_ok!(ledger.balance(id).await);
        assert_eq!(balance.credit_balance, dec!(0));
        let page = assert_ok!(ledger.transaction_history(id, HistoryQuery::default()).await);
        let Some(latest) = page.transactions.first() else {
            panic!("expected transaction");
        };
        assert_eq!(latest.kind, TransactionType::Redeemed);
        assert_eq!(latest.amount, dec!(-500));
        assert_eq!(latest.balance_after, dec!(0));
        assert_eq!(
            latest.reference.map(|r| r.reference_id),
            Some(*redemption.id.as_uuid())
        );
    }

    #[tokio::test]
    async fn redeeming_more_than_balance_fails_cleanly() {
        let (service, ledger, id) = setup(dec!(100)).await;
        let result = service.redeem(redeem(id, dec!(100.01))).await;
        assert!(matches!(result, Err(MarketError::InsufficientFunds(ref m)) if m.contains("current 100")));
        assert!(assert_ok!(service.list(id, None).await).is_empty());
        assert_eq!(assert_ok!(ledger.balance(id).await).credit_balance, dec!(100));

        assert!(matches!(
            service.redeem(redeem(id, dec!(0))).await,
            Err(MarketError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn every_redeemed_debit_has_a_stored_redemption() {
        let (service, ledger, id) = setup(dec!(90)).await;
        for credits in [dec!(10), dec!(20), dec!(30)] {
            assert_ok!(service.redeem(redeem(id, credits)).await);
        }

        let page = assert_ok!(ledger.transaction_history(id, HistoryQuery::default()).await);
        let debits: Vec<_> = page
            .transactions
            .iter()
            .filter(|tx| tx.kind == TransactionType::Redeemed)
            .collect();
        assert_eq!(debits.len(), 3);
        for tx in debits {
            let Some(reference) = tx.reference else {
                panic!("redeemed transaction without reference");
            };
            let stored = assert_ok!(
                service
                    .get(RedemptionId::from_uuid(reference.reference_id))
                    .await
            );
            assert_eq!(stored.credits_redeemed, -tx.amount);
        }
        assert_eq!(assert_ok!(service.list(id, None).await).len(), 3);
    }

    #[tokio::test]
    async fn workflow_completes() {
        let (service, _, id) = setup(dec!(80)).await;
        let redemption = assert_ok!(service.redeem(redeem(id, dec!(30))).await);

        let update = assert_ok!(
            service
                .advance(advance(redemption.id, RedemptionStatus::Processing))
                .await
        );
        assert!(update.refund.is_none());
        let update = assert_ok!(
            service
                .advance(advance(redemption.id, RedemptionStatus::Completed))
                .await
        );
        assert_eq!(update.redemption.status, RedemptionStatus::Completed);
        assert!(update.redemption.processed_at.is_some());

        let result = service
            .advance(advance(redemption.id, RedemptionStatus::Rejected))
            .await;
        assert!(matches!(result, Err(MarketError::InvalidState(ref m)) if m.contains("finalized")));
    }

    #[tokio::test]
    async fn rejection_refunds_credits() {
        let (service, ledger, id) = setup(dec!(80)).await;
        let redemption = assert_ok!(service.redeem(redeem(id, dec!(30))).await);

        let skip = service
            .advance(advance(redemption.id, RedemptionStatus::Completed))
            .await;
        assert!(matches!(skip, Err(MarketError::InvalidState(_))));

        let update = assert_ok!(
            service
                .advance(advance(redemption.id, RedemptionStatus::Rejected))
                .await
        );
        let Some(refund) = update.refund else {
            panic!("expected refund");
        };
        assert_eq!(refund.kind, TransactionType::Refund);
        assert_eq!(refund.amount, dec!(30));
        assert_eq!(refund.balance_after, dec!(80));
        assert_eq!(assert_ok!(ledger.balance(id).await).credit_balance, dec!(80));

        let rejected = assert_ok!(service.list(id, Some(RedemptionStatus::Rejected)).await);
        assert_eq!(rejected.len(), 1);
        assert_eq!(
            rejected.first().and_then(|r| r.admin_note.clone()),
            Some("checked".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_redemption_is_not_found() {
        let (service, _, _) = setup(dec!(1)).await;
        let result = service
            .advance(advance(RedemptionId::new(), RedemptionStatus::Processing))
            .await;
        assert!(matches!(result, Err(MarketError::RedemptionNotFound(_))));
    }
}
