//! Account service: participant registration and the balance ledger.

use std::sync::Arc;

use crate::domain::{
    Account, AccountId, Balance, CashAdjustment, CreditTransaction, EventBus, HistoryQuery,
    Ledger, LedgerSummary, MarketEvent, NotificationKind, Notifier, ReferenceType,
    TransactionPage, TransactionReference,
};
use crate::error::MarketError;

use super::commands::{AddCreditsCommand, AdjustCashCommand, OpenAccountCommand};

/// Orchestration layer over the [`Ledger`].
///
/// Emits a [`MarketEvent::CreditsApplied`] or [`MarketEvent::CashAdjusted`]
/// after every balance change.
#[derive(Debug, Clone)]
pub struct AccountService {
    ledger: Arc<Ledger>,
    event_bus: EventBus,
    notifier: Arc<dyn Notifier>,
}

impl AccountService {
    /// Creates a new `AccountService`.
    #[must_use]
    pub fn new(ledger: Arc<Ledger>, event_bus: EventBus, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ledger,
            event_bus,
            notifier,
        }
    }

    /// Returns a reference to the inner [`Ledger`].
    #[must_use]
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Registers a participant, optionally funding its cash balance.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an invalid command or an
    /// identifier that is already taken.
    pub async fn open_account(&self, command: OpenAccountCommand) -> Result<Account, MarketError> {
        command.validate()?;
        let id = command.account_id.unwrap_or_default();
        let cash = command.opening_cash.unwrap_or_default();
        let reference = TransactionReference::new(id, ReferenceType::Adjustment);
        let (account, adjustment) = self
            .ledger
            .open_funded_account(
                Account::new(id, command.role, command.display_name.trim().to_string()),
                cash,
                "Opening balance",
                Some(reference),
            )
            .await?;
        if let Some(adjustment) = &adjustment {
            let _ = self.event_bus.publish(MarketEvent::from(adjustment));
        }
        tracing::info!(
            account_id = %id,
            role = account.role.as_str(),
            opening_cash = %account.cash_balance,
            "account opened"
        );
        Ok(account)
    }

    /// Returns the account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if it does not exist.
    pub async fn account(&self, account_id: AccountId) -> Result<Account, MarketError> {
        self.ledger.account(account_id).await
    }

    /// Returns both balances of the account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if it does not exist.
    pub async fn balance(&self, account_id: AccountId) -> Result<Balance, MarketError> {
        self.ledger.balance(account_id).await
    }

    /// Awards earned or bonus credits and notifies the recipient.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an invalid command and
    /// [`MarketError::AccountNotFound`] for an unknown account.
    pub async fn add_credits(
        &self,
        command: AddCreditsCommand,
    ) -> Result<CreditTransaction, MarketError> {
        command.validate()?;
        let tx = self
            .ledger
            .apply_transaction(
                command.account_id,
                command.kind,
                command.amount,
                command.description.trim(),
                command.reference,
            )
            .await?;

        let _ = self.event_bus.publish(MarketEvent::from(&tx));
        self.notifier.notify(
            tx.account_id,
            NotificationKind::CreditsReceived,
            "Credits received",
            &format!("You received {} credits: {}", tx.amount, tx.description),
        );

        tracing::info!(
            account_id = %tx.account_id,
            kind = tx.kind.as_str(),
            amount = %tx.amount,
            balance_after = %tx.balance_after,
            "credits added"
        );
        Ok(tx)
    }

    /// Applies an administrative cash adjustment.
    ///
    /// # Errors
    ///
    /// - [`MarketError::InvalidArgument`] for an invalid command.
    /// - [`MarketError::AccountNotFound`] for an unknown account.
    /// - [`MarketError::InsufficientFunds`] if cash would go negative.
    pub async fn adjust_cash(
        &self,
        command: AdjustCashCommand,
    ) -> Result<CashAdjustment, MarketError> {
        command.validate()?;
        let reference = TransactionReference::new(command.account_id, ReferenceType::Adjustment);
        let adjustment = self
            .ledger
            .adjust_cash(
                command.account_id,
                command.amount,
                command.description.trim(),
                Some(reference),
            )
            .await?;

        let _ = self.event_bus.publish(MarketEvent::from(&adjustment));
        tracing::info!(
            account_id = %adjustment.account_id,
            amount = %adjustment.amount,
            balance_after = %adjustment.balance_after,
            "cash adjusted"
        );
        Ok(adjustment)
    }

    /// Returns one page of the credit history.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn transactions(
        &self,
        account_id: AccountId,
        query: HistoryQuery,
    ) -> Result<TransactionPage, MarketError> {
        self.ledger.transaction_history(account_id, query).await
    }

    /// Returns the cash history, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn cash_history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<CashAdjustment>, MarketError> {
        self.ledger.cash_history(account_id).await
    }

    /// Returns lifetime totals and current balances.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn summary(&self, account_id: AccountId) -> Result<LedgerSummary, MarketError> {
        self.ledger.summary(account_id).await
    }

    /// Resolves the acting account and requires the administrator role.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Forbidden`] for unknown accounts and for
    /// accounts without the administrator role.
    pub async fn require_administrator(&self, actor: AccountId) -> Result<Account, MarketError> {
        let account = self
            .ledger
            .account(actor)
            .await
            .map_err(|_| MarketError::Forbidden(format!("unknown acting account {actor}")))?;
        if !account.is_administrator() {
            return Err(MarketError::Forbidden(format!(
                "account {actor} is not an administrator"
            )));
        }
        Ok(account)
    }

    /// Requires `actor` to be `owner` or an administrator.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Forbidden`] otherwise.
    pub async fn require_owner_or_administrator(
        &self,
        actor: AccountId,
        owner: AccountId,
    ) -> Result<(), MarketError> {
        if actor == owner {
            return Ok(());
        }
        self.require_administrator(actor).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AccountRole, BusNotifier, TransactionType};
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    fn make_service() -> AccountService {
        let bus = EventBus::new(64);
        AccountService::new(
            Arc::new(Ledger::new()),
            bus.clone(),
            Arc::new(BusNotifier::new(bus)),
        )
    }

    fn open(role: AccountRole, opening_cash: Option<rust_decimal::Decimal>) -> OpenAccountCommand {
        OpenAccountCommand {
            account_id: None,
            role,
            display_name: " Green Hub ".to_string(),
            opening_cash,
        }
    }

    #[tokio::test]
    async fn open_account_with_opening_cash() {
        let service = make_service();
        let account = assert_ok!(service.open_account(open(AccountRole::Company, Some(dec!(250)))).await);
        assert_eq!(account.display_name, "Green Hub");
        assert_eq!(account.cash_balance, dec!(250));
        assert_eq!(account.credit_balance, dec!(0));

        let history = assert_ok!(service.cash_history(account.id).await);
        assert_eq!(history.len(), 1);
        assert_eq!(history.first().map(|a| a.balance_after), Some(dec!(250)));
    }

    #[tokio::test]
    async fn duplicate_open_leaves_funded_account_untouched() {
        let service = make_service();
        let mut command = open(AccountRole::Company, Some(dec!(250)));
        let account = assert_ok!(service.open_account(command.clone()).await);

        command.account_id = Some(account.id);
        command.opening_cash = Some(dec!(900));
        assert_err!(service.open_account(command).await);

        let balance = assert_ok!(service.balance(account.id).await);
        assert_eq!(balance.cash_balance, dec!(250));
        assert_eq!(assert_ok!(service.cash_history(account.id).await).len(), 1);
    }

    #[tokio::test]
    async fn add_credits_emits_event_and_notification() {
        let service = make_service();
        let account = assert_ok!(service.open_account(open(AccountRole::Individual, None)).await);
        let mut rx = service.event_bus.subscribe();

        let tx = assert_ok!(
            service
                .add_credits(AddCreditsCommand {
                    account_id: account.id,
                    amount: dec!(75),
                    kind: TransactionType::Earned,
                    description: "12 kg PET at hub 3".to_string(),
                    reference: None,
                })
                .await
        );
        assert_eq!(tx.balance_after, dec!(75));

        let Ok(applied) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(applied.event_type_str(), "credits_applied");
        let Ok(notification) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(notification.event_type_str(), "notification");

        let summary = assert_ok!(service.summary(account.id).await);
        assert_eq!(summary.total_earned, dec!(75));
    }

    #[tokio::test]
    async fn cash_adjustment_cannot_overdraw() {
        let service = make_service();
        let account = assert_ok!(service.open_account(open(AccountRole::Company, Some(dec!(10)))).await);
        let result = service
            .adjust_cash(AdjustCashCommand {
                account_id: account.id,
                amount: dec!(-20),
                description: "correction".to_string(),
            })
            .await;
        assert!(matches!(result, Err(MarketError::InsufficientFunds(_))));
        let balance = assert_ok!(service.balance(account.id).await);
        assert_eq!(balance.cash_balance, dec!(10));
    }

    #[tokio::test]
    async fn administrator_checks() {
        let service = make_service();
        let admin = assert_ok!(service.open_account(open(AccountRole::Administrator, None)).await);
        let user = assert_ok!(service.open_account(open(AccountRole::Individual, None)).await);

        assert_ok!(service.require_administrator(admin.id).await);
        assert!(matches!(
            service.require_administrator(user.id).await,
            Err(MarketError::Forbidden(_))
        ));
        assert!(matches!(
            service.require_administrator(AccountId::new()).await,
            Err(MarketError::Forbidden(_))
        ));

        assert_ok!(service.require_owner_or_administrator(user.id, user.id).await);
        assert_ok!(service.require_owner_or_administrator(admin.id, user.id).await);
        assert_err!(service.require_owner_or_administrator(user.id, admin.id).await);
    }
}
