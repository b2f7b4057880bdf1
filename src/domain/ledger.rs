//! Balance ledger: per-account balances plus append-only history.
//!
//! Each account lives in its own [`AccountBook`] behind a
//! [`tokio::sync::Mutex`], so two debits against the same account can never
//! both pass a stale non-negative check. The book is the only place a
//! balance is written, and every write appends a ledger entry carrying the
//! post-update balance.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;

use super::{
    Account, AccountId, Balance, CashAdjustment, CreditTransaction, TransactionId,
    TransactionReference, TransactionType,
};
use crate::error::MarketError;

/// Largest page size accepted by [`Ledger::transaction_history`].
pub const MAX_PAGE_SIZE: u32 = 100;

/// An account together with its credit and cash history.
#[derive(Debug)]
pub struct AccountBook {
    account: Account,
    transactions: Vec<CreditTransaction>,
    cash_adjustments: Vec<CashAdjustment>,
}

impl AccountBook {
    fn new(account: Account) -> Self {
        Self {
            account,
            transactions: Vec::new(),
            cash_adjustments: Vec::new(),
        }
    }

    /// Returns the account with its current balances.
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    /// Returns the credit history, oldest first.
    #[must_use]
    pub fn transactions(&self) -> &[CreditTransaction] {
        &self.transactions
    }

    /// Returns the cash history, oldest first.
    #[must_use]
    pub fn cash_adjustments(&self) -> &[CashAdjustment] {
        &self.cash_adjustments
    }

    /// Applies a signed credit movement and appends its ledger entry.
    ///
    /// Nothing is changed when an error is returned.
    ///
    /// # Errors
    ///
    /// - [`MarketError::InvalidArgument`] if `amount` is zero or its sign
    ///   contradicts `kind` (earned/bonus/refund add, spent/redeemed remove).
    /// - [`MarketError::InsufficientFunds`] if the balance would go negative.
    pub fn apply_credit(
        &mut self,
        kind: TransactionType,
        amount: Decimal,
        description: &str,
        reference: Option<TransactionReference>,
    ) -> Result<CreditTransaction, MarketError> {
        validate_signed_amount(kind, amount)?;
        let balance_after = next_balance(self.account.credit_balance, amount, "credits")?;

        let sequence = u64::try_from(self.transactions.len())
            .map_err(|_| MarketError::Internal("ledger sequence overflow".to_string()))?
            .saturating_add(1);
        let transaction = CreditTransaction {
            id: TransactionId::new(),
            account_id: self.account.id,
            kind,
            amount,
            description: description.to_string(),
            reference,
            balance_after,
            sequence,
            created_at: Utc::now(),
        };

        self.account.credit_balance = balance_after;
        self.transactions.push(transaction.clone());
        Ok(transaction)
    }

    /// Applies a signed cash movement and appends its ledger entry.
    ///
    /// # Errors
    ///
    /// - [`MarketError::InvalidArgument`] if `amount` is zero.
    /// - [`MarketError::InsufficientFunds`] if the balance would go negative.
    pub fn apply_cash(
        &mut self,
        amount: Decimal,
        description: &str,
        reference: Option<TransactionReference>,
    ) -> Result<CashAdjustment, MarketError> {
        if amount.is_zero() {
            return Err(MarketError::InvalidArgument(
                "cash adjustment must be non-zero".to_string(),
            ));
        }
        let balance_after = next_balance(self.account.cash_balance, amount, "cash")?;

        let adjustment = CashAdjustment {
            id: TransactionId::new(),
            account_id: self.account.id,
            amount,
            description: description.to_string(),
            reference,
            balance_after,
            created_at: Utc::now(),
        };

        self.account.cash_balance = balance_after;
        self.cash_adjustments.push(adjustment.clone());
        Ok(adjustment)
    }
}

fn validate_signed_amount(kind: TransactionType, amount: Decimal) -> Result<(), MarketError> {
    if amount.is_zero() {
        return Err(MarketError::InvalidArgument(
            "transaction amount must be non-zero".to_string(),
        ));
    }
    if kind.is_credit() != amount.is_sign_positive() {
        let expected = if kind.is_credit() { "positive" } else { "negative" };
        return Err(MarketError::InvalidArgument(format!(
            "{kind} transactions must have a {expected} amount, got {amount}"
        )));
    }
    Ok(())
}

fn next_balance(current: Decimal, amount: Decimal, what: &str) -> Result<Decimal, MarketError> {
    let next = current
        .checked_add(amount)
        .ok_or_else(|| MarketError::Internal(format!("{what} balance overflow")))?;
    if next < Decimal::ZERO {
        return Err(MarketError::InsufficientFunds(format!(
            "insufficient {what}: current {current}, requested {}",
            amount.abs()
        )));
    }
    Ok(next)
}

/// Query for [`Ledger::transaction_history`].
#[derive(Debug, Clone, Copy)]
pub struct HistoryQuery {
    /// Restrict to one transaction type.
    pub kind: Option<TransactionType>,
    /// Page number (1-indexed).
    pub page: u32,
    /// Items per page.
    pub limit: u32,
}

impl HistoryQuery {
    /// Clamps `page` to at least 1 and `limit` to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            kind: self.kind,
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            kind: None,
            page: 1,
            limit: 20,
        }
    }
}

/// Aggregate over the transactions of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TypeTotal {
    /// Transaction type.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Sum of signed amounts.
    pub sum: Decimal,
    /// Number of transactions.
    pub count: u32,
}

/// One page of an account's credit history.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionPage {
    /// Transactions on this page, newest first.
    pub transactions: Vec<CreditTransaction>,
    /// Current page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Number of transactions matching the filter.
    pub total: u32,
    /// Number of pages.
    pub total_pages: u32,
    /// Per-type totals over the matching transactions.
    pub totals: Vec<TypeTotal>,
}

/// Lifetime credit summary of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LedgerSummary {
    /// Account identifier.
    pub account_id: AccountId,
    /// Current credit balance.
    pub current_balance: Decimal,
    /// Current cash balance.
    pub cash_balance: Decimal,
    /// Sum of earned, bonus and refund transactions.
    pub total_earned: Decimal,
    /// Absolute sum of spent and redeemed transactions.
    pub total_spent: Decimal,
}

/// Store of every account book.
///
/// # Concurrency
///
/// Mutations of one account are serialized by that account's mutex;
/// different accounts proceed in parallel. Callers that combine an auction
/// lock with an account lock must take the auction lock first.
#[derive(Debug)]
pub struct Ledger {
    accounts: RwLock<HashMap<AccountId, Arc<Mutex<AccountBook>>>>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new account. Balances start at zero.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] if the ID is already taken.
    pub async fn open_account(&self, account: Account) -> Result<Account, MarketError> {
        let (account, _) = self
            .open_funded_account(account, Decimal::ZERO, "", None)
            .await?;
        Ok(account)
    }

    /// Registers a new account whose cash balance starts at `opening_cash`.
    ///
    /// The opening adjustment is applied before the account becomes
    /// visible, so either both happen or neither does. A zero amount opens
    /// an empty account and returns no adjustment.
    ///
    /// # Errors
    ///
    /// - [`MarketError::InvalidArgument`] if the ID is already taken.
    /// - [`MarketError::InsufficientFunds`] for a negative amount.
    pub async fn open_funded_account(
        &self,
        account: Account,
        opening_cash: Decimal,
        description: &str,
        reference: Option<TransactionReference>,
    ) -> Result<(Account, Option<CashAdjustment>), MarketError> {
        let mut map = self.accounts.write().await;
        if map.contains_key(&account.id) {
            return Err(MarketError::InvalidArgument(format!(
                "account {} already exists",
                account.id
            )));
        }
        let mut fresh = account;
        fresh.credit_balance = Decimal::ZERO;
        fresh.cash_balance = Decimal::ZERO;
        let mut book = AccountBook::new(fresh);
        let adjustment = if opening_cash.is_zero() {
            None
        } else {
            Some(book.apply_cash(opening_cash, description, reference)?)
        };
        let opened = book.account().clone();
        map.insert(opened.id, Arc::new(Mutex::new(book)));
        Ok((opened, adjustment))
    }

    /// Returns the account book behind its per-account lock.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn book(&self, account_id: AccountId) -> Result<Arc<Mutex<AccountBook>>, MarketError> {
        let map = self.accounts.read().await;
        map.get(&account_id)
            .cloned()
            .ok_or(MarketError::AccountNotFound(account_id))
    }

    /// Returns a snapshot of the account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn account(&self, account_id: AccountId) -> Result<Account, MarketError> {
        let book = self.book(account_id).await?;
        let guard = book.lock().await;
        Ok(guard.account.clone())
    }

    /// Returns a snapshot of both balances.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn balance(&self, account_id: AccountId) -> Result<Balance, MarketError> {
        let book = self.book(account_id).await?;
        let guard = book.lock().await;
        Ok(guard.account.balance())
    }

    /// Applies a signed credit movement to an account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] for unknown accounts and the
    /// errors of [`AccountBook::apply_credit`].
    pub async fn apply_transaction(
        &self,
        account_id: AccountId,
        kind: TransactionType,
        amount: Decimal,
        description: &str,
        reference: Option<TransactionReference>,
    ) -> Result<CreditTransaction, MarketError> {
        let book = self.book(account_id).await?;
        let mut guard = book.lock().await;
        guard.apply_credit(kind, amount, description, reference)
    }

    /// Applies a signed cash movement to an account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] for unknown accounts and the
    /// errors of [`AccountBook::apply_cash`].
    pub async fn adjust_cash(
        &self,
        account_id: AccountId,
        amount: Decimal,
        description: &str,
        reference: Option<TransactionReference>,
    ) -> Result<CashAdjustment, MarketError> {
        let book = self.book(account_id).await?;
        let mut guard = book.lock().await;
        guard.apply_cash(amount, description, reference)
    }

    /// Returns one page of the account's credit history, newest first, with
    /// per-type totals over every matching transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn transaction_history(
        &self,
        account_id: AccountId,
        query: HistoryQuery,
    ) -> Result<TransactionPage, MarketError> {
        let query = query.clamped();
        let book = self.book(account_id).await?;
        let guard = book.lock().await;

        let matching: Vec<&CreditTransaction> = guard
            .transactions
            .iter()
            .rev()
            .filter(|t| query.kind.is_none_or(|k| t.kind == k))
            .collect();

        let mut totals: Vec<TypeTotal> = Vec::new();
        for kind in TransactionType::ALL {
            let of_kind = matching.iter().filter(|t| t.kind == kind);
            let count = u32::try_from(of_kind.clone().count()).unwrap_or(u32::MAX);
            if count > 0 {
                totals.push(TypeTotal {
                    kind,
                    sum: of_kind.map(|t| t.amount).sum(),
                    count,
                });
            }
        }

        let total = u32::try_from(matching.len()).unwrap_or(u32::MAX);
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(query.limit)
        };
        let start = usize::try_from((query.page - 1).saturating_mul(query.limit)).unwrap_or(usize::MAX);
        let transactions = matching
            .into_iter()
            .skip(start)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(TransactionPage {
            transactions,
            page: query.page,
            limit: query.limit,
            total,
            total_pages,
            totals,
        })
    }

    /// Returns the account's cash history, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn cash_history(&self, account_id: AccountId) -> Result<Vec<CashAdjustment>, MarketError> {
        let book = self.book(account_id).await?;
        let guard = book.lock().await;
        Ok(guard.cash_adjustments.iter().rev().cloned().collect())
    }

    /// Returns lifetime earned/spent totals alongside current balances.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AccountNotFound`] if the account does not exist.
    pub async fn summary(&self, account_id: AccountId) -> Result<LedgerSummary, MarketError> {
        let book = self.book(account_id).await?;
        let guard = book.lock().await;

        let (total_earned, total_spent) = guard.transactions.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(earned, spent), t| {
                if t.kind.is_credit() {
                    (earned + t.amount, spent)
                } else {
                    (earned, spent + t.amount.abs())
                }
            },
        );

        Ok(LedgerSummary {
            account_id,
            current_balance: guard.account.credit_balance,
            cash_balance: guard.account.cash_balance,
            total_earned,
            total_spent,
        })
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
