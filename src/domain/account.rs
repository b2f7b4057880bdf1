//! Marketplace participants and their balances.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AccountId;

/// Role of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Individual depositor earning credits at hubs.
    Individual,
    /// Company bidding on material lots.
    Company,
    /// Platform operator.
    Administrator,
}

impl AccountRole {
    /// Returns the role as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Company => "company",
            Self::Administrator => "administrator",
        }
    }
}

/// A participant holding credit and cash balances.
///
/// Balances are only ever changed by the [`super::Ledger`], which pairs
/// every change with a ledger entry and refuses to take either balance
/// below zero.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Participant role.
    pub role: AccountRole,
    /// Display name.
    pub display_name: String,
    /// Current credit balance (never negative).
    pub credit_balance: Decimal,
    /// Current cash balance (never negative).
    pub cash_balance: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates an account with zero balances.
    #[must_use]
    pub fn new(id: AccountId, role: AccountRole, display_name: String) -> Self {
        Self {
            id,
            role,
            display_name,
            credit_balance: Decimal::ZERO,
            cash_balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    /// Returns a point-in-time copy of both balances.
    #[must_use]
    pub const fn balance(&self) -> Balance {
        Balance {
            account_id: self.id,
            credit_balance: self.credit_balance,
            cash_balance: self.cash_balance,
        }
    }

    /// Returns `true` for administrator accounts.
    #[must_use]
    pub fn is_administrator(&self) -> bool {
        self.role == AccountRole::Administrator
    }
}

/// Snapshot of an account's balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Balance {
    /// Account the balances belong to.
    pub account_id: AccountId,
    /// Credit balance at snapshot time.
    pub credit_balance: Decimal,
    /// Cash balance at snapshot time.
    pub cash_balance: Decimal,
}
