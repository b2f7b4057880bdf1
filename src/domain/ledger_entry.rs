//! Immutable ledger entries backing account balances.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AccountId, TransactionId};

/// Kind of credit movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credits awarded for a deposit.
    Earned,
    /// Credits paid for a won auction.
    Spent,
    /// Credits converted into a cash payout request.
    Redeemed,
    /// Promotional credits.
    Bonus,
    /// Credits returned, e.g. after a rejected redemption.
    Refund,
}

impl TransactionType {
    /// All transaction types, in display order.
    pub const ALL: [Self; 5] = [
        Self::Earned,
        Self::Spent,
        Self::Redeemed,
        Self::Bonus,
        Self::Refund,
    ];

    /// Returns `true` for types that add credits.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self, Self::Earned | Self::Bonus | Self::Refund)
    }

    /// Returns the type as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earned => "earned",
            Self::Spent => "spent",
            Self::Redeemed => "redeemed",
            Self::Bonus => "bonus",
            Self::Refund => "refund",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown transaction type: {s}"))
    }
}

/// What kind of record a ledger entry originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    /// A waste deposit accepted at a hub.
    Deposit,
    /// An auction settlement.
    Auction,
    /// A credit redemption request.
    Redemption,
    /// A manual administrative adjustment.
    Adjustment,
}

/// Link from a ledger entry to its originating record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionReference {
    /// Identifier of the originating record.
    pub reference_id: uuid::Uuid,
    /// Kind of the originating record.
    pub reference_type: ReferenceType,
}

impl TransactionReference {
    /// Creates a reference.
    #[must_use]
    pub fn new(reference_id: impl Into<uuid::Uuid>, reference_type: ReferenceType) -> Self {
        Self {
            reference_id: reference_id.into(),
            reference_type,
        }
    }
}

/// Append-only record of a credit balance change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreditTransaction {
    /// Entry identifier.
    pub id: TransactionId,
    /// Account whose credit balance changed.
    pub account_id: AccountId,
    /// Kind of movement.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Signed amount applied to the balance.
    pub amount: Decimal,
    /// Human-readable description.
    pub description: String,
    /// Originating record, if any.
    pub reference: Option<TransactionReference>,
    /// Credit balance immediately after this entry.
    pub balance_after: Decimal,
    /// Position in the account's credit history, starting at 1.
    pub sequence: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a cash balance change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CashAdjustment {
    /// Entry identifier.
    pub id: TransactionId,
    /// Account whose cash balance changed.
    pub account_id: AccountId,
    /// Signed amount applied to the balance.
    pub amount: Decimal,
    /// Human-readable description.
    pub description: String,
    /// Originating record, if any.
    pub reference: Option<TransactionReference>,
    /// Cash balance immediately after this entry.
    pub balance_after: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_types_are_positive_kinds() {
        assert!(TransactionType::Earned.is_credit());
        assert!(TransactionType::Bonus.is_credit());
        assert!(TransactionType::Refund.is_credit());
        assert!(!TransactionType::Spent.is_credit());
        assert!(!TransactionType::Redeemed.is_credit());
    }

    #[test]
    fn parses_every_type_name() {
        for kind in TransactionType::ALL {
            assert_eq!(kind.as_str().parse::<TransactionType>(), Ok(kind));
        }
        assert!("withdrawn".parse::<TransactionType>().is_err());
    }

    #[test]
    fn kind_serializes_as_type_field() {
        let tx = CreditTransaction {
            id: TransactionId::new(),
            account_id: AccountId::new(),
            kind: TransactionType::Redeemed,
            amount: Decimal::new(-500, 0),
            description: "redemption".to_string(),
            reference: None,
            balance_after: Decimal::ZERO,
            sequence: 1,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&tx).unwrap_or_default();
        assert_eq!(json["type"], "redeemed");
        assert_eq!(json["amount"], "-500");
    }
}
