//! Credit-to-cash payout requests.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AccountId, RedemptionId};

/// Credits are converted to cash one-to-one.
pub const CONVERSION_RATE: Decimal = Decimal::ONE;

/// Payout channel requested by the account holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Bank account transfer.
    BankTransfer,
    /// Mobile banking wallet.
    MobileBanking,
    /// Cash pickup.
    Cash,
}

impl PaymentMethod {
    /// Returns the method as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::MobileBanking => "mobile_banking",
            Self::Cash => "cash",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(Self::BankTransfer),
            "mobile_banking" => Ok(Self::MobileBanking),
            "cash" => Ok(Self::Cash),
            other => Err(format!(
                "unsupported payment method: {other} (expected bank_transfer, mobile_banking or cash)"
            )),
        }
    }
}

/// Processing status of a redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    /// Awaiting administrative review.
    Pending,
    /// Payout in progress.
    Processing,
    /// Paid out.
    Completed,
    /// Declined; credits are returned.
    Rejected,
}

impl RedemptionStatus {
    /// Returns `true` if an administrator may move a redemption from `self`
    /// to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Pending | Self::Processing, Self::Rejected)
        )
    }

    /// Returns `true` for `Completed` and `Rejected`.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to convert credits into a cash payout.
///
/// The credits are debited from the account when the request is created,
/// not when it completes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreditRedemption {
    /// Redemption identifier.
    pub id: RedemptionId,
    /// Requesting account.
    pub account_id: AccountId,
    /// Credits debited for this request.
    pub credits_redeemed: Decimal,
    /// Cash owed to the account holder.
    pub cash_amount: Decimal,
    /// Credits-to-cash rate applied.
    pub conversion_rate: Decimal,
    /// Requested payout channel.
    pub payment_method: PaymentMethod,
    /// Processing status.
    pub status: RedemptionStatus,
    /// Channel-specific payout details supplied by the requester.
    pub payment_details: serde_json::Value,
    /// Note left by the administrator on the last status change.
    pub admin_note: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status change.
    pub processed_at: Option<DateTime<Utc>>,
}

impl CreditRedemption {
    /// Creates a pending redemption at [`CONVERSION_RATE`].
    #[must_use]
    pub fn pending(
        id: RedemptionId,
        account_id: AccountId,
        credits: Decimal,
        payment_method: PaymentMethod,
        payment_details: serde_json::Value,
    ) -> Self {
        Self {
            id,
            account_id,
            credits_redeemed: credits,
            cash_amount: credits * CONVERSION_RATE,
            conversion_rate: CONVERSION_RATE,
            payment_method,
            status: RedemptionStatus::Pending,
            payment_details,
            admin_note: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }
}
