//! Redemption DTOs.

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{parse_enum, parse_optional_enum, parse_text};
use crate::domain::{AccountId, RedemptionId, RedemptionStatus};
use crate::error::MarketError;
use crate::service::{AdvanceRedemptionCommand, RedeemCommand};

/// Request body for `POST /accounts/{id}/redemptions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RedeemRequest {
    /// Credits to convert.
    pub credits: Decimal,
    /// `bank_transfer`, `mobile_banking` or `cash`.
    pub payment_method: String,
    /// Channel-specific payout details (account number, wallet, pickup).
    #[serde(default)]
    pub payment_details: serde_json::Value,
}

impl RedeemRequest {
    /// Builds the command for `account_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an unknown payment
    /// method.
    pub fn into_command(self, account_id: AccountId) -> Result<RedeemCommand, MarketError> {
        Ok(RedeemCommand {
            account_id,
            credits: self.credits,
            payment_method: parse_text(&self.payment_method)?,
            payment_details: self.payment_details,
        })
    }
}

/// Query parameters for `GET /accounts/{id}/redemptions`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RedemptionListQuery {
    /// `pending`, `processing`, `completed` or `rejected`.
    pub status: Option<String>,
}

impl RedemptionListQuery {
    /// Parses the status filter.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an unknown status.
    pub fn status(&self) -> Result<Option<RedemptionStatus>, MarketError> {
        parse_optional_enum("redemption status", self.status.as_deref())
    }
}

/// Request body for `POST /redemptions/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvanceRedemptionRequest {
    /// `processing`, `completed` or `rejected`.
    pub status: String,
    /// Note stored on the redemption.
    #[serde(default)]
    pub note: Option<String>,
}

impl AdvanceRedemptionRequest {
    /// Builds the command for `redemption_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an unknown status.
    pub fn into_command(
        self,
        redemption_id: RedemptionId,
    ) -> Result<AdvanceRedemptionCommand, MarketError> {
        Ok(AdvanceRedemptionCommand {
            redemption_id,
            status: parse_enum("redemption status", &self.status)?,
            note: self.note.filter(|n| !n.trim().is_empty()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::PaymentMethod;
    use rust_decimal_macros::dec;

    #[test]
    fn redeem_request_parses_method() {
        let req = RedeemRequest {
            credits: dec!(500),
            payment_method: "bank_transfer".to_string(),
            payment_details: serde_json::Value::Null,
        };
        let Ok(cmd) = req.into_command(AccountId::new()) else {
            panic!("expected command");
        };
        assert_eq!(cmd.payment_method, PaymentMethod::BankTransfer);

        let req = RedeemRequest {
            credits: dec!(5),
            payment_method: "crypto".to_string(),
            payment_details: serde_json::Value::Null,
        };
        assert!(matches!(
            req.into_command(AccountId::new()),
            Err(MarketError::InvalidArgument(_))
        ));
    }

    #[test]
    fn advance_request_drops_blank_note() {
        let req = AdvanceRedemptionRequest {
            status: "rejected".to_string(),
            note: Some("  ".to_string()),
        };
        let Ok(cmd) = req.into_command(RedemptionId::new()) else {
            panic!("expected command");
        };
        assert_eq!(cmd.status, RedemptionStatus::Rejected);
        assert!(cmd.note.is_none());
    }
}
