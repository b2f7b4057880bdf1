//! Account and ledger DTOs.

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{parse_enum, parse_optional_enum, parse_text};
use crate::domain::{
    AccountId, BidStatus, HistoryQuery, ReferenceType, TransactionReference, TransactionType,
};
use crate::error::MarketError;
use crate::service::{AddCreditsCommand, AdjustCashCommand, OpenAccountCommand};

/// Request body for `POST /accounts`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenAccountRequest {
    /// Identifier to use, usually the upstream user ID. Generated when
    /// absent.
    #[serde(default)]
    pub account_id: Option<uuid::Uuid>,
    /// `individual`, `company` or `administrator`.
    pub role: String,
    /// Display name.
    pub display_name: String,
    /// Initial cash balance.
    #[serde(default)]
    pub opening_cash: Option<Decimal>,
}

impl TryFrom<OpenAccountRequest> for OpenAccountCommand {
    type Error = MarketError;

    fn try_from(req: OpenAccountRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            account_id: req.account_id.map(AccountId::from_uuid),
            role: parse_enum("account role", &req.role)?,
            display_name: req.display_name,
            opening_cash: req.opening_cash,
        })
    }
}

/// Request body for `POST /accounts/{id}/credits`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCreditsRequest {
    /// Credits to add.
    pub amount: Decimal,
    /// Where the credits come from (e.g. the deposit description).
    pub source: String,
    /// `earned` (default) or `bonus`.
    #[serde(default)]
    pub kind: Option<String>,
    /// Deposit the credits were earned for.
    #[serde(default)]
    pub deposit_id: Option<uuid::Uuid>,
}

impl AddCreditsRequest {
    /// Builds the command for `account_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an unknown kind.
    pub fn into_command(self, account_id: AccountId) -> Result<AddCreditsCommand, MarketError> {
        let kind = match self.kind.as_deref() {
            Some(raw) => parse_text(raw)?,
            None => TransactionType::Earned,
        };
        Ok(AddCreditsCommand {
            account_id,
            amount: self.amount,
            kind,
            description: self.source,
            reference: self
                .deposit_id
                .map(|id| TransactionReference::new(id, ReferenceType::Deposit)),
        })
    }
}

/// Request body for `POST /accounts/{id}/cash`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustCashRequest {
    /// Signed amount.
    pub amount: Decimal,
    /// Reason for the change.
    pub description: String,
}

impl AdjustCashRequest {
    /// Builds the command for `account_id`.
    #[must_use]
    pub fn into_command(self, account_id: AccountId) -> AdjustCashCommand {
        AdjustCashCommand {
            account_id,
            amount: self.amount,
            description: self.description,
        }
    }
}

/// Query parameters for `GET /accounts/{id}/transactions`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionsQuery {
    /// Restrict to one transaction type.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Page number (1-indexed). Defaults to 1.
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20.
    pub limit: Option<u32>,
}

impl TransactionsQuery {
    /// Converts the query into a ledger history query.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an unknown type.
    pub fn into_history_query(self) -> Result<HistoryQuery, MarketError> {
        let defaults = HistoryQuery::default();
        Ok(HistoryQuery {
            kind: self.kind.as_deref().map(parse_text).transpose()?,
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
        .clamped())
    }
}

/// Query parameters for `GET /accounts/{id}/bids`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserBidsQuery {
    /// `active`, `outbid`, `won` or `lost`.
    pub status: Option<String>,
}

impl UserBidsQuery {
    /// Parses the status filter.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an unknown status.
    pub fn status(&self) -> Result<Option<BidStatus>, MarketError> {
        parse_optional_enum("bid status", self.status.as_deref())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::AccountRole;
    use rust_decimal_macros::dec;

    #[test]
    fn transactions_query_defaults_and_clamps() {
        let Ok(query) = TransactionsQuery::default().into_history_query() else {
            panic!("expected query");
        };
        assert_eq!((query.page, query.limit), (1, 20));

        let Ok(query) = (TransactionsQuery {
            kind: Some("redeemed".to_string()),
            page: Some(0),
            limit: Some(1000),
        })
        .into_history_query() else {
            panic!("expected query");
        };
        assert_eq!(query.kind, Some(TransactionType::Redeemed));
        assert_eq!((query.page, query.limit), (1, 100));
    }

    #[test]
    fn credits_default_to_earned_with_deposit_reference() {
        let deposit = uuid::Uuid::new_v4();
        let req = AddCreditsRequest {
            amount: dec!(12),
            source: "8 kg cardboard".to_string(),
            kind: None,
            deposit_id: Some(deposit),
        };
        let Ok(cmd) = req.into_command(AccountId::new()) else {
            panic!("expected command");
        };
        assert_eq!(cmd.kind, TransactionType::Earned);
        assert_eq!(cmd.reference.map(|r| r.reference_id), Some(deposit));
    }

    #[test]
    fn open_account_parses_role() {
        let req = OpenAccountRequest {
            account_id: None,
            role: "company".to_string(),
            display_name: "Recyco".to_string(),
            opening_cash: None,
        };
        let Ok(cmd) = OpenAccountCommand::try_from(req) else {
            panic!("expected command");
        };
        assert_eq!(cmd.role, AccountRole::Company);
    }
}
