//! Typed command objects validated at the service boundary.
//!
//! Handlers translate request DTOs into these commands; services call
//! `validate` before touching any store, so shape errors surface as
//! [`MarketError::InvalidArgument`] before any lock is taken.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    AccountId, AccountRole, AuctionId, BidType, NewAuction, PaymentMethod, RedemptionId,
    RedemptionStatus, TransactionReference, TransactionType,
};
use crate::error::MarketError;

fn require_positive(value: Decimal, field: &str) -> Result<(), MarketError> {
    if value <= Decimal::ZERO {
        return Err(MarketError::InvalidArgument(format!(
            "{field} must be positive, got {value}"
        )));
    }
    Ok(())
}

fn require_non_negative(value: Decimal, field: &str) -> Result<(), MarketError> {
    if value < Decimal::ZERO {
        return Err(MarketError::InvalidArgument(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    Ok(())
}

fn require_text(value: &str, field: &str) -> Result<(), MarketError> {
    if value.trim().is_empty() {
        return Err(MarketError::InvalidArgument(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Place a bid on a live auction.
#[derive(Debug, Clone)]
pub struct PlaceBidCommand {
    /// Target auction.
    pub auction_id: AuctionId,
    /// Authenticated bidding account.
    pub bidder_id: AccountId,
    /// Offered amount.
    pub amount: Decimal,
    /// Balance the bid is declared against.
    pub bid_type: BidType,
    /// When set, the bid is rejected with a retryable conflict unless the
    /// auction is still at this version.
    pub expected_version: Option<u64>,
}

impl PlaceBidCommand {
    /// Checks the command shape.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for a non-positive amount.
    pub fn validate(&self) -> Result<(), MarketError> {
        require_positive(self.amount, "bid amount")
    }
}

/// Create a new scheduled auction.
#[derive(Debug, Clone)]
pub struct CreateAuctionCommand {
    /// Short title.
    pub title: String,
    /// Material category.
    pub material_type: String,
    /// Lot size.
    pub quantity: Decimal,
    /// Unit of `quantity`.
    pub unit: String,
    /// Opening price.
    pub starting_bid: Decimal,
    /// Credit threshold for bidders.
    pub minimum_credit_required: Decimal,
    /// Cash threshold for bidders.
    pub minimum_cash_required: Decimal,
    /// Scheduled opening time.
    pub start_time: DateTime<Utc>,
    /// Scheduled closing time.
    pub end_time: DateTime<Utc>,
}

impl CreateAuctionCommand {
    /// Validates the command and converts it into [`NewAuction`].
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for empty text fields,
    /// non-positive quantity or starting bid, negative thresholds, or an end
    /// time not after the start time.
    pub fn validate(self) -> Result<NewAuction, MarketError> {
        require_text(&self.title, "title")?;
        require_text(&self.material_type, "material_type")?;
        require_text(&self.unit, "unit")?;
        require_positive(self.quantity, "quantity")?;
        require_positive(self.starting_bid, "starting_bid")?;
        require_non_negative(self.minimum_credit_required, "minimum_credit_required")?;
        require_non_negative(self.minimum_cash_required, "minimum_cash_required")?;
        if self.end_time <= self.start_time {
            return Err(MarketError::InvalidArgument(
                "end_time must be after start_time".to_string(),
            ));
        }
        Ok(NewAuction {
            title: self.title.trim().to_string(),
            material_type: self.material_type.trim().to_string(),
            quantity: self.quantity,
            unit: self.unit.trim().to_string(),
            starting_bid: self.starting_bid,
            minimum_credit_required: self.minimum_credit_required,
            minimum_cash_required: self.minimum_cash_required,
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }
}

/// Convert credits into a pending cash payout.
#[derive(Debug, Clone)]
pub struct RedeemCommand {
    /// Authenticated account redeeming its credits.
    pub account_id: AccountId,
    /// Credits to convert.
    pub credits: Decimal,
    /// Payout channel.
    pub payment_method: PaymentMethod,
    /// Channel-specific payout details.
    pub payment_details: serde_json::Value,
}

impl RedeemCommand {
    /// Checks the command shape.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for a non-positive amount.
    pub fn validate(&self) -> Result<(), MarketError> {
        require_positive(self.credits, "credits to redeem")
    }
}

/// Administrative status change of a redemption.
#[derive(Debug, Clone)]
pub struct AdvanceRedemptionCommand {
    /// Target redemption.
    pub redemption_id: RedemptionId,
    /// Requested status.
    pub status: RedemptionStatus,
    /// Optional note stored on the redemption.
    pub note: Option<String>,
}

/// Award credits to an account (deposit acceptance, promotions).
#[derive(Debug, Clone)]
pub struct AddCreditsCommand {
    /// Receiving account.
    pub account_id: AccountId,
    /// Credits to add.
    pub amount: Decimal,
    /// `Earned` for deposits, `Bonus` for promotions.
    pub kind: TransactionType,
    /// Human-readable source description.
    pub description: String,
    /// Originating record (usually the deposit).
    pub reference: Option<TransactionReference>,
}

impl AddCreditsCommand {
    /// Checks the command shape.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for a non-positive amount, an
    /// empty description, or a kind other than `earned` or `bonus`.
    pub fn validate(&self) -> Result<(), MarketError> {
        require_positive(self.amount, "credit amount")?;
        require_text(&self.description, "source")?;
        if !matches!(self.kind, TransactionType::Earned | TransactionType::Bonus) {
            return Err(MarketError::InvalidArgument(format!(
                "credits can only be added as earned or bonus, got {}",
                self.kind
            )));
        }
        Ok(())
    }
}

/// Register a participant.
#[derive(Debug, Clone)]
pub struct OpenAccountCommand {
    /// Identifier to use; generated when absent.
    pub account_id: Option<AccountId>,
    /// Participant role.
    pub role: AccountRole,
    /// Display name.
    pub display_name: String,
    /// Initial cash funding recorded as a cash adjustment.
    pub opening_cash: Option<Decimal>,
}

impl OpenAccountCommand {
    /// Checks the command shape.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for an empty display name or
    /// negative opening cash.
    pub fn validate(&self) -> Result<(), MarketError> {
        require_text(&self.display_name, "display_name")?;
        if let Some(cash) = self.opening_cash {
            require_non_negative(cash, "opening_cash")?;
        }
        Ok(())
    }
}

/// Administrative cash balance change.
#[derive(Debug, Clone)]
pub struct AdjustCashCommand {
    /// Target account.
    pub account_id: AccountId,
    /// Signed amount.
    pub amount: Decimal,
    /// Reason for the change.
    pub description: String,
}

impl AdjustCashCommand {
    /// Checks the command shape.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidArgument`] for a zero amount or an empty
    /// description.
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.amount.is_zero() {
            return Err(MarketError::InvalidArgument(
                "cash adjustment must be non-zero".to_string(),
            ));
        }
        require_text(&self.description, "description")
    }
}
