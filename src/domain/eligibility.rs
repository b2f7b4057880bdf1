//! Balance-threshold eligibility check.
//!
//! [`check_eligibility`] is a pure function: the same balances and the same
//! auction always produce the same [`Eligibility`].

use serde::Serialize;
use utoipa::ToSchema;

use super::{Auction, Balance};

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Eligibility {
    /// `true` when every threshold is met.
    pub eligible: bool,
    /// One entry per failing threshold, citing required and current values.
    pub reasons: Vec<String>,
}

/// Compares an account's balances against an auction's minimum thresholds.
#[must_use]
pub fn check_eligibility(balance: &Balance, auction: &Auction) -> Eligibility {
    let mut reasons = Vec::new();

    if balance.credit_balance < auction.minimum_credit_required {
        reasons.push(format!(
            "Insufficient credits. Required: {}, Current: {}",
            auction.minimum_credit_required, balance.credit_balance
        ));
    }
    if balance.cash_balance < auction.minimum_cash_required {
        reasons.push(format!(
            "Insufficient cash. Required: {}, Current: {}",
            auction.minimum_cash_required, balance.cash_balance
        ));
    }

    Eligibility {
        eligible: reasons.is_empty(),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, NewAuction};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn auction(min_credit: rust_decimal::Decimal, min_cash: rust_decimal::Decimal) -> Auction {
        let now = Utc::now();
        Auction::new(NewAuction {
            title: "Glass cullet".to_string(),
            material_type: "glass".to_string(),
            quantity: dec!(2),
            unit: "t".to_string(),
            starting_bid: dec!(100),
            minimum_credit_required: min_credit,
            minimum_cash_required: min_cash,
            start_time: now,
            end_time: now + Duration::hours(1),
        })
    }

    fn balance(credit: rust_decimal::Decimal, cash: rust_decimal::Decimal) -> Balance {
        Balance {
            account_id: AccountId::new(),
            credit_balance: credit,
            cash_balance: cash,
        }
    }

    #[test]
    fn meets_both_thresholds() {
        let result = check_eligibility(&balance(dec!(50), dec!(10)), &auction(dec!(50), dec!(10)));
        assert!(result.eligible);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn credit_shortfall_cites_required_and_current() {
        let result = check_eligibility(&balance(dec!(40), dec!(0)), &auction(dec!(50), dec!(0)));
        assert!(!result.eligible);
        assert_eq!(
            result.reasons,
            vec!["Insufficient credits. Required: 50, Current: 40".to_string()]
        );
    }

    #[test]
    fn reports_every_failing_dimension() {
        let result = check_eligibility(&balance(dec!(1), dec!(2)), &auction(dec!(5), dec!(7)));
        assert!(!result.eligible);
        assert_eq!(result.reasons.len(), 2);
        assert!(result.reasons.iter().any(|r| r.starts_with("Insufficient cash")));
    }

    #[test]
    fn repeated_checks_are_identical() {
        let b = balance(dec!(40), dec!(0));
        let a = auction(dec!(50), dec!(0));
        assert_eq!(check_eligibility(&b, &a), check_eligibility(&b, &a));
    }
}
