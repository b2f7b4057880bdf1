//! Marketplace error types with HTTP status code mapping.
//!
//! [`MarketError`] is the central error type for the service. Each variant
//! belongs to one [`ErrorKind`], maps to a numeric code and an HTTP status,
//! and renders as a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{AccountId, AuctionId, RedemptionId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1003,
///     "kind": "invalid_argument",
///     "message": "bid must exceed current bid of 100",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code, kind and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details (e.g. individual eligibility reasons).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Error category shared by every [`MarketError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A referenced auction, account, bid or redemption does not exist.
    NotFound,
    /// The target is not in a state that allows the operation.
    InvalidState,
    /// The request carried an invalid value.
    InvalidArgument,
    /// The caller is not allowed to perform the operation.
    Forbidden,
    /// A balance check failed.
    InsufficientFunds,
    /// A concurrent mutation won the race. Retryable.
    Conflict,
    /// Infrastructure failure.
    Internal,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category                 | HTTP Status               |
/// |-----------|--------------------------|---------------------------|
/// | 1000–1999 | Validation               | 400 Bad Request           |
/// | 2000–2099 | Not Found                | 404 Not Found             |
/// | 2100–2299 | State / Conflict         | 409 Conflict              |
/// | 3000–3999 | Server                   | 500 Internal Server Error |
/// | 4000–4999 | Balance / Permission     | 403 / 422                 |
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// Auction with the given ID was not found.
    #[error("auction not found: {0}")]
    AuctionNotFound(AuctionId),

    /// Account with the given ID was not found.
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// Redemption with the given ID was not found.
    #[error("redemption not found: {0}")]
    RedemptionNotFound(RedemptionId),

    /// Request validation failed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The target exists but is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The account does not meet the auction's balance thresholds.
    #[error("account not eligible: {}", reasons.join("; "))]
    NotEligible {
        /// One entry per failing threshold.
        reasons: Vec<String>,
    },

    /// The acting account lacks the role required for the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A balance check failed.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Optimistic concurrency check failed; re-read and resubmit.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AuctionNotFound(_) | Self::AccountNotFound(_) | Self::RedemptionNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::NotEligible { .. } | Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::PersistenceError(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns `true` if the caller may re-read state and resubmit.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidArgument(_) => 1001,
            Self::AuctionNotFound(_) => 2001,
            Self::AccountNotFound(_) => 2002,
            Self::RedemptionNotFound(_) => 2003,
            Self::InvalidState(_) => 2101,
            Self::Conflict(_) => 2201,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::NotEligible { .. } => 4001,
            Self::InsufficientFunds(_) => 4002,
            Self::Forbidden(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidState | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let details = match &self {
            Self::NotEligible { reasons } => Some(reasons.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                kind: self.kind(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_eligible_maps_to_forbidden() {
        let err = MarketError::NotEligible {
            reasons: vec!["Insufficient credits. Required: 50, Current: 40".to_string()],
        };
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("Required: 50"));
    }

    #[test]
    fn only_conflict_is_retryable() {
        assert!(MarketError::Conflict("stale version".to_string()).is_retryable());
        assert!(!MarketError::InvalidState("closed".to_string()).is_retryable());
        assert!(!MarketError::InsufficientFunds("x".to_string()).is_retryable());
    }

    #[test]
    fn not_found_variants_share_status() {
        let a = MarketError::AuctionNotFound(AuctionId::new());
        let b = MarketError::AccountNotFound(AccountId::new());
        assert_eq!(a.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(b.status_code(), StatusCode::NOT_FOUND);
        assert_ne!(a.error_code(), b.error_code());
    }

    #[test]
    fn insufficient_funds_is_unprocessable() {
        let err = MarketError::InsufficientFunds("current 10, requested 20".to_string());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), 4002);
    }
}
