//! Acting-account extraction.
//!
//! Authentication happens upstream; the gateway in front of this service
//! forwards the authenticated account in the `X-Account-Id` header. Roles
//! are never read from the request, handlers look them up in the ledger.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::AccountId;
use crate::error::MarketError;

/// Header carrying the acting account's UUID.
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// The account on whose behalf a request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountContext {
    /// Acting account.
    pub account_id: AccountId,
}

impl AccountContext {
    /// Fails with [`MarketError::Forbidden`] unless the acting account is
    /// `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Forbidden`] for any other account.
    pub fn require_self(&self, owner: AccountId) -> Result<(), MarketError> {
        if self.account_id != owner {
            return Err(MarketError::Forbidden(format!(
                "account {} cannot act for account {owner}",
                self.account_id
            )));
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for AccountContext
where
    S: Send + Sync,
{
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACCOUNT_HEADER)
            .ok_or_else(|| MarketError::Forbidden("missing X-Account-Id header".to_string()))?;
        let text = raw.to_str().map_err(|_| {
            MarketError::InvalidArgument("X-Account-Id header is not valid ASCII".to_string())
        })?;
        let uuid = Uuid::parse_str(text.trim()).map_err(|e| {
            MarketError::InvalidArgument(format!("X-Account-Id header is not a UUID: {e}"))
        })?;
        Ok(Self {
            account_id: AccountId::from_uuid(uuid),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<AccountContext, MarketError> {
        let mut builder = Request::builder().uri("/api/v1/auctions");
        if let Some(value) = header {
            builder = builder.header("X-Account-Id", value);
        }
        let Ok(request) = builder.body(()) else {
            panic!("request should build");
        };
        let (mut parts, ()) = request.into_parts();
        AccountContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_account_from_header() {
        let id = Uuid::new_v4();
        let Ok(ctx) = extract(Some(&id.to_string())).await else {
            panic!("expected context");
        };
        assert_eq!(ctx.account_id, AccountId::from_uuid(id));
        assert!(ctx.require_self(AccountId::from_uuid(id)).is_ok());
        assert!(ctx.require_self(AccountId::new()).is_err());
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_rejected() {
        assert!(matches!(extract(None).await, Err(MarketError::Forbidden(_))));
        assert!(matches!(
            extract(Some("not-a-uuid")).await,
            Err(MarketError::InvalidArgument(_))
        ));
    }
}
