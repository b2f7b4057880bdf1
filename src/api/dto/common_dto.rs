//! Shared DTO types and request parsing helpers.

use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use utoipa::ToSchema;

use crate::error::MarketError;

/// Parses a request string through the type's `FromStr`, mapping failures
/// to [`MarketError::InvalidArgument`].
///
/// # Errors
///
/// Returns [`MarketError::InvalidArgument`] with the parser's message.
pub fn parse_text<T>(raw: &str) -> Result<T, MarketError>
where
    T: FromStr<Err = String>,
{
    raw.trim().parse().map_err(MarketError::InvalidArgument)
}

/// Parses a `snake_case` enum name through its serde representation.
///
/// # Errors
///
/// Returns [`MarketError::InvalidArgument`] naming `field` and the value.
pub fn parse_enum<T>(field: &str, raw: &str) -> Result<T, MarketError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string()))
        .map_err(|_| MarketError::InvalidArgument(format!("unknown {field}: {raw}")))
}

/// Parses an optional enum query parameter.
///
/// # Errors
///
/// Same as [`parse_enum`].
pub fn parse_optional_enum<T>(field: &str, raw: Option<&str>) -> Result<Option<T>, MarketError>
where
    T: DeserializeOwned,
{
    raw.map(|value| parse_enum(field, value)).transpose()
}

/// List wrapper for collection responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListResponse<T> {
    /// Items in response order.
    pub data: Vec<T>,
    /// Number of items.
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            total: data.len(),
            data,
        }
    }
}
