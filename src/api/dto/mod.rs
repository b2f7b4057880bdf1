//! Data Transfer Objects for REST request/response serialization.
//!
//! Monetary amounts are `rust_decimal::Decimal` and serialize as JSON
//! strings. Enumerated request fields arrive as strings and are parsed
//! into domain types so unknown values surface as `invalid_argument`
//! errors in the standard envelope.

pub mod account_dto;
pub mod auction_dto;
pub mod common_dto;
pub mod redemption_dto;

pub use account_dto::*;
pub use auction_dto::*;
pub use common_dto::*;
pub use redemption_dto::*;
