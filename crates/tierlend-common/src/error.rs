//! Error types for the Tierlend engine
//!
//! Provides a unified error type and domain-specific error variants.
//! Configuration errors are fatal at construction, validation errors are
//! returned to the caller, and price feed errors are recovered locally by
//! falling back to reference prices.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::tier::Tier;

/// Result type alias using LendingError
pub type Result<T> = std::result::Result<T, LendingError>;

/// Unified error type for Tierlend operations
#[derive(Debug, Error)]
pub enum LendingError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Loan request validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // Price feed errors
    #[error("Price feed error: {0}")]
    PriceFeed(#[from] PriceFeedError),

    // Wallet session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration errors, raised while building tables and settings
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Malformed risk table: {0}")]
    MalformedRiskTable(String),

    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },
}

/// Loan request validation failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Tier mismatch: requested {requested}, classified {actual}")]
    TierMismatch { requested: Tier, actual: Tier },

    #[error("Amount {amount} exceeds maximum borrowable {ceiling}")]
    AmountExceedsCeiling { amount: Decimal, ceiling: Decimal },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Unsupported loan duration: {0} days")]
    UnsupportedDuration(u32),
}

/// Failures while fetching a single asset price
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PriceFeedError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Response carried no price for {0}")]
    MissingPrice(String),

    #[error("Implausible price {price} for {asset}")]
    Implausible { asset: String, price: String },

    #[error("Fetch timed out after {0}ms")]
    Timeout(u64),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Wallet session errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Reputation lookup failed: {0}")]
    ReputationUnavailable(String),
}

impl From<serde_json::Error> for LendingError {
    fn from(err: serde_json::Error) -> Self {
        LendingError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for LendingError {
    fn from(err: anyhow::Error) -> Self {
        LendingError::Internal(err.to_string())
    }
}
