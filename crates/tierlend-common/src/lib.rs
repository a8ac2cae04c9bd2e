//! # Tierlend Common
//!
//! Shared types, errors, and protocol constants for the Tierlend lending
//! calculator.
//!
//! ## Core Types
//!
//! - [`Tier`]: reputation-derived risk class (Bronze .. Diamond)
//! - [`ReputationScore`]: clamped 0-1000 borrower score
//! - [`AssetSymbol`]: supported collateral assets and their reference data
//! - [`LoanRequest`]/[`LoanProjection`]: calculator input and output
//! - [`PriceQuote`]/[`PriceSnapshot`]: reconciled USD prices
//! - [`WalletSession`]: explicit wallet connection state
//!
//! ## Errors
//!
//! - [`LendingError`]: unified error with configuration, validation and
//!   price feed variants

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigError, LendingError, PriceFeedError, Result, SessionError, ValidationError};
pub use types::{
    asset::AssetSymbol,
    loan::{InterestMode, LoanProjection, LoanRequest, ALLOWED_DURATIONS_DAYS},
    quote::{PriceQuote, PriceSnapshot, SnapshotStatus},
    session::{ProviderFamily, ReputationSource, StaticReputation, WalletProvider, WalletSession},
    tier::{classify, ReputationScore, Tier, TierProgress},
};

/// Tierlend version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum reputation score value
pub const MAX_REPUTATION_SCORE: u16 = 1000;

/// Minimum reputation score value
pub const MIN_REPUTATION_SCORE: u16 = 0;

/// Days per year used for interest proration
pub const DAYS_PER_YEAR: u32 = 365;
