//! Loan Types - request in, projection out
//!
//! A [`LoanRequest`] is transient user input. A [`LoanProjection`] is derived
//! from (request, risk parameters, price quote) and carries no identity of its
//! own; it is recomputed on every input change.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{asset::AssetSymbol, tier::Tier};

/// Loan durations offered to borrowers, in days
pub const ALLOWED_DURATIONS_DAYS: [u32; 7] = [7, 14, 30, 60, 90, 180, 365];

/// Default loan duration in days
pub const DEFAULT_DURATION_DAYS: u32 = 30;

/// How interest feeds the total repayment figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestMode {
    /// One full year of interest regardless of duration
    #[default]
    FlatAnnual,
    /// Annual interest scaled by `duration_days / 365`
    Prorated,
}

/// Requested loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    /// Borrowed amount in USD
    pub amount_usd: Decimal,

    /// Collateral asset
    pub asset: AssetSymbol,

    /// Tier the request is priced at
    pub tier: Tier,

    /// Loan duration in days
    pub duration_days: u32,
}

impl LoanRequest {
    /// Create a new loan request with the default duration
    pub fn new(amount_usd: Decimal, asset: AssetSymbol, tier: Tier) -> Self {
        Self {
            amount_usd,
            asset,
            tier,
            duration_days: DEFAULT_DURATION_DAYS,
        }
    }

    /// Set loan duration
    pub fn with_duration(mut self, duration_days: u32) -> Self {
        self.duration_days = duration_days;
        self
    }

    /// Whether the duration is one of the offered terms
    pub fn has_allowed_duration(&self) -> bool {
        ALLOWED_DURATIONS_DAYS.contains(&self.duration_days)
    }
}

/// Derived loan economics
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoanProjection {
    /// Collateral needed, in units of the collateral asset
    pub collateral_required_in_asset: Decimal,

    /// Collateral needed, in USD
    pub collateral_value_required_usd: Decimal,

    /// Interest for one full year
    pub annual_interest_usd: Decimal,

    /// Interest for the requested term only
    pub term_interest_usd: Decimal,

    /// Principal plus interest, per the configured [`InterestMode`]
    pub total_repayment_usd: Decimal,

    /// Collateral value at which the loan becomes liquidatable
    pub liquidation_threshold_usd: Decimal,

    /// Lesser of the per-unit asset capacity and the tier ceiling
    pub max_borrowable_usd: Decimal,

    /// APR applied, in percent
    pub effective_interest_rate_apr: Decimal,
}

impl LoanProjection {
    /// The degenerate projection used for "no input yet"
    pub fn zero() -> Self {
        Self::default()
    }

    /// Whether every figure is zero
    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}
