//! Loan economics calculator
//!
//! Pure projection of a loan request against risk parameters and a price
//! quote. Non-positive amounts or prices yield the all-zero projection, which
//! callers use to represent "no input yet". Every division and multiplication
//! is checked; an arithmetic overflow also degrades to the zero projection
//! rather than panicking.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tierlend_common::{
    ConfigError, InterestMode, LoanProjection, LoanRequest, PriceQuote, DAYS_PER_YEAR,
};

use crate::position::HealthBands;
use crate::risk::RiskParameters;

/// Default liquidation margin applied to the required collateral value
pub const DEFAULT_LIQUIDATION_MARGIN: Decimal = dec!(0.90);

/// Tunable economics, pending confirmation against the settlement contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicsConfig {
    /// Fraction of required collateral value at which liquidation starts
    pub liquidation_margin: Decimal,
    /// Whether total repayment uses flat annual or prorated interest
    pub interest_mode: InterestMode,
    /// Health factor bands for open positions
    pub health_bands: HealthBands,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            liquidation_margin: DEFAULT_LIQUIDATION_MARGIN,
            interest_mode: InterestMode::FlatAnnual,
            health_bands: HealthBands::default(),
        }
    }
}

impl EconomicsConfig {
    /// Set liquidation margin
    pub fn with_liquidation_margin(mut self, margin: Decimal) -> Self {
        self.liquidation_margin = margin;
        self
    }

    /// Set interest mode
    pub fn with_interest_mode(mut self, mode: InterestMode) -> Self {
        self.interest_mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.liquidation_margin <= Decimal::ZERO || self.liquidation_margin > Decimal::ONE {
            return Err(ConfigError::InvalidSetting {
                key: "liquidation_margin".to_string(),
                reason: format!("{} is outside (0, 1]", self.liquidation_margin),
            });
        }
        self.health_bands.validate()
    }
}

/// Projects loan requests into [`LoanProjection`]s
#[derive(Debug, Clone, Default)]
pub struct LoanCalculator {
    config: EconomicsConfig,
}

impl LoanCalculator {
    /// Create a calculator, rejecting invalid economics
    pub fn new(config: EconomicsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EconomicsConfig {
        &self.config
    }

    /// Project a request
    ///
    /// `params` and `quote` are expected to describe `request.asset`.
    pub fn project(
        &self,
        request: &LoanRequest,
        params: &RiskParameters,
        quote: &PriceQuote,
    ) -> LoanProjection {
        if request.amount_usd <= Decimal::ZERO || quote.price_usd <= Decimal::ZERO {
            return LoanProjection::zero();
        }
        self.try_project(request, params, quote)
            .unwrap_or_else(LoanProjection::zero)
    }

    fn try_project(
        &self,
        request: &LoanRequest,
        params: &RiskParameters,
        quote: &PriceQuote,
    ) -> Option<LoanProjection> {
        let amount = request.amount_usd;
        let price = quote.price_usd;

        let collateral_value = amount.checked_div(params.max_ltv)?;
        let collateral_units = collateral_value.checked_div(price)?;

        let annual_interest = amount
            .checked_mul(params.interest_rate_apr)?
            .checked_div(dec!(100))?;
        let term_interest = annual_interest
            .checked_mul(Decimal::from(request.duration_days))?
            .checked_div(Decimal::from(DAYS_PER_YEAR))?;
        let charged_interest = match self.config.interest_mode {
            InterestMode::FlatAnnual => annual_interest,
            InterestMode::Prorated => term_interest,
        };

        let max_by_asset = price.checked_mul(params.max_ltv)?;

        Some(LoanProjection {
            collateral_required_in_asset: collateral_units,
            collateral_value_required_usd: collateral_value,
            annual_interest_usd: annual_interest,
            term_interest_usd: term_interest,
            total_repayment_usd: amount.checked_add(charged_interest)?,
            liquidation_threshold_usd: collateral_value
                .checked_mul(self.config.liquidation_margin)?,
            max_borrowable_usd: max_by_asset.min(params.tier_borrow_ceiling_usd),
            effective_interest_rate_apr: params.interest_rate_apr,
        })
    }
}

/// Project with the default economics
pub fn project(
    request: &LoanRequest,
    params: &RiskParameters,
    quote: &PriceQuote,
) -> LoanProjection {
    LoanCalculator::default().project(request, params, quote)
}
