//! Open loan positions
//!
//! Tracks an opened loan against current prices:
//! - health factor = collateral value * liquidation margin / loan amount
//! - band (Safe, Moderate, Risky, Critical) from configurable cut-offs
//! - repayment progress and days remaining

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tierlend_common::{AssetSymbol, ConfigError, LoanProjection, LoanRequest, PriceSnapshot};

/// Health factor cut-offs, each a lower bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBands {
    pub safe: Decimal,
    pub moderate: Decimal,
    pub risky: Decimal,
}

impl Default for HealthBands {
    fn default() -> Self {
        Self {
            safe: dec!(2.0),
            moderate: dec!(1.5),
            risky: dec!(1.2),
        }
    }
}

impl HealthBands {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.safe > self.moderate && self.moderate > self.risky && self.risky > Decimal::ZERO)
        {
            return Err(ConfigError::InvalidSetting {
                key: "health_bands".to_string(),
                reason: format!(
                    "bands must descend and stay positive (got {}/{}/{})",
                    self.safe, self.moderate, self.risky
                ),
            });
        }
        Ok(())
    }

    /// Band for a health factor
    pub fn classify(&self, health_factor: Decimal) -> HealthBand {
        if health_factor >= self.safe {
            HealthBand::Safe
        } else if health_factor >= self.moderate {
            HealthBand::Moderate
        } else if health_factor >= self.risky {
            HealthBand::Risky
        } else {
            HealthBand::Critical
        }
    }
}

/// Position health classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    Safe,
    Moderate,
    Risky,
    Critical,
}

/// Lifecycle state reported by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Repaid,
    Defaulted,
    Liquidated,
}

/// Health of an active position at current prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionHealth {
    pub collateral_value_usd: Decimal,
    pub health_factor: Decimal,
    pub band: HealthBand,
    /// Collateral value is at or below the liquidation threshold
    pub liquidatable: bool,
    /// Price came from the reference table, not a live source
    pub price_is_fallback: bool,
}

/// An opened loan, as tracked client-side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPosition {
    pub asset: AssetSymbol,
    pub collateral_units: Decimal,
    pub loan_amount_usd: Decimal,
    pub total_owed_usd: Decimal,
    pub repaid_usd: Decimal,
    pub liquidation_threshold_usd: Decimal,
    /// Share of collateral value counted toward the health factor
    pub liquidation_margin: Decimal,
    pub duration_days: u32,
    pub started_at: DateTime<Utc>,
    pub status: LoanStatus,
}

impl LoanPosition {
    /// Open a position from an accepted request and its projection
    pub fn open(
        request: &LoanRequest,
        projection: &LoanProjection,
        liquidation_margin: Decimal,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            asset: request.asset,
            collateral_units: projection.collateral_required_in_asset,
            loan_amount_usd: request.amount_usd,
            total_owed_usd: projection.total_repayment_usd,
            repaid_usd: Decimal::ZERO,
            liquidation_threshold_usd: projection.liquidation_threshold_usd,
            liquidation_margin,
            duration_days: request.duration_days,
            started_at,
            status: LoanStatus::Active,
        }
    }

    /// Record a repayment, marking the loan repaid once fully covered
    pub fn record_repayment(&mut self, amount_usd: Decimal) {
        if amount_usd <= Decimal::ZERO || self.status != LoanStatus::Active {
            return;
        }
        self.repaid_usd = (self.repaid_usd + amount_usd).min(self.total_owed_usd);
        if self.repaid_usd >= self.total_owed_usd {
            self.status = LoanStatus::Repaid;
        }
    }

    /// Outstanding balance
    pub fn remaining_usd(&self) -> Decimal {
        (self.total_owed_usd - self.repaid_usd).max(Decimal::ZERO)
    }

    /// Share of the total owed already repaid, 0-100
    pub fn repayment_percentage(&self) -> Decimal {
        if self.total_owed_usd <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.repaid_usd * dec!(100) / self.total_owed_usd).min(dec!(100))
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.started_at + Duration::days(self.duration_days as i64)
    }

    /// Whole days until due, zero once overdue
    pub fn days_left(&self, now: DateTime<Utc>) -> u32 {
        let remaining = self.due_at() - now;
        remaining.num_days().max(0) as u32
    }

    /// Health at the snapshot's price; `None` unless the loan is active
    ///
    /// The factor weighs collateral value by the liquidation margin against
    /// the borrowed amount, so it depends on the LTV the loan was opened at.
    pub fn health(&self, snapshot: &PriceSnapshot, bands: &HealthBands) -> Option<PositionHealth> {
        if self.status != LoanStatus::Active || self.loan_amount_usd <= Decimal::ZERO {
            return None;
        }
        let quote = snapshot.quote(self.asset);
        let collateral_value_usd = self.collateral_units.checked_mul(quote.price_usd)?;
        let health_factor = collateral_value_usd
            .checked_mul(self.liquidation_margin)?
            .checked_div(self.loan_amount_usd)?;

        Some(PositionHealth {
            collateral_value_usd,
            health_factor,
            band: bands.classify(health_factor),
            liquidatable: collateral_value_usd <= self.liquidation_threshold_usd,
            price_is_fallback: quote.is_fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{project, DEFAULT_LIQUIDATION_MARGIN};
    use crate::risk::RiskTable;
    use tierlend_common::{PriceQuote, Tier};

    fn snapshot_with_eth(price: Decimal) -> PriceSnapshot {
        let now = Utc::now();
        PriceSnapshot::from_quotes(1, [PriceQuote::live(AssetSymbol::Eth, price, now)], now)
    }

    fn open_position(tier: Tier, asset: AssetSymbol, amount: Decimal) -> LoanPosition {
        let params = RiskTable::reference().params(tier, asset);
        let request = LoanRequest::new(amount, asset, tier);
        let quote = PriceQuote::live(asset, asset.fallback_price_usd(), Utc::now());
        let projection = project(&request, &params, &quote);
        LoanPosition::open(&request, &projection, DEFAULT_LIQUIDATION_MARGIN, Utc::now())
    }

    fn open_eth_position() -> LoanPosition {
        open_position(Tier::Bronze, AssetSymbol::Eth, dec!(1000))
    }

    fn assert_close(actual: Decimal, expected: Decimal) {
        assert!(
            (actual - expected).abs() < dec!(0.001),
            "expected ~{expected}, got {actual}"
        );
    }

    #[test]
    fn test_band_classification() {
        let bands = HealthBands::default();
        assert_eq!(bands.classify(dec!(2.5)), HealthBand::Safe);
        assert_eq!(bands.classify(dec!(1.75)), HealthBand::Moderate);
        assert_eq!(bands.classify(dec!(1.2)), HealthBand::Risky);
        assert_eq!(bands.classify(dec!(1.09)), HealthBand::Critical);
    }

    #[test]
    fn test_invalid_bands() {
        let bands = HealthBands {
            safe: dec!(1.0),
            moderate: dec!(1.5),
            risky: dec!(1.2),
        };
        assert!(bands.validate().is_err());
    }

    #[test]
    fn test_health_at_opening_price() {
        let position = open_eth_position();
        let health = position
            .health(&snapshot_with_eth(dec!(3500)), &HealthBands::default())
            .unwrap();

        // 0.90 margin over a 0.60 LTV
        assert_close(health.health_factor, dec!(1.5));
        assert_close(health.collateral_value_usd, dec!(1666.667));
        assert!(!health.liquidatable);
        assert!(!health.price_is_fallback);
    }

    #[test]
    fn test_health_factor_tracks_ltv() {
        let snapshot = PriceSnapshot::reference(Utc::now());
        let bands = HealthBands::default();

        let bronze_eth = open_position(Tier::Bronze, AssetSymbol::Eth, dec!(1000))
            .health(&snapshot, &bands)
            .unwrap();
        let diamond_eth = open_position(Tier::Diamond, AssetSymbol::Eth, dec!(1000))
            .health(&snapshot, &bands)
            .unwrap();
        let diamond_usdc = open_position(Tier::Diamond, AssetSymbol::Usdc, dec!(0.5))
            .health(&snapshot, &bands)
            .unwrap();

        assert_close(diamond_eth.health_factor, dec!(1.125));
        assert_close(diamond_usdc.health_factor, dec!(0.947));
        assert!(bronze_eth.health_factor > diamond_eth.health_factor);
        assert!(diamond_eth.health_factor > diamond_usdc.health_factor);
        assert_eq!(diamond_usdc.band, HealthBand::Critical);
    }

    #[test]
    fn test_health_after_price_rise() {
        let position = open_eth_position();
        let health = position
            .health(&snapshot_with_eth(dec!(5000)), &HealthBands::default())
            .unwrap();

        // 5000 / 3500 * 1.5
        assert_close(health.health_factor, dec!(2.1429));
        assert_eq!(health.band, HealthBand::Safe);
    }

    #[test]
    fn test_health_after_price_drop() {
        let position = open_eth_position();
        let health = position
            .health(&snapshot_with_eth(dec!(3000)), &HealthBands::default())
            .unwrap();
        assert!(health.liquidatable);
        assert_eq!(health.band, HealthBand::Risky);
    }

    #[test]
    fn test_repayment_progress() {
        let mut position = open_eth_position();
        assert_eq!(position.total_owed_usd, dec!(1085));

        position.record_repayment(dec!(217));
        assert_eq!(position.repayment_percentage(), dec!(20));
        assert_eq!(position.remaining_usd(), dec!(868));
        assert_eq!(position.status, LoanStatus::Active);

        position.record_repayment(dec!(5000));
        assert_eq!(position.status, LoanStatus::Repaid);
        assert_eq!(position.remaining_usd(), Decimal::ZERO);
        assert!(position
            .health(&snapshot_with_eth(dec!(3500)), &HealthBands::default())
            .is_none());
    }

    #[test]
    fn test_days_left() {
        let position = open_eth_position();
        let now = position.started_at + Duration::days(10);
        assert_eq!(position.days_left(now), 20);
        assert_eq!(position.days_left(position.started_at + Duration::days(45)), 0);
    }
}
