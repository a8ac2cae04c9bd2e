//! Risk parameter table
//!
//! Every (tier, asset) pair resolves to a [`RiskParameters`] record. The table
//! is validated once at construction:
//! - all 25 pairs present
//! - `max_ltv` in (0, 1], `interest_rate_apr >= 0`, ceilings positive
//! - per asset, LTV non-decreasing and APR non-increasing as tier rises
//! - tier borrow ceilings strictly increasing
//!
//! A table that fails any check is a configuration error, never a runtime one.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tierlend_common::{AssetSymbol, ConfigError, Tier};
use tracing::{debug, instrument};

/// Borrowing terms for one (tier, asset) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParameters {
    pub tier: Tier,
    pub asset: AssetSymbol,

    /// Loan-to-value ceiling, fraction in (0, 1]
    pub max_ltv: Decimal,

    /// Annual interest rate in percent
    pub interest_rate_apr: Decimal,

    /// Tier-level maximum borrowable amount in USD
    pub tier_borrow_ceiling_usd: Decimal,
}

/// LTV and APR for one asset inside a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct AssetTerms {
    max_ltv: Decimal,
    interest_rate_apr: Decimal,
}

/// On-disk shape of a risk table
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RiskTableFile {
    tiers: BTreeMap<String, TierEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TierEntry {
    borrow_ceiling_usd: Decimal,
    assets: BTreeMap<String, AssetTerms>,
}

/// Read-only risk parameter table
#[derive(Debug, Clone)]
pub struct RiskTable {
    ceilings: BTreeMap<Tier, Decimal>,
    terms: BTreeMap<(Tier, AssetSymbol), AssetTerms>,
}

/// Reference terms: (tier, ceiling, [(asset, ltv, apr)])
const REFERENCE_TERMS: [(Tier, Decimal, [(AssetSymbol, Decimal, Decimal); 5]); 5] = [
    (
        Tier::Bronze,
        dec!(10000),
        [
            (AssetSymbol::Eth, dec!(0.60), dec!(8.5)),
            (AssetSymbol::Usdc, dec!(0.85), dec!(6.5)),
            (AssetSymbol::Usdt, dec!(0.85), dec!(6.5)),
            (AssetSymbol::Dai, dec!(0.80), dec!(7.0)),
            (AssetSymbol::Wbtc, dec!(0.55), dec!(9.0)),
        ],
    ),
    (
        Tier::Silver,
        dec!(25000),
        [
            (AssetSymbol::Eth, dec!(0.65), dec!(7.0)),
            (AssetSymbol::Usdc, dec!(0.87), dec!(5.5)),
            (AssetSymbol::Usdt, dec!(0.87), dec!(5.5)),
            (AssetSymbol::Dai, dec!(0.82), dec!(6.0)),
            (AssetSymbol::Wbtc, dec!(0.60), dec!(7.5)),
        ],
    ),
    (
        Tier::Gold,
        dec!(50000),
        [
            (AssetSymbol::Eth, dec!(0.70), dec!(5.5)),
            (AssetSymbol::Usdc, dec!(0.90), dec!(4.5)),
            (AssetSymbol::Usdt, dec!(0.90), dec!(4.5)),
            (AssetSymbol::Dai, dec!(0.85), dec!(5.0)),
            (AssetSymbol::Wbtc, dec!(0.65), dec!(6.0)),
        ],
    ),
    (
        Tier::Platinum,
        dec!(100000),
        [
            (AssetSymbol::Eth, dec!(0.75), dec!(4.0)),
            (AssetSymbol::Usdc, dec!(0.92), dec!(3.5)),
            (AssetSymbol::Usdt, dec!(0.92), dec!(3.5)),
            (AssetSymbol::Dai, dec!(0.87), dec!(4.0)),
            (AssetSymbol::Wbtc, dec!(0.70), dec!(4.5)),
        ],
    ),
    (
        Tier::Diamond,
        dec!(250000),
        [
            (AssetSymbol::Eth, dec!(0.80), dec!(3.0)),
            (AssetSymbol::Usdc, dec!(0.95), dec!(2.5)),
            (AssetSymbol::Usdt, dec!(0.95), dec!(2.5)),
            (AssetSymbol::Dai, dec!(0.90), dec!(3.0)),
            (AssetSymbol::Wbtc, dec!(0.75), dec!(3.5)),
        ],
    ),
];

impl Default for RiskTable {
    fn default() -> Self {
        Self::reference()
    }
}

impl RiskTable {
    /// The built-in reference table
    ///
    /// Its invariants are covered by `test_reference_table_is_valid`.
    pub fn reference() -> Self {
        let mut ceilings = BTreeMap::new();
        let mut terms = BTreeMap::new();
        for (tier, ceiling, assets) in REFERENCE_TERMS {
            ceilings.insert(tier, ceiling);
            for (asset, max_ltv, interest_rate_apr) in assets {
                terms.insert(
                    (tier, asset),
                    AssetTerms {
                        max_ltv,
                        interest_rate_apr,
                    },
                );
            }
        }
        Self { ceilings, terms }
    }

    /// Build a table from explicit parameter records
    pub fn from_parameters(
        params: impl IntoIterator<Item = RiskParameters>,
    ) -> Result<Self, ConfigError> {
        let mut ceilings: BTreeMap<Tier, Decimal> = BTreeMap::new();
        let mut terms = BTreeMap::new();

        for p in params {
            match ceilings.get(&p.tier) {
                Some(existing) if *existing != p.tier_borrow_ceiling_usd => {
                    return Err(ConfigError::MalformedRiskTable(format!(
                        "{} has conflicting borrow ceilings {} and {}",
                        p.tier, existing, p.tier_borrow_ceiling_usd
                    )));
                }
                _ => {
                    ceilings.insert(p.tier, p.tier_borrow_ceiling_usd);
                }
            }
            let previous = terms.insert(
                (p.tier, p.asset),
                AssetTerms {
                    max_ltv: p.max_ltv,
                    interest_rate_apr: p.interest_rate_apr,
                },
            );
            if previous.is_some() {
                return Err(ConfigError::MalformedRiskTable(format!(
                    "duplicate entry for {}/{}",
                    p.tier, p.asset
                )));
            }
        }

        let table = Self { ceilings, terms };
        table.validate()?;
        Ok(table)
    }

    /// Parse and validate a table from JSON
    ///
    /// ```json
    /// { "tiers": { "Bronze": { "borrow_ceiling_usd": 10000,
    ///     "assets": { "ETH": { "max_ltv": 0.60, "interest_rate_apr": 8.5 } } } } }
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: RiskTableFile = serde_json::from_str(json).map_err(|e| {
            ConfigError::MalformedRiskTable(format!("failed to parse risk table JSON: {}", e))
        })?;

        let mut params = Vec::new();
        for (tier_name, entry) in file.tiers {
            let tier: Tier = tier_name.parse()?;
            for (symbol, terms) in entry.assets {
                params.push(RiskParameters {
                    tier,
                    asset: symbol.parse()?,
                    max_ltv: terms.max_ltv,
                    interest_rate_apr: terms.interest_rate_apr,
                    tier_borrow_ceiling_usd: entry.borrow_ceiling_usd,
                });
            }
        }
        Self::from_parameters(params)
    }

    /// Load and validate a table from a JSON file
    #[instrument]
    pub fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidSetting {
            key: "risk_table".to_string(),
            reason: format!("failed to read {}: {}", path, e),
        })?;
        let table = Self::from_json_str(&content)?;
        debug!(path, entries = table.terms.len(), "Loaded risk table");
        Ok(table)
    }

    /// Check completeness, ranges and monotonicity
    pub fn validate(&self) -> Result<(), ConfigError> {
        let malformed =
            |msg: String| -> Result<(), ConfigError> { Err(ConfigError::MalformedRiskTable(msg)) };

        for tier in Tier::ALL {
            let Some(ceiling) = self.ceilings.get(&tier) else {
                return malformed(format!("missing borrow ceiling for {}", tier));
            };
            if *ceiling <= Decimal::ZERO {
                return malformed(format!("{} borrow ceiling must be positive", tier));
            }
            for asset in AssetSymbol::ALL {
                let Some(terms) = self.terms.get(&(tier, asset)) else {
                    return malformed(format!("missing entry for {}/{}", tier, asset));
                };
                if terms.max_ltv <= Decimal::ZERO || terms.max_ltv > Decimal::ONE {
                    return malformed(format!(
                        "{}/{} max LTV {} outside (0, 1]",
                        tier, asset, terms.max_ltv
                    ));
                }
                if terms.interest_rate_apr < Decimal::ZERO {
                    return malformed(format!("{}/{} APR is negative", tier, asset));
                }
            }
        }

        for pair in Tier::ALL.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            if self.ceilings[&upper] <= self.ceilings[&lower] {
                return malformed(format!(
                    "borrow ceiling must rise from {} to {}",
                    lower, upper
                ));
            }
            for asset in AssetSymbol::ALL {
                let lo = self.terms[&(lower, asset)];
                let hi = self.terms[&(upper, asset)];
                if hi.max_ltv < lo.max_ltv {
                    return malformed(format!(
                        "{} max LTV drops from {} to {}",
                        asset, lower, upper
                    ));
                }
                if hi.interest_rate_apr > lo.interest_rate_apr {
                    return malformed(format!("{} APR rises from {} to {}", asset, lower, upper));
                }
            }
        }

        Ok(())
    }

    /// Parameters for a supported asset
    pub fn params(&self, tier: Tier, asset: AssetSymbol) -> RiskParameters {
        let terms = self.terms[&(tier, asset)];
        RiskParameters {
            tier,
            asset,
            max_ltv: terms.max_ltv,
            interest_rate_apr: terms.interest_rate_apr,
            tier_borrow_ceiling_usd: self.ceilings[&tier],
        }
    }

    /// Parameters for an asset given by ticker symbol
    pub fn lookup(&self, tier: Tier, symbol: &str) -> Result<RiskParameters, ConfigError> {
        let asset: AssetSymbol = symbol.parse()?;
        Ok(self.params(tier, asset))
    }

    /// Tier-level maximum borrowable amount
    pub fn borrow_ceiling(&self, tier: Tier) -> Decimal {
        self.ceilings[&tier]
    }

    /// One row per tier for a collateral asset, ascending
    pub fn compare(&self, asset: AssetSymbol) -> Vec<RiskParameters> {
        Tier::ALL
            .into_iter()
            .map(|tier| self.params(tier, asset))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_params() -> Vec<RiskParameters> {
        let table = RiskTable::reference();
        Tier::ALL
            .into_iter()
            .flat_map(|tier| AssetSymbol::ALL.into_iter().map(move |asset| (tier, asset)))
            .map(|(tier, asset)| table.params(tier, asset))
            .collect()
    }

    #[test]
    fn test_reference_table_is_valid() {
        assert!(RiskTable::reference().validate().is_ok());
        assert_eq!(reference_params().len(), 25);
    }

    #[test]
    fn test_monotonicity_over_full_table() {
        let table = RiskTable::reference();
        for asset in AssetSymbol::ALL {
            for (i, t1) in Tier::ALL.iter().enumerate() {
                for t2 in &Tier::ALL[i + 1..] {
                    let lo = table.params(*t1, asset);
                    let hi = table.params(*t2, asset);
                    assert!(hi.max_ltv >= lo.max_ltv, "{asset} {t1} -> {t2}");
                    assert!(hi.interest_rate_apr <= lo.interest_rate_apr, "{asset} {t1} -> {t2}");
                    assert!(hi.tier_borrow_ceiling_usd > lo.tier_borrow_ceiling_usd);
                }
            }
        }
    }

    #[test]
    fn test_reference_values() {
        let table = RiskTable::reference();
        let params = table.params(Tier::Bronze, AssetSymbol::Eth);
        assert_eq!(params.max_ltv, dec!(0.60));
        assert_eq!(params.interest_rate_apr, dec!(8.5));
        assert_eq!(params.tier_borrow_ceiling_usd, dec!(10000));

        assert_eq!(table.borrow_ceiling(Tier::Diamond), dec!(250000));
    }

    #[test]
    fn test_lookup_unknown_asset() {
        let table = RiskTable::reference();
        assert_eq!(
            table.lookup(Tier::Gold, "DOGE"),
            Err(ConfigError::UnknownAsset("DOGE".to_string()))
        );
        assert_eq!(
            table.lookup(Tier::Gold, "usdc").unwrap().max_ltv,
            dec!(0.90)
        );
    }

    #[test]
    fn test_partial_table_is_rejected() {
        let mut params = reference_params();
        params.retain(|p| !(p.tier == Tier::Gold && p.asset == AssetSymbol::Dai));
        let err = RiskTable::from_parameters(params).unwrap_err();
        assert!(err.to_string().contains("Gold/DAI"));
    }

    #[test]
    fn test_non_monotonic_table_is_rejected() {
        let mut params = reference_params();
        for p in params.iter_mut() {
            if p.tier == Tier::Diamond && p.asset == AssetSymbol::Eth {
                p.interest_rate_apr = dec!(12);
            }
        }
        assert!(matches!(
            RiskTable::from_parameters(params),
            Err(ConfigError::MalformedRiskTable(_))
        ));
    }

    #[test]
    fn test_zero_ltv_is_rejected() {
        let mut params = reference_params();
        params[0].max_ltv = Decimal::ZERO;
        assert!(RiskTable::from_parameters(params).is_err());
    }

    #[test]
    fn test_json_round_trip_of_reference_values() {
        let mut tiers = serde_json::Map::new();
        for (tier, ceiling, assets) in REFERENCE_TERMS {
            let mut asset_map = serde_json::Map::new();
            for (asset, ltv, apr) in assets {
                asset_map.insert(
                    asset.symbol().to_string(),
                    serde_json::json!({ "max_ltv": ltv, "interest_rate_apr": apr }),
                );
            }
            tiers.insert(
                tier.name().to_string(),
                serde_json::json!({ "borrow_ceiling_usd": ceiling, "assets": asset_map }),
            );
        }
        let json = serde_json::json!({ "tiers": tiers }).to_string();

        let table = RiskTable::from_json_str(&json).unwrap();
        assert_eq!(
            table.params(Tier::Platinum, AssetSymbol::Wbtc),
            RiskTable::reference().params(Tier::Platinum, AssetSymbol::Wbtc)
        );
    }

    #[test]
    fn test_json_unknown_tier() {
        let json = r#"{ "tiers": { "Iron": { "borrow_ceiling_usd": 5, "assets": {} } } }"#;
        assert_eq!(
            RiskTable::from_json_str(json).unwrap_err(),
            ConfigError::UnknownTier("Iron".to_string())
        );
    }

    #[test]
    fn test_compare_rows() {
        let rows = RiskTable::reference().compare(AssetSymbol::Usdc);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].tier, Tier::Bronze);
        assert_eq!(rows[4].max_ltv, dec!(0.95));
    }
}
