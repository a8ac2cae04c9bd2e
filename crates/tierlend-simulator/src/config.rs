//! Simulator configuration
//!
//! Loaded from `.env` (if present) and `TIERLEND_*` environment variables on
//! top of built-in defaults.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::time::Duration;
use tierlend_common::InterestMode;
use tierlend_engine::{EconomicsConfig, LoanCalculator, RiskTable};
use tierlend_pricefeed::PriceFeedConfig;

pub const ENV_PRICE_BASE_URL: &str = "TIERLEND_PRICE_BASE_URL";
pub const ENV_REFRESH_SECS: &str = "TIERLEND_REFRESH_SECS";
pub const ENV_FETCH_TIMEOUT_MS: &str = "TIERLEND_FETCH_TIMEOUT_MS";
pub const ENV_RISK_TABLE: &str = "TIERLEND_RISK_TABLE";
pub const ENV_LIQUIDATION_MARGIN: &str = "TIERLEND_LIQUIDATION_MARGIN";
pub const ENV_INTEREST_MODE: &str = "TIERLEND_INTEREST_MODE";

#[derive(Debug, Clone, Default)]
pub struct SimulatorConfig {
    /// Price feed settings
    pub feed: PriceFeedConfig,
    /// Loan economics
    pub economics: EconomicsConfig,
    /// JSON risk table replacing the built-in one
    pub risk_table_path: Option<String>,
}

impl SimulatorConfig {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(url) = lookup(ENV_PRICE_BASE_URL) {
            cfg.feed = cfg.feed.with_base_url(url);
        }
        if let Some(val) = lookup(ENV_REFRESH_SECS) {
            let secs: u64 = val
                .trim()
                .parse()
                .with_context(|| format!("{ENV_REFRESH_SECS} must be whole seconds, got {val:?}"))?;
            cfg.feed = cfg.feed.with_refresh_interval(Duration::from_secs(secs));
        }
        if let Some(val) = lookup(ENV_FETCH_TIMEOUT_MS) {
            let millis: u64 = val.trim().parse().with_context(|| {
                format!("{ENV_FETCH_TIMEOUT_MS} must be whole milliseconds, got {val:?}")
            })?;
            cfg.feed = cfg.feed.with_fetch_timeout(Duration::from_millis(millis));
        }

        // Economics
        if let Some(val) = lookup(ENV_LIQUIDATION_MARGIN) {
            let margin: Decimal = val
                .trim()
                .parse()
                .with_context(|| {
                    format!("{ENV_LIQUIDATION_MARGIN} must be a decimal, got {val:?}")
                })?;
            cfg.economics = cfg.economics.with_liquidation_margin(margin);
        }
        if let Some(val) = lookup(ENV_INTEREST_MODE) {
            cfg.economics = cfg.economics.with_interest_mode(parse_interest_mode(&val)?);
        }

        cfg.risk_table_path = lookup(ENV_RISK_TABLE).filter(|path| !path.trim().is_empty());

        cfg.feed.validate()?;
        cfg.economics.validate()?;
        Ok(cfg)
    }

    /// Risk table from `risk_table_path`, or the built-in table
    pub fn risk_table(&self) -> Result<RiskTable> {
        match &self.risk_table_path {
            Some(path) => RiskTable::from_json_file(path)
                .with_context(|| format!("Failed to load risk table from {path}")),
            None => Ok(RiskTable::reference()),
        }
    }

    pub fn calculator(&self) -> Result<LoanCalculator> {
        Ok(LoanCalculator::new(self.economics.clone())?)
    }
}

fn parse_interest_mode(raw: &str) -> Result<InterestMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "flat" | "flat_annual" | "annual" => Ok(InterestMode::FlatAnnual),
        "prorated" | "pro_rata" => Ok(InterestMode::Prorated),
        other => bail!("{ENV_INTEREST_MODE} must be flat_annual or prorated, got {other:?}"),
    }
}
