//! Collateral assets and their static reference data
//!
//! Each supported asset carries a contract identity, a CoinGecko id used by
//! the live price source, and a fallback reference price that ships with the
//! engine so projections never depend on network access.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// Supported collateral asset
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetSymbol {
    Eth,
    Wbtc,
    Usdc,
    Usdt,
    Dai,
}

impl AssetSymbol {
    /// All supported assets
    pub const ALL: [AssetSymbol; 5] = [
        AssetSymbol::Eth,
        AssetSymbol::Wbtc,
        AssetSymbol::Usdc,
        AssetSymbol::Usdt,
        AssetSymbol::Dai,
    ];

    /// Ticker symbol
    pub fn symbol(self) -> &'static str {
        match self {
            AssetSymbol::Eth => "ETH",
            AssetSymbol::Wbtc => "WBTC",
            AssetSymbol::Usdc => "USDC",
            AssetSymbol::Usdt => "USDT",
            AssetSymbol::Dai => "DAI",
        }
    }

    /// Human-readable name
    pub fn display_name(self) -> &'static str {
        match self {
            AssetSymbol::Eth => "Ethereum",
            AssetSymbol::Wbtc => "Wrapped Bitcoin",
            AssetSymbol::Usdc => "USD Coin",
            AssetSymbol::Usdt => "Tether",
            AssetSymbol::Dai => "Dai",
        }
    }

    /// CoinGecko coin id used by the live price source
    pub fn coingecko_id(self) -> &'static str {
        match self {
            AssetSymbol::Eth => "ethereum",
            AssetSymbol::Wbtc => "wrapped-bitcoin",
            AssetSymbol::Usdc => "usd-coin",
            AssetSymbol::Usdt => "tether",
            AssetSymbol::Dai => "dai",
        }
    }

    /// Mainnet contract address (zero address for native ETH)
    pub fn contract_address(self) -> &'static str {
        match self {
            AssetSymbol::Eth => "0x0000000000000000000000000000000000000000",
            AssetSymbol::Wbtc => "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599",
            AssetSymbol::Usdc => "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            AssetSymbol::Usdt => "0xdac17f958d2ee523a2206206994597c13d831ec7",
            AssetSymbol::Dai => "0x6b175474e89094c44da98b954eedeac495271d0f",
        }
    }

    /// Static reference price in USD, used whenever live data is unavailable
    pub fn fallback_price_usd(self) -> Decimal {
        match self {
            AssetSymbol::Eth => dec!(3500),
            AssetSymbol::Wbtc => dec!(95000),
            AssetSymbol::Usdc => dec!(1.00),
            AssetSymbol::Usdt => dec!(1.00),
            AssetSymbol::Dai => dec!(1.00),
        }
    }

    /// Whether the asset is a USD stablecoin
    pub fn is_stablecoin(self) -> bool {
        matches!(self, AssetSymbol::Usdc | AssetSymbol::Usdt | AssetSymbol::Dai)
    }
}

impl std::fmt::Display for AssetSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for AssetSymbol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetSymbol::ALL
            .into_iter()
            .find(|asset| asset.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownAsset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol() {
        assert_eq!("eth".parse::<AssetSymbol>().unwrap(), AssetSymbol::Eth);
        assert_eq!("WBTC".parse::<AssetSymbol>().unwrap(), AssetSymbol::Wbtc);
        assert_eq!(
            "DOGE".parse::<AssetSymbol>(),
            Err(ConfigError::UnknownAsset("DOGE".to_string()))
        );
    }

    #[test]
    fn test_fallback_prices_are_positive() {
        for asset in AssetSymbol::ALL {
            assert!(asset.fallback_price_usd() > Decimal::ZERO, "{asset}");
        }
        assert_eq!(AssetSymbol::Eth.fallback_price_usd(), dec!(3500));
    }

    #[test]
    fn test_serde_uses_ticker() {
        let json = serde_json::to_string(&AssetSymbol::Usdc).unwrap();
        assert_eq!(json, "\"USDC\"");
        let parsed: AssetSymbol = serde_json::from_str("\"WBTC\"").unwrap();
        assert_eq!(parsed, AssetSymbol::Wbtc);
    }
}
