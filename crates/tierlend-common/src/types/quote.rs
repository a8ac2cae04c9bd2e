//! Price quotes and immutable price snapshots
//!
//! A snapshot always holds exactly one quote per supported asset. Assets the
//! live source could not price carry their reference price and are flagged as
//! fallback; a single fallback quote marks the whole snapshot as degraded.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::asset::AssetSymbol;

/// USD price for one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub asset: AssetSymbol,

    /// Positive USD price
    pub price_usd: Decimal,

    /// True when the price is the static reference price
    pub is_fallback: bool,

    /// Why the live price was not used, if it was not
    pub fallback_reason: Option<String>,

    pub as_of: DateTime<Utc>,
}

impl PriceQuote {
    /// Quote from a live source
    pub fn live(asset: AssetSymbol, price_usd: Decimal, as_of: DateTime<Utc>) -> Self {
        Self {
            asset,
            price_usd,
            is_fallback: false,
            fallback_reason: None,
            as_of,
        }
    }

    /// Quote at the static reference price
    pub fn fallback(asset: AssetSymbol, reason: impl Into<String>, as_of: DateTime<Utc>) -> Self {
        Self {
            asset,
            price_usd: asset.fallback_price_usd(),
            is_fallback: true,
            fallback_reason: Some(reason.into()),
            as_of,
        }
    }
}

/// Outcome of the refresh cycle that produced a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// Placeholder reference prices before the first cycle completes
    Reference,
    /// Every asset priced by the live source
    Succeeded,
    /// Some assets fell back to reference prices
    Degraded,
    /// Every asset fell back to reference prices
    FullyDegraded,
}

/// Immutable set of quotes produced by one refresh cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Refresh cycle that produced this snapshot (0 = initial placeholder)
    pub sequence: u64,

    quotes: BTreeMap<AssetSymbol, PriceQuote>,

    /// Set-level degraded flag: true if any quote is a fallback
    pub is_fallback: bool,

    pub status: SnapshotStatus,

    pub taken_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// Snapshot of reference prices, used as a zero-latency placeholder
    pub fn reference(now: DateTime<Utc>) -> Self {
        let quotes = AssetSymbol::ALL
            .into_iter()
            .map(|asset| (asset, PriceQuote::fallback(asset, "initial reference price", now)))
            .collect();
        Self {
            sequence: 0,
            quotes,
            is_fallback: true,
            status: SnapshotStatus::Reference,
            taken_at: now,
        }
    }

    /// Build a snapshot from cycle results
    ///
    /// Assets missing from `quotes` are filled in with reference prices.
    pub fn from_quotes(
        sequence: u64,
        quotes: impl IntoIterator<Item = PriceQuote>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut map: BTreeMap<AssetSymbol, PriceQuote> =
            quotes.into_iter().map(|q| (q.asset, q)).collect();
        for asset in AssetSymbol::ALL {
            map.entry(asset)
                .or_insert_with(|| PriceQuote::fallback(asset, "no result for asset", now));
        }

        let fallbacks = map.values().filter(|q| q.is_fallback).count();
        let status = match fallbacks {
            0 => SnapshotStatus::Succeeded,
            n if n == map.len() => SnapshotStatus::FullyDegraded,
            _ => SnapshotStatus::Degraded,
        };

        Self {
            sequence,
            quotes: map,
            is_fallback: fallbacks > 0,
            status,
            taken_at: now,
        }
    }

    /// Quote for an asset
    pub fn quote(&self, asset: AssetSymbol) -> PriceQuote {
        self.quotes
            .get(&asset)
            .cloned()
            .unwrap_or_else(|| PriceQuote::fallback(asset, "no result for asset", self.taken_at))
    }

    /// USD price for an asset
    pub fn price(&self, asset: AssetSymbol) -> Decimal {
        self.quote(asset).price_usd
    }

    /// All quotes, ordered by asset
    pub fn quotes(&self) -> impl Iterator<Item = &PriceQuote> {
        self.quotes.values()
    }

    /// Assets currently priced at their reference price
    pub fn degraded_assets(&self) -> Vec<AssetSymbol> {
        self.quotes
            .values()
            .filter(|q| q.is_fallback)
            .map(|q| q.asset)
            .collect()
    }
}
