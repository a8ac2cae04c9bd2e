//! # Tierlend Price Feed
//!
//! Keeps a current [`PriceSnapshot`](tierlend_common::PriceSnapshot) for every
//! supported collateral asset.
//!
//! ## Refresh Cycle
//!
//! Each cycle fetches every asset concurrently, each fetch bounded by a
//! timeout. Assets that fail (transport error, non-2xx, missing or zero price,
//! timeout) fall back to their reference price and the snapshot is flagged as
//! degraded. A cycle's result is applied only if no later cycle has already
//! been applied.
//!
//! ## Components
//!
//! - [`PriceSource`]: one-asset price lookup seam
//! - [`CoinGeckoSource`]: HTTP source against the `simple/price` endpoint
//! - [`PriceReconciler`]: snapshot owner, refresh triggers, timer loop
//! - [`ScriptedPriceSource`]: in-memory source for tests and offline runs

pub mod coingecko;
pub mod config;
pub mod reconciler;
pub mod source;

pub use coingecko::{parse_simple_price, CoinGeckoSource};
pub use config::PriceFeedConfig;
pub use reconciler::{PriceReconciler, RefreshTrigger};
pub use source::{PriceSource, ScriptedPriceSource};
