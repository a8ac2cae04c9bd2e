//! Price source seam

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tierlend_common::{AssetSymbol, PriceFeedError};

/// Single-asset USD price lookup
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Source name, for logs
    fn name(&self) -> &'static str;

    /// Current USD price for `asset`
    async fn fetch(&self, asset: AssetSymbol) -> Result<Decimal, PriceFeedError>;
}

/// In-memory price source with scripted per-asset responses
///
/// Unscripted assets answer with `MissingPrice`. An optional delay is applied
/// before every answer; the response is chosen when the fetch starts.
#[derive(Debug, Default)]
pub struct ScriptedPriceSource {
    responses: Mutex<HashMap<AssetSymbol, Result<Decimal, PriceFeedError>>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl ScriptedPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every asset answers with its reference price
    pub fn at_reference_prices() -> Self {
        let source = Self::new();
        for asset in AssetSymbol::ALL {
            source.set_price(asset, asset.fallback_price_usd());
        }
        source
    }

    pub fn with_price(self, asset: AssetSymbol, price: Decimal) -> Self {
        self.set_price(asset, price);
        self
    }

    pub fn with_failure(self, asset: AssetSymbol, error: PriceFeedError) -> Self {
        self.set_failure(asset, error);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(Some(delay));
        self
    }

    pub fn set_price(&self, asset: AssetSymbol, price: Decimal) {
        self.responses.lock().insert(asset, Ok(price));
    }

    pub fn set_failure(&self, asset: AssetSymbol, error: PriceFeedError) {
        self.responses.lock().insert(asset, Err(error));
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Number of fetches started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for ScriptedPriceSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self, asset: AssetSymbol) -> Result<Decimal, PriceFeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .lock()
            .get(&asset)
            .cloned()
            .unwrap_or_else(|| Err(PriceFeedError::MissingPrice(asset.coingecko_id().to_string())));
        let delay = *self.delay.lock();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response
    }
}
