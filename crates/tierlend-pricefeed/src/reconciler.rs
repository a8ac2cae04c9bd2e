//! Price feed reconciler
//!
//! Owns the current price snapshot. Readers get an `Arc` to an immutable
//! snapshot; a completed cycle swaps in a new one only if its sequence number
//! is higher than the applied snapshot's, so a slow cycle never overwrites a
//! newer result.
//!
//! Timer refreshes are skipped while any cycle is in flight. User and initial
//! refreshes always start a new cycle.

use chrono::Utc;
use futures::future::join_all;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tierlend_common::{AssetSymbol, PriceFeedError, PriceQuote, PriceSnapshot, SnapshotStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::config::PriceFeedConfig;
use crate::source::PriceSource;

/// What started a refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// First fetch after start-up
    Initial,
    /// Periodic timer tick
    Timer,
    /// Explicit user request
    User,
}

/// Decrements the in-flight count when a cycle ends or is dropped
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct PriceReconciler {
    source: Arc<dyn PriceSource>,
    config: PriceFeedConfig,
    current: RwLock<Arc<PriceSnapshot>>,
    /// Last sequence number handed to a cycle
    sequence: AtomicU64,
    in_flight: AtomicUsize,
    updates: watch::Sender<Arc<PriceSnapshot>>,
}

impl PriceReconciler {
    /// Create a reconciler holding reference prices until the first cycle lands
    pub fn new(source: Arc<dyn PriceSource>, config: PriceFeedConfig) -> Self {
        let initial = Arc::new(PriceSnapshot::reference(Utc::now()));
        let (updates, _) = watch::channel(initial.clone());

        Self {
            source,
            config,
            current: RwLock::new(initial),
            sequence: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            updates,
        }
    }

    pub fn config(&self) -> &PriceFeedConfig {
        &self.config
    }

    /// Currently applied snapshot
    pub fn snapshot(&self) -> Arc<PriceSnapshot> {
        self.current.read().clone()
    }

    /// Receive every applied snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<PriceSnapshot>> {
        self.updates.subscribe()
    }

    /// Whether any cycle is currently fetching
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Number of cycles started so far
    pub fn cycles_started(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// User-initiated refresh
    pub async fn refresh_prices(&self) -> Arc<PriceSnapshot> {
        self.refresh(RefreshTrigger::User).await
    }

    /// Run one refresh cycle and return the snapshot applied afterwards
    ///
    /// The returned snapshot may come from a later cycle if this one finished
    /// out of order.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn refresh(&self, trigger: RefreshTrigger) -> Arc<PriceSnapshot> {
        if trigger == RefreshTrigger::Timer && self.is_refreshing() {
            debug!("Refresh in flight, skipping timer tick");
            return self.snapshot();
        }

        let _guard = InFlight::enter(&self.in_flight);
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(sequence, "Starting price refresh cycle");

        let fetches = AssetSymbol::ALL.into_iter().map(|asset| self.fetch_quote(asset));
        let quotes = join_all(fetches).await;
        let snapshot = PriceSnapshot::from_quotes(sequence, quotes, Utc::now());

        match snapshot.status {
            SnapshotStatus::FullyDegraded => {
                warn!(sequence, "Every asset fell back to reference prices")
            }
            SnapshotStatus::Degraded => warn!(
                sequence,
                degraded = ?snapshot.degraded_assets(),
                "Price snapshot degraded"
            ),
            _ => info!(sequence, "Price snapshot refreshed"),
        }

        self.apply(Arc::new(snapshot))
    }

    /// Swap in `snapshot` unless a newer one is already applied
    fn apply(&self, snapshot: Arc<PriceSnapshot>) -> Arc<PriceSnapshot> {
        let mut current = self.current.write();
        if snapshot.sequence <= current.sequence {
            debug!(
                stale = snapshot.sequence,
                applied = current.sequence,
                "Discarding stale refresh result"
            );
            return current.clone();
        }
        *current = snapshot.clone();
        self.updates.send_replace(snapshot.clone());
        snapshot
    }

    /// Fetch one asset, falling back to its reference price on any failure
    #[instrument(skip(self))]
    async fn fetch_quote(&self, asset: AssetSymbol) -> PriceQuote {
        let timeout_ms = self.config.fetch_timeout.as_millis() as u64;
        let fetch = self.source.fetch(asset);
        let result = match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(PriceFeedError::Timeout(timeout_ms)),
        };

        match result.and_then(|price| check_plausible(asset, price)) {
            Ok(price) => PriceQuote::live(asset, price, Utc::now()),
            Err(err) => {
                warn!(asset = %asset, reason = %err, "Falling back to reference price");
                PriceQuote::fallback(asset, err.to_string(), Utc::now())
            }
        }
    }

    /// Spawn the refresh loop: one initial cycle, then one per interval
    ///
    /// Stops when `shutdown` flips to `true` or its sender is dropped.
    pub fn spawn_refresh_loop(
        self: Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.refresh(RefreshTrigger::Initial).await;

            let period = self.config.refresh_interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.refresh(RefreshTrigger::Timer).await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Price refresh loop stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}

fn check_plausible(asset: AssetSymbol, price: Decimal) -> Result<Decimal, PriceFeedError> {
    if price <= Decimal::ZERO {
        return Err(PriceFeedError::Implausible {
            asset: asset.symbol().to_string(),
            price: price.to_string(),
        });
    }
    Ok(price)
}
