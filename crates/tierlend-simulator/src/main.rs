//! Tierlend Simulator Binary
//!
//! Prints a loan projection for a borrower score against live (or reference)
//! prices. With `--watch`, keeps refreshing and re-projects on every update.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, StreamExt};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tierlend_common::{PriceSnapshot, ProviderFamily, StaticReputation, WalletSession, VERSION};
use tierlend_engine::{LoanDesk, LoanDraft};
use tierlend_pricefeed::{
    CoinGeckoSource, PriceReconciler, PriceSource, RefreshTrigger, ScriptedPriceSource,
};
use tierlend_simulator::{report, Cli, SimulatorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    info!("Starting Tierlend simulator v{}", VERSION);

    // Load configuration
    let config = SimulatorConfig::load()?;
    info!(
        base_url = %config.feed.base_url,
        refresh_secs = config.feed.refresh_interval.as_secs(),
        interest_mode = ?config.economics.interest_mode,
        "Loaded configuration"
    );

    let desk = LoanDesk::new(Arc::new(config.risk_table()?), config.calculator()?);

    let source: Arc<dyn PriceSource> = if cli.offline {
        Arc::new(ScriptedPriceSource::at_reference_prices())
    } else {
        Arc::new(CoinGeckoSource::new(&config.feed)?)
    };
    let reconciler = Arc::new(PriceReconciler::new(source, config.feed.clone()));

    let session = WalletSession::connected(cli.address.clone(), ProviderFamily::ReadOnly);
    let reputation = StaticReputation::new(cli.score);
    let mut draft = LoanDraft::new(cli.amount, cli.asset, cli.duration);
    if let Some(tier) = cli.tier {
        draft = draft.at_tier(tier);
    }

    if cli.compare {
        println!("{}", report::render_comparison(desk.table(), cli.asset));
    }

    let print_projection = |snapshot: Arc<PriceSnapshot>| {
        let desk = &desk;
        let session = &session;
        let reputation = &reputation;
        let draft = &draft;
        async move {
            let quote = desk.quote(session, reputation, draft, &snapshot).await?;
            println!("{}", report::render_snapshot(&snapshot));
            println!("{}", report::render_quote(&quote));
            anyhow::Ok(())
        }
    };

    if !cli.watch {
        let snapshot = reconciler.refresh(RefreshTrigger::Initial).await;
        return print_projection(snapshot).await;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut updates = WatchStream::new(reconciler.subscribe());
    let refresh_loop = reconciler.clone().spawn_refresh_loop(shutdown_rx);

    info!("Watching prices, press Ctrl+C to stop");
    loop {
        tokio::select! {
            update = updates.next() => {
                let Some(snapshot) = update else { break };
                if let Err(e) = print_projection(snapshot).await {
                    warn!("Projection failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    if shutdown_tx.send(true).is_err() {
        debug!("Refresh loop already stopped");
    }
    refresh_loop.await?;
    info!("Shutting down Tierlend simulator");
    Ok(())
}
