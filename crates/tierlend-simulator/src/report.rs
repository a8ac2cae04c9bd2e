//! Plain-text rendering of quotes, snapshots, and tier comparisons

use rust_decimal::Decimal;
use std::fmt::Write;
use tierlend_common::{AssetSymbol, PriceSnapshot};
use tierlend_engine::{DeskQuote, RiskTable};

fn usd(value: Decimal) -> String {
    format!("${:.2}", value)
}

/// Loan form summary for one quote
pub fn render_quote(quote: &DeskQuote) -> String {
    let mut out = String::new();
    let projection = &quote.projection;
    let asset = quote.request.asset;

    let _ = writeln!(out, "Borrower        {}", quote.address);
    let _ = writeln!(out, "Score           {} ({})", quote.score, quote.actual_tier);
    match (quote.progress.next, quote.progress.points_needed) {
        (Some(next), Some(points)) => {
            let _ = writeln!(out, "Next tier       {next} in {points} points");
        }
        _ => {
            let _ = writeln!(out, "Next tier       top tier reached");
        }
    }
    let price_note = if quote.quote.is_fallback { " (reference)" } else { "" };
    let _ = writeln!(
        out,
        "{:<15} {}{}",
        format!("{asset} price"),
        usd(quote.quote.price_usd),
        price_note
    );
    let _ = writeln!(
        out,
        "Loan            {} at {} for {} days ({}% APR, {}% LTV)",
        usd(quote.request.amount_usd),
        quote.request.tier,
        quote.request.duration_days,
        quote.params.interest_rate_apr,
        (quote.params.max_ltv * Decimal::ONE_HUNDRED).normalize()
    );
    let _ = writeln!(
        out,
        "Collateral      {} {asset} ({})",
        projection.collateral_required_in_asset.round_dp(6),
        usd(projection.collateral_value_required_usd)
    );
    let _ = writeln!(
        out,
        "Interest        {} per year, {} for term",
        usd(projection.annual_interest_usd),
        usd(projection.term_interest_usd)
    );
    let _ = writeln!(out, "Total repayment {}", usd(projection.total_repayment_usd));
    let _ = writeln!(out, "Liquidation at  {}", usd(projection.liquidation_threshold_usd));
    let _ = writeln!(out, "Max borrowable  {}", usd(projection.max_borrowable_usd));
    match quote.check() {
        Ok(()) => {
            let _ = writeln!(out, "Status          ready to submit");
        }
        Err(err) => {
            let _ = writeln!(out, "Status          rejected: {err}");
        }
    }
    out
}

/// One line per asset, flagging reference prices
pub fn render_snapshot(snapshot: &PriceSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Prices (cycle {}, {:?}) at {}",
        snapshot.sequence,
        snapshot.status,
        snapshot.taken_at.format("%H:%M:%S")
    );
    for quote in snapshot.quotes() {
        let note = match &quote.fallback_reason {
            Some(reason) if quote.is_fallback => format!("  reference: {reason}"),
            _ => String::new(),
        };
        let _ = writeln!(out, "  {:<5} {:>12}{}", quote.asset, usd(quote.price_usd), note);
    }
    out
}

/// Terms for `asset` at every tier
pub fn render_comparison(table: &RiskTable, asset: AssetSymbol) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<9} {:>6} {:>7} {:>12}", "Tier", "LTV", "APR", "Ceiling");
    for params in table.compare(asset) {
        let _ = writeln!(
            out,
            "{:<9} {:>5}% {:>6}% {:>12}",
            params.tier.to_string(),
            (params.max_ltv * Decimal::ONE_HUNDRED).normalize(),
            params.interest_rate_apr,
            usd(params.tier_borrow_ceiling_usd)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tierlend_common::{PriceQuote, ProviderFamily, StaticReputation, WalletSession};
    use tierlend_engine::{LoanDesk, LoanDraft};

    async fn bronze_quote(snapshot: &PriceSnapshot) -> DeskQuote {
        let session = WalletSession::connected("0xabc", ProviderFamily::ReadOnly);
        let reputation = StaticReputation::new(320);
        LoanDesk::default()
            .quote(
                &session,
                &reputation,
                &LoanDraft::new(dec!(1000), AssetSymbol::Eth, 30),
                snapshot,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_render_quote_marks_reference_price() {
        let quote = bronze_quote(&PriceSnapshot::reference(Utc::now())).await;
        let text = render_quote(&quote);

        assert!(text.contains("ETH price       $3500.00 (reference)"));
        assert!(text.contains("Total repayment $1085.00"));
        assert!(text.contains("Next tier       Silver in 80 points"));
        assert!(text.contains("ready to submit"));
    }

    #[tokio::test]
    async fn test_render_quote_live_price() {
        let now = Utc::now();
        let eth = PriceQuote::live(AssetSymbol::Eth, dec!(3200), now);
        let snapshot = PriceSnapshot::from_quotes(4, [eth], now);
        let text = render_quote(&bronze_quote(&snapshot).await);
        assert!(text.contains("ETH price       $3200.00\n"));
    }

    #[test]
    fn test_render_comparison_lists_every_tier() {
        let text = render_comparison(&RiskTable::reference(), AssetSymbol::Eth);
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("Bronze"));
        assert!(text.contains("Diamond"));
    }

    #[test]
    fn test_render_snapshot_flags_fallbacks() {
        let text = render_snapshot(&PriceSnapshot::reference(Utc::now()));
        assert!(text.contains("cycle 0"));
        assert!(text.contains("reference: initial reference price"));
    }
}
