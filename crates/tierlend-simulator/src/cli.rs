//! Command-line arguments

use clap::Parser;
use rust_decimal::Decimal;
use tierlend_common::{AssetSymbol, Tier};

#[derive(Parser, Debug, Clone)]
#[command(name = "tierlend")]
#[command(version, about = "Tier-based loan economics simulator")]
pub struct Cli {
    /// Borrower reputation score (clamped to 0-1000)
    #[arg(short, long, default_value_t = 500, allow_negative_numbers = true)]
    pub score: i64,

    /// Loan amount in USD
    #[arg(short, long, default_value = "1000")]
    pub amount: Decimal,

    /// Collateral asset (ETH, WBTC, USDC, USDT, DAI)
    #[arg(long, default_value = "ETH")]
    pub asset: AssetSymbol,

    /// Loan duration in days
    #[arg(short, long, default_value_t = 30)]
    pub duration: u32,

    /// Price the loan at this tier instead of the classified one
    #[arg(long)]
    pub tier: Option<Tier>,

    /// Borrower address shown in the report
    #[arg(long, default_value = "0x0000000000000000000000000000000000000001")]
    pub address: String,

    /// Print the per-tier terms for the asset
    #[arg(long)]
    pub compare: bool,

    /// Keep running and re-project on every price refresh
    #[arg(long)]
    pub watch: bool,

    /// Use reference prices instead of the live price API
    #[arg(long)]
    pub offline: bool,
}
