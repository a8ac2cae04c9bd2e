//! Loan desk
//!
//! Session-aware facade over the engine: resolves the borrower's reputation,
//! classifies it, looks up terms, and projects a draft against the current
//! price snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tierlend_common::{
    AssetSymbol, LoanProjection, LoanRequest, PriceQuote, PriceSnapshot, ReputationScore,
    ReputationSource, Result, Tier, TierProgress, ValidationError, WalletSession,
};
use tracing::{debug, instrument, warn};

use crate::calculator::LoanCalculator;
use crate::position::LoanPosition;
use crate::risk::{RiskParameters, RiskTable};
use crate::validation::validate;

/// Loan form input before the borrower's tier is known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDraft {
    pub amount_usd: Decimal,
    pub asset: AssetSymbol,
    pub duration_days: u32,
    /// Tier to price at; defaults to the classified tier
    pub requested_tier: Option<Tier>,
}

impl LoanDraft {
    pub fn new(amount_usd: Decimal, asset: AssetSymbol, duration_days: u32) -> Self {
        Self {
            amount_usd,
            asset,
            duration_days,
            requested_tier: None,
        }
    }

    /// Price the draft at a specific tier
    pub fn at_tier(mut self, tier: Tier) -> Self {
        self.requested_tier = Some(tier);
        self
    }
}

/// Everything the loan form shows for one draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskQuote {
    pub address: String,
    pub score: ReputationScore,
    pub progress: TierProgress,
    pub actual_tier: Tier,
    pub request: LoanRequest,
    pub params: RiskParameters,
    pub quote: PriceQuote,
    pub projection: LoanProjection,
    /// Snapshot sequence the projection was computed from
    pub snapshot_sequence: u64,
}

impl DeskQuote {
    /// Run the submission checks
    pub fn check(&self) -> std::result::Result<(), ValidationError> {
        validate(&self.request, self.actual_tier, &self.projection)
    }

    pub fn is_submittable(&self) -> bool {
        self.check().is_ok()
    }

    /// Projection used a reference price rather than a live one
    pub fn is_degraded(&self) -> bool {
        self.quote.is_fallback
    }
}

/// Session-aware loan quoting
#[derive(Debug, Clone)]
pub struct LoanDesk {
    table: Arc<RiskTable>,
    calculator: LoanCalculator,
}

impl LoanDesk {
    pub fn new(table: Arc<RiskTable>, calculator: LoanCalculator) -> Self {
        Self { table, calculator }
    }

    pub fn table(&self) -> &RiskTable {
        &self.table
    }

    pub fn calculator(&self) -> &LoanCalculator {
        &self.calculator
    }

    /// Quote a draft for the session's borrower
    #[instrument(
        skip(self, session, reputation, snapshot),
        fields(asset = %draft.asset, amount = %draft.amount_usd)
    )]
    pub async fn quote(
        &self,
        session: &WalletSession,
        reputation: &dyn ReputationSource,
        draft: &LoanDraft,
        snapshot: &PriceSnapshot,
    ) -> Result<DeskQuote> {
        let address = session.require_address()?.to_string();
        let score = reputation.reputation(&address).await?;
        let actual_tier = score.tier();
        let tier = draft.requested_tier.unwrap_or(actual_tier);

        let request = LoanRequest::new(draft.amount_usd, draft.asset, tier)
            .with_duration(draft.duration_days);
        let params = self.table.params(tier, draft.asset);
        let quote = snapshot.quote(draft.asset);
        if quote.is_fallback {
            warn!(
                asset = %draft.asset,
                sequence = snapshot.sequence,
                "Projecting against reference price"
            );
        }
        let projection = self.calculator.project(&request, &params, &quote);

        debug!(
            score = score.value(),
            tier = %actual_tier,
            max_borrowable = %projection.max_borrowable_usd,
            "Quoted loan draft"
        );

        Ok(DeskQuote {
            address,
            score,
            progress: score.progress(),
            actual_tier,
            request,
            params,
            quote,
            projection,
            snapshot_sequence: snapshot.sequence,
        })
    }

    /// Open a position from a quote that passes validation
    pub fn open(&self, quote: &DeskQuote, now: DateTime<Utc>) -> Result<LoanPosition> {
        quote.check()?;
        Ok(LoanPosition::open(
            &quote.request,
            &quote.projection,
            self.calculator.config().liquidation_margin,
            now,
        ))
    }
}

impl Default for LoanDesk {
    fn default() -> Self {
        Self::new(Arc::new(RiskTable::reference()), LoanCalculator::default())
    }
}
