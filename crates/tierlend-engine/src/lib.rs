//! # Tierlend Engine
//!
//! Pure loan economics for the Tierlend lending calculator.
//!
//! ## Projection Formula
//!
//! ```text
//! collateral_value   = amount / max_ltv
//! collateral_units   = collateral_value / price
//! annual_interest    = amount * apr / 100
//! max_borrowable     = min(price * max_ltv, tier_ceiling)
//! liquidation_value  = collateral_value * liquidation_margin
//! ```
//!
//! ## Components
//!
//! - [`risk`]: per (tier, asset) risk parameters, validated at construction
//! - [`calculator`]: [`LoanCalculator`] and the [`project`] shorthand
//! - [`validation`]: submission gate for loan requests
//! - [`position`]: health factor and progress of an open loan
//! - [`desk`]: session-aware facade tying the pieces together

pub mod calculator;
pub mod desk;
pub mod position;
pub mod risk;
pub mod validation;

pub use calculator::{project, EconomicsConfig, LoanCalculator};
pub use desk::{DeskQuote, LoanDesk, LoanDraft};
pub use position::{HealthBand, HealthBands, LoanPosition, LoanStatus, PositionHealth};
pub use risk::{RiskParameters, RiskTable};
pub use validation::validate;
