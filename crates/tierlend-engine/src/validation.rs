//! Submission gate for loan requests
//!
//! Tier eligibility is strict: a request priced at a tier other than the one
//! the borrower's score classifies into is rejected, in either direction.

use rust_decimal::Decimal;
use tierlend_common::{LoanProjection, LoanRequest, Tier, ValidationError};

/// Validate a request against the borrower's actual tier and its projection
///
/// Checks run in a fixed order so the first failure reported is stable:
/// tier, amount sign, duration, then the borrow ceiling.
pub fn validate(
    request: &LoanRequest,
    actual_tier: Tier,
    projection: &LoanProjection,
) -> Result<(), ValidationError> {
    if request.tier != actual_tier {
        return Err(ValidationError::TierMismatch {
            requested: request.tier,
            actual: actual_tier,
        });
    }

    if request.amount_usd <= Decimal::ZERO {
        return Err(ValidationError::InvalidAmount);
    }

    if !request.has_allowed_duration() {
        return Err(ValidationError::UnsupportedDuration(request.duration_days));
    }

    if request.amount_usd > projection.max_borrowable_usd {
        return Err(ValidationError::AmountExceedsCeiling {
            amount: request.amount_usd,
            ceiling: projection.max_borrowable_usd,
        });
    }

    Ok(())
}
