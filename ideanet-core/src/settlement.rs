//! Goal-completion financial settlement
//!
//! The one piece of business logic behind `/api/evaluate`: a shortfall
//! against the daily goal transfers a proportional slice of the stake
//! to the accountability partner.
//!
//! Inputs are sanitized by clamping, never rejected. Malformed numbers
//! (negative, NaN, infinite) are repaired before the ratio is computed,
//! so there are no error paths. Clamping order matters and is part of
//! the contract: required floors to 1, completed to 0, stake to 0.

use serde::{Deserialize, Serialize};

/// Outcome of evaluating one contract period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Amount owed to the partner, rounded to cents. Zero exactly when
    /// the goal was met.
    pub transfer_amount: f64,
    /// Whether the (clamped) completed count reached the required count.
    pub met_goal: bool,
}

/// Round to 2 decimal places, half away from zero.
///
/// Applied to the transfer amount and again to each balance after the
/// debit/credit, so unrounded intermediates never propagate more than
/// one step.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn numeric_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Compute the stake transfer for a goal shortfall.
///
/// A met goal (clamped `completed >= required`) is always a zero
/// transfer. A missed goal transfers `stake * miss_ratio` where
/// `miss_ratio = (required - completed) / required`, rounded to cents.
pub fn compute_transfer(required: f64, completed: f64, stake: f64) -> Settlement {
    let required = numeric_or_zero(required).max(1.0);
    let completed = numeric_or_zero(completed).max(0.0);
    let stake = numeric_or_zero(stake).max(0.0);

    if completed >= required {
        return Settlement {
            transfer_amount: 0.0,
            met_goal: true,
        };
    }

    let miss_ratio = (required - completed) / required;
    Settlement {
        transfer_amount: round2(stake * miss_ratio),
        met_goal: false,
    }
}
