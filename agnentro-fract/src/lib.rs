//! # agnentro-fract
//!
//! Interval fixed-point ("fracterval") arithmetic used wherever the exact
//! entropy pipeline needs a transcendental quantity it cannot represent
//! exactly. A fracterval `{lo, hi}` asserts that the unknown true value
//! lies in `[lo * ULP, (hi + 1) * ULP)`; every operation rounds the lower
//! bound toward zero and the upper bound away, so uncertainty can only
//! grow and a reported bound is always trustworthy.
//!
//! Saturation is tracked by the sticky [`Status`] accumulator: primitives
//! that can clip a bound take `&mut Status` and set the flag instead of
//! returning per-call results; callers check once at the end of a
//! computation via [`Status::check`].
//!
//! Two mantissa widths are provided. [`Frac64`] carries the full operation
//! set plus a Q6.58 natural-log engine; [`Frac128`] carries the subset the
//! log-gamma evaluator needs plus a Q64.64 log engine.

pub mod frac128;
pub mod frac64;

pub use frac128::{Frac128, Ln128};
pub use frac64::{Frac64, Ln64};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FractError {
    #[error("an interval bound saturated the representable range")]
    Saturated,
}

/// Sticky saturation flag shared across a chain of interval operations.
///
/// Once flagged it stays flagged until [`Status::clear`]; intermediate
/// results after a flag are still valid intervals, merely clipped, so a
/// caller may finish the chain and decide at the end whether the outcome
/// is usable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    flagged: bool,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&mut self) {
        self.flagged = true;
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub fn clear(&mut self) {
        self.flagged = false;
    }

    pub fn check(&self) -> Result<(), FractError> {
        if self.flagged {
            Err(FractError::Saturated)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_sticky() {
        let mut status = Status::new();
        assert!(status.check().is_ok());
        status.flag();
        status.flag();
        assert!(status.is_flagged());
        assert_eq!(status.check(), Err(FractError::Saturated));
        status.clear();
        assert!(status.check().is_ok());
    }
}
