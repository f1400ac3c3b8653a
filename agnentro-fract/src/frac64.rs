//! 64-bit-mantissa fracterval engine.
//!
//! [`Frac64`] is interpreted against whatever fixed-point scale the caller
//! assigns to the ULP; the arithmetic below is scale-free except where a
//! method documents a scale (the log engine returns Q6.58).

use crate::Status;

/// Interval `[lo * ULP, (hi + 1) * ULP)` over a `u64` mantissa.
///
/// Invariant: `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frac64 {
    pub lo: u64,
    pub hi: u64,
}

impl Frac64 {
    /// The exact value zero: `[0, ULP)`.
    pub const ZERO: Frac64 = Frac64 { lo: 0, hi: 0 };
    /// The fully ambiguous interval covering the whole range.
    pub const FULL: Frac64 = Frac64 { lo: 0, hi: u64::MAX };

    pub fn new(lo: u64, hi: u64) -> Self {
        debug_assert!(lo <= hi);
        Self { lo, hi }
    }

    /// Fractoid: an interval one ULP wide.
    pub const fn from_mantissa(m: u64) -> Self {
        Self { lo: m, hi: m }
    }

    pub fn add(self, rhs: Frac64, status: &mut Status) -> Frac64 {
        let lo = match self.lo.checked_add(rhs.lo) {
            Some(l) => l,
            None => {
                status.flag();
                u64::MAX
            }
        };
        let hi = self.hi as u128 + rhs.hi as u128 + 1;
        let hi = if hi > u64::MAX as u128 {
            status.flag();
            u64::MAX
        } else {
            hi as u64
        };
        Frac64::new(lo.min(hi), hi)
    }

    /// Interval difference. The lower bound clips at zero; an upper bound
    /// that would go negative means the true difference may not be
    /// representable, which flags `status` and clips to zero.
    pub fn sub(self, rhs: Frac64, status: &mut Status) -> Frac64 {
        let hi = match self.hi.checked_sub(rhs.lo) {
            Some(h) => h,
            None => {
                status.flag();
                0
            }
        };
        let lo = self.lo.saturating_sub(rhs.hi).saturating_sub(1);
        Frac64::new(lo.min(hi), hi)
    }

    /// Product of two fractions on `[0, 1)` (both operands and the result
    /// in Q0.64). Never overflows.
    pub fn mul(self, rhs: Frac64) -> Frac64 {
        let lo = (self.lo as u128 * rhs.lo as u128 >> 64) as u64;
        Frac64::new(lo, mul_hi_bound(self.hi, rhs.hi))
    }

    /// Product with an exact Q0.64 mantissa.
    pub fn mul_mantissa(self, m: u64) -> Frac64 {
        let lo = (self.lo as u128 * m as u128 >> 64) as u64;
        Frac64::new(lo, mul_hi_bound(self.hi, m))
    }

    /// Product with a whole-number scalar, same scale as `self`.
    pub fn mul_scalar(self, v: u64, status: &mut Status) -> Frac64 {
        let lo = self.lo as u128 * v as u128;
        let hi = (self.hi as u128 + 1) * v as u128;
        let lo = if lo > u64::MAX as u128 {
            status.flag();
            u64::MAX
        } else {
            lo as u64
        };
        let hi = if hi > u64::MAX as u128 {
            status.flag();
            u64::MAX
        } else {
            (hi as u64).saturating_sub(1).max(lo)
        };
        Frac64::new(lo, hi)
    }

    /// Quotient of two fractions on `[0, 1)` (Q0.64). A zero divisor lower
    /// bound, or a quotient reaching 1, saturates.
    pub fn div(self, rhs: Frac64, status: &mut Status) -> Frac64 {
        if rhs.lo == 0 {
            status.flag();
            return Frac64::FULL;
        }
        let lo = ((self.lo as u128) << 64) / (rhs.hi as u128 + 1);
        let lo = if lo > u64::MAX as u128 {
            status.flag();
            u64::MAX
        } else {
            lo as u64
        };
        // ceil(((hi+1) << 64) / rhs.lo) - 1 without overflowing the
        // numerator: ((hi << 64) | all-ones) / rhs.lo.
        let hi = (((self.hi as u128) << 64) | u64::MAX as u128) / rhs.lo as u128;
        let hi = if hi > u64::MAX as u128 {
            status.flag();
            u64::MAX
        } else {
            hi as u64
        };
        Frac64::new(lo.min(hi), hi)
    }

    /// Quotient by a whole-number scalar, same scale as `self`.
    pub fn div_scalar(self, v: u64, status: &mut Status) -> Frac64 {
        if v == 0 {
            status.flag();
            return Frac64::FULL;
        }
        Frac64::new(self.lo / v, self.hi / v)
    }

    pub fn shl(self, shift: u32, status: &mut Status) -> Frac64 {
        let lo = (self.lo as u128) << shift;
        let hi = ((self.hi as u128 + 1) << shift) - 1;
        let lo = if lo > u64::MAX as u128 {
            status.flag();
            u64::MAX
        } else {
            lo as u64
        };
        let hi = if hi > u64::MAX as u128 {
            status.flag();
            u64::MAX
        } else {
            hi as u64
        };
        Frac64::new(lo.min(hi), hi)
    }

    pub fn shr(self, shift: u32) -> Frac64 {
        Frac64::new(self.lo >> shift, self.hi >> shift)
    }

    /// Smallest interval containing both operands.
    pub fn union(self, rhs: Frac64) -> Frac64 {
        Frac64::new(self.lo.min(rhs.lo), self.hi.max(rhs.hi))
    }

    /// Square root of a Q0.64 fraction, each bound refined independently
    /// by binary search over the candidate mantissa.
    pub fn sqrt(self) -> Frac64 {
        let lo = isqrt_u128((self.lo as u128) << 64);
        let hi = isqrt_u128(((self.hi as u128) << 64) | u64::MAX as u128);
        Frac64::new(lo, hi)
    }
}

/// Upper mantissa of the product bound: `(a_hi + 1)(b_hi + 1)` is the
/// exclusive supremum in squared-ULP units, so the result's `hi` is that
/// product minus one, shifted down.
fn mul_hi_bound(a_hi: u64, b_hi: u64) -> u64 {
    let a = a_hi as u128 + 1;
    let b = b_hi as u128 + 1;
    match a.checked_mul(b) {
        Some(p) => ((p - 1) >> 64) as u64,
        // Only 2^64 * 2^64 overflows; (2^128 - 1) >> 64 is all-ones.
        None => u64::MAX,
    }
}

fn isqrt_u128(n: u128) -> u64 {
    let mut lo = 0u64;
    let mut hi = u64::MAX;
    while lo < hi {
        // Round-up midpoint; `lo + (hi - lo + 1) / 2` overflows at the
        // initial full-range bounds.
        let mid = hi - (hi - lo) / 2;
        if mid as u128 * mid as u128 <= n {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

const LN_CACHE_SLOTS: usize = 256;

/// Natural-log engine over `u64` inputs, Q6.58 results.
///
/// `ln 2` is produced by the engine's own power series rather than a typed
/// constant, so the only trusted inputs are the series recurrence and the
/// interval arithmetic above. Results are cached in direct-mapped tables
/// keyed by the input's low bits; a colliding slot is simply overwritten.
pub struct Ln64 {
    ln2: Frac64,
    log_cache: Vec<Option<(u64, Frac64)>>,
    delta_cache: Vec<Option<(u64, Frac64)>>,
}

impl Ln64 {
    pub fn new() -> Self {
        Self {
            ln2: neg_ln_mantissa64(1 << 63),
            log_cache: vec![None; LN_CACHE_SLOTS],
            delta_cache: vec![None; LN_CACHE_SLOTS],
        }
    }

    /// Q0.64 bounds on `ln 2`.
    pub fn ln2(&self) -> Frac64 {
        self.ln2
    }

    /// `ln v` as a Q6.58 fracterval. Zero is outside the domain and
    /// returns the fully ambiguous interval with `status` flagged.
    pub fn ln(&mut self, v: u64, status: &mut Status) -> Frac64 {
        if v == 0 {
            status.flag();
            return Frac64::FULL;
        }
        if v == 1 {
            return Frac64::ZERO;
        }
        let slot = v as usize & (LN_CACHE_SLOTS - 1);
        if let Some((key, hit)) = self.log_cache[slot] {
            if key == v {
                return hit;
            }
        }
        let out = self.ln_uncached(v);
        self.log_cache[slot] = Some((v, out));
        out
    }

    /// `ln(v + 1) - ln v` as a Q6.58 fracterval, conservatively bounded
    /// from the two logs.
    pub fn ln_delta(&mut self, v: u64, status: &mut Status) -> Frac64 {
        if v == 0 {
            status.flag();
            return Frac64::FULL;
        }
        let slot = v as usize & (LN_CACHE_SLOTS - 1);
        if let Some((key, hit)) = self.delta_cache[slot] {
            if key == v {
                return hit;
            }
        }
        let upper = if v == u64::MAX {
            // ln 2^64 = 64 ln 2, rescaled from Q0.64 to Q6.58.
            scale_ln2_q58(self.ln2, 64)
        } else {
            self.ln(v + 1, status)
        };
        let lower = self.ln(v, status);
        let out = upper.sub(lower, status);
        self.delta_cache[slot] = Some((v, out));
        out
    }

    fn ln_uncached(&self, v: u64) -> Frac64 {
        let bit_len = 64 - v.leading_zeros() as u64;
        let mantissa = v << (64 - bit_len);
        let series = neg_ln_mantissa64(mantissa);
        // ln v = bit_len * ln 2 - (-ln m), m the Q0.64 mantissa in [1/2, 1).
        let whole = scale_ln2_q58(self.ln2, bit_len);
        let s_lo = series.lo >> 6;
        let s_hi = series.hi >> 6;
        let hi = whole.hi - s_lo;
        let lo = whole.lo.saturating_sub(s_hi).saturating_sub(1);
        Frac64::new(lo.min(hi), hi)
    }
}

impl Default for Ln64 {
    fn default() -> Self {
        Self::new()
    }
}

/// `bit_len * ln 2` converted from the Q0.64 `ln 2` bounds to Q6.58.
fn scale_ln2_q58(ln2: Frac64, bit_len: u64) -> Frac64 {
    let lo = ((bit_len as u128 * ln2.lo as u128) >> 6) as u64;
    let hi = ((bit_len as u128 * (ln2.hi as u128 + 1) - 1) >> 6) as u64;
    Frac64::new(lo, hi)
}

/// `-ln(m * 2^-64)` in Q0.64 for a normalized mantissa `m` in `[1/2, 1)`:
/// with `u = 1 - m`, sums `u + u^2/2 + u^3/3 + ...` in interval arithmetic
/// until the running power collapses to at most one ULP, then widens the
/// upper bound by two ULPs to absorb the tail. The cutoff must be one, not
/// zero: at `u = 1/2` exactly, the power's upper bound has a fixed point at
/// one ULP (`(1+1)(2^63+1) - 1` still carries into bit 64), so a zero test
/// never terminates. A power below two true ULPs leaves a tail under
/// `2 * 2 / (k+1)` ULPs with `k >= 2`, which the widening covers.
fn neg_ln_mantissa64(m: u64) -> Frac64 {
    debug_assert!(m >= 1 << 63);
    let u = m.wrapping_neg();
    if u == 0 {
        return Frac64::ZERO;
    }
    let mut status = Status::new();
    let mut sum = Frac64::ZERO;
    let mut pow = Frac64::from_mantissa(u);
    let mut k = 1u64;
    loop {
        let term = pow.div_scalar(k, &mut status);
        sum = sum.add(term, &mut status);
        pow = pow.mul_mantissa(u);
        k += 1;
        if pow.hi <= 1 {
            break;
        }
    }
    debug_assert!(!status.is_flagged());
    Frac64::new(sum.lo, sum.hi.saturating_add(2))
}
