//! 128-bit-mantissa fracterval engine.
//!
//! Carries the operation subset the log-gamma evaluator needs; the log
//! engine returns Q64.64 so that `v * ln v` for a 64-bit `v` stays
//! representable. Products of two 128-bit mantissas go through a 256-bit
//! widening multiply built from 64-bit limbs.

use crate::Status;

const M64: u128 = u64::MAX as u128;

/// Interval `[lo * ULP, (hi + 1) * ULP)` over a `u128` mantissa.
///
/// Invariant: `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frac128 {
    pub lo: u128,
    pub hi: u128,
}

impl Frac128 {
    pub const ZERO: Frac128 = Frac128 { lo: 0, hi: 0 };
    pub const FULL: Frac128 = Frac128 { lo: 0, hi: u128::MAX };

    pub fn new(lo: u128, hi: u128) -> Self {
        debug_assert!(lo <= hi);
        Self { lo, hi }
    }

    pub const fn from_mantissa(m: u128) -> Self {
        Self { lo: m, hi: m }
    }

    pub fn add(self, rhs: Frac128, status: &mut Status) -> Frac128 {
        let lo = match self.lo.checked_add(rhs.lo) {
            Some(l) => l,
            None => {
                status.flag();
                u128::MAX
            }
        };
        let hi = match self.hi.checked_add(rhs.hi).and_then(|h| h.checked_add(1)) {
            Some(h) => h,
            None => {
                status.flag();
                u128::MAX
            }
        };
        Frac128::new(lo.min(hi), hi)
    }

    pub fn sub(self, rhs: Frac128, status: &mut Status) -> Frac128 {
        let hi = match self.hi.checked_sub(rhs.lo) {
            Some(h) => h,
            None => {
                status.flag();
                0
            }
        };
        let lo = self.lo.saturating_sub(rhs.hi).saturating_sub(1);
        Frac128::new(lo.min(hi), hi)
    }

    /// Product of two fractions on `[0, 1)` (Q0.128).
    pub fn mul(self, rhs: Frac128) -> Frac128 {
        let (lo, _) = umul256(self.lo, rhs.lo);
        Frac128::new(lo, mul_hi_bound(self.hi, rhs.hi))
    }

    /// Product with an exact Q0.128 mantissa.
    pub fn mul_mantissa(self, m: u128) -> Frac128 {
        let (lo, _) = umul256(self.lo, m);
        Frac128::new(lo, mul_hi_bound(self.hi, m))
    }

    /// Product with a whole-number scalar, same scale as `self`.
    pub fn mul_scalar(self, v: u64, status: &mut Status) -> Frac128 {
        if v == 0 {
            return Frac128::ZERO;
        }
        let lo = match self.lo.checked_mul(v as u128) {
            Some(l) => l,
            None => {
                status.flag();
                u128::MAX
            }
        };
        let hi = match self
            .hi
            .checked_add(1)
            .and_then(|h| h.checked_mul(v as u128))
        {
            Some(p) => p - 1,
            None => {
                status.flag();
                u128::MAX
            }
        };
        Frac128::new(lo.min(hi), hi)
    }

    /// Quotient by a whole-number scalar, same scale as `self`.
    pub fn div_scalar(self, v: u64, status: &mut Status) -> Frac128 {
        if v == 0 {
            status.flag();
            return Frac128::FULL;
        }
        Frac128::new(self.lo / v as u128, self.hi / v as u128)
    }

    pub fn shl(self, shift: u32, status: &mut Status) -> Frac128 {
        if shift == 0 {
            return self;
        }
        let clipped = shift >= 128 || self.lo >> (128 - shift) != 0;
        let lo = if clipped {
            status.flag();
            u128::MAX
        } else {
            self.lo << shift
        };
        let hi_clipped = shift >= 128 || self.hi >> (128 - shift) != 0;
        let hi = if hi_clipped {
            status.flag();
            u128::MAX
        } else {
            // ((hi + 1) << shift) - 1, safe because hi << shift did not clip.
            (self.hi << shift) | ((1u128 << shift) - 1)
        };
        Frac128::new(lo.min(hi), hi)
    }

    pub fn shr(self, shift: u32) -> Frac128 {
        Frac128::new(self.lo >> shift, self.hi >> shift)
    }

    pub fn union(self, rhs: Frac128) -> Frac128 {
        Frac128::new(self.lo.min(rhs.lo), self.hi.max(rhs.hi))
    }
}

/// 256-bit widening multiply over 64-bit limbs, returning `(high, low)`
/// halves of `a * b`.
pub fn umul256(a: u128, b: u128) -> (u128, u128) {
    let (a0, a1) = (a & M64, a >> 64);
    let (b0, b1) = (b & M64, b >> 64);
    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;
    let mid = (p00 >> 64) + (p01 & M64) + (p10 & M64);
    let lo = (p00 & M64) | (mid << 64);
    let hi = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (hi, lo)
}

fn mul_hi_bound(a_hi: u128, b_hi: u128) -> u128 {
    // (a_hi + 1)(b_hi + 1) is the exclusive supremum in squared-ULP units;
    // an all-ones operand makes that factor 2^128, collapsing the shift.
    if a_hi == u128::MAX {
        return b_hi;
    }
    if b_hi == u128::MAX {
        return a_hi;
    }
    let (hi, lo) = umul256(a_hi + 1, b_hi + 1);
    if lo == 0 {
        hi - 1
    } else {
        hi
    }
}

const LN_CACHE_SLOTS: usize = 256;

/// Natural-log engine over `u64` inputs, Q64.64 results, for the
/// precision log-gamma needs at large arguments. Same series, caching and
/// self-computed `ln 2` scheme as the 64-bit engine.
pub struct Ln128 {
    ln2: Frac128,
    log_cache: Vec<Option<(u64, Frac128)>>,
    delta_cache: Vec<Option<(u64, Frac128)>>,
}

impl Ln128 {
    pub fn new() -> Self {
        Self {
            ln2: neg_ln_mantissa128(1 << 127),
            log_cache: vec![None; LN_CACHE_SLOTS],
            delta_cache: vec![None; LN_CACHE_SLOTS],
        }
    }

    /// Q0.128 bounds on `ln 2`.
    pub fn ln2(&self) -> Frac128 {
        self.ln2
    }

    /// Q64.64 bounds on `ln 2`.
    pub fn ln2_q64(&self) -> Frac128 {
        Frac128::new(self.ln2.lo >> 64, self.ln2.hi >> 64)
    }

    /// `ln v` as a Q64.64 fracterval; zero flags and returns the fully
    /// ambiguous interval.
    pub fn ln(&mut self, v: u64, status: &mut Status) -> Frac128 {
        if v == 0 {
            status.flag();
            return Frac128::FULL;
        }
        if v == 1 {
            return Frac128::ZERO;
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

    /// `ln(v + 1) - ln v` as a Q64.64 fracterval.
    pub fn ln_delta(&mut self, v: u64, status: &mut Status) -> Frac128 {
        if v == 0 {
            status.flag();
            return Frac128::FULL;
        }
        let slot = v as usize & (LN_CACHE_SLOTS - 1);
        if let Some((key, hit)) = self.delta_cache[slot] {
            if key == v {
                return hit;
            }
        }
        let upper = if v == u64::MAX {
            scale_ln2_q64(self.ln2, 64)
        } else {
            self.ln(v + 1, status)
        };
        let lower = self.ln(v, status);
        let out = upper.sub(lower, status);
        self.delta_cache[slot] = Some((v, out));
        out
    }

    fn ln_uncached(&self, v: u64) -> Frac128 {
        let bit_len = 64 - v.leading_zeros() as u64;
        let mantissa = (v as u128) << (128 - bit_len);
        let series = neg_ln_mantissa128(mantissa);
        let whole = scale_ln2_q64(self.ln2, bit_len);
        let s_lo = series.lo >> 64;
        let s_hi = series.hi >> 64;
        let hi = whole.hi - s_lo;
        let lo = whole.lo.saturating_sub(s_hi).saturating_sub(1);
        Frac128::new(lo.min(hi), hi)
    }
}

impl Default for Ln128 {
    fn default() -> Self {
        Self::new()
    }
}

/// `bit_len * ln 2` converted from Q0.128 bounds to Q64.64.
fn scale_ln2_q64(ln2: Frac128, bit_len: u64) -> Frac128 {
    let (h, l) = umul256(bit_len as u128, ln2.lo);
    let lo = h << 64 | l >> 64;
    let (mut h2, mut l2) = umul256(bit_len as u128, ln2.hi + 1);
    if l2 == 0 {
        h2 -= 1;
        l2 = u128::MAX;
    } else {
        l2 -= 1;
    }
    let hi = h2 << 64 | l2 >> 64;
    Frac128::new(lo, hi)
}

/// `-ln(m * 2^-128)` in Q0.128 for a normalized mantissa in `[1/2, 1)`.
/// Same series and termination rule as the 64-bit engine, including the
/// one-ULP cutoff: at `u = 1/2` the power's upper bound never reaches zero,
/// it parks at one ULP, so termination tests against one and the tail is
/// absorbed by a two-ULP widening.
fn neg_ln_mantissa128(m: u128) -> Frac128 {
    debug_assert!(m >= 1 << 127);
    let u = m.wrapping_neg();
    if u == 0 {
        return Frac128::ZERO;
    }
    let mut status = Status::new();
    let mut sum = Frac128::ZERO;
    let mut pow = Frac128::from_mantissa(u);
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
    Frac128::new(sum.lo, sum.hi.saturating_add(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ULP64: f64 = 1.0 / 18446744073709551616.0; // 2^-64, Q64.64 scale

    fn brackets_q64(f: Frac128, value: f64) -> bool {
        const SLACK: f64 = 1e-12;
        f.lo as f64 * ULP64 - SLACK <= value && value < (f.hi as f64 + 1.0) * ULP64 + SLACK
    }

    #[test]
    fn test_umul256_known_products() {
        assert_eq!(umul256(0, u128::MAX), (0, 0));
        assert_eq!(umul256(1, u128::MAX), (0, u128::MAX));
        // (2^128 - 1)^2 = 2^256 - 2^129 + 1
        assert_eq!(umul256(u128::MAX, u128::MAX), (u128::MAX - 1, 1));
        // Cross-limb carry: (2^64 + 1)(2^64 - 1) = 2^128 - 1
        assert_eq!(umul256((1 << 64) + 1, (1 << 64) - 1), (0, u128::MAX));
    }

    #[test]
    fn test_umul256_matches_native_for_small_operands() {
        let a = 0x1234_5678_9abc_def0u128;
        let b = 0xfedc_ba98_7654_3210u128;
        assert_eq!(umul256(a, b), (0, a * b));
    }

    #[test]
    fn test_add_sub_roundtrip() {
        let mut status = Status::new();
        let a = Frac128::from_mantissa(1 << 100);
        let b = Frac128::from_mantissa(1 << 90);
        let s = a.add(b, &mut status).sub(b, &mut status);
        assert!(!status.is_flagged());
        assert!(s.lo <= a.lo && a.hi <= s.hi);
    }

    #[test]
    fn test_mul_half_squared() {
        let half = Frac128::from_mantissa(1 << 127);
        let q = half.mul(half);
        assert_eq!(q.lo, 1 << 126);
        assert!(q.hi - q.lo <= 2);
    }

    #[test]
    fn test_mul_hi_bound_saturated_operand() {
        let p = Frac128::FULL.mul(Frac128::FULL);
        assert_eq!(p, Frac128::FULL);
        let p = Frac128::FULL.mul(Frac128::from_mantissa(1 << 126));
        assert!(p.hi >= 1 << 126);
    }

    #[test]
    fn test_scalar_mul_overflow_flags() {
        let mut status = Status::new();
        let a = Frac128::from_mantissa(u128::MAX / 2);
        let p = a.mul_scalar(3, &mut status);
        assert!(status.is_flagged());
        assert_eq!(p.hi, u128::MAX);
    }

    #[test]
    fn test_scalar_mul_zero_is_exact_zero() {
        let mut status = Status::new();
        let a = Frac128::from_mantissa(u128::MAX);
        assert_eq!(a.mul_scalar(0, &mut status), Frac128::ZERO);
        assert!(!status.is_flagged());
    }

    #[test]
    fn test_shl_fills_low_bits() {
        let mut status = Status::new();
        let a = Frac128::from_mantissa(3);
        assert_eq!(a.shl(2, &mut status), Frac128::new(12, 15));
        assert!(!status.is_flagged());
        let clipped = Frac128::from_mantissa(1 << 127).shl(1, &mut status);
        assert!(status.is_flagged());
        assert_eq!(clipped.lo, u128::MAX);
    }

    #[test]
    fn test_half_mantissa_series_terminates() {
        // u = 1/2 parks the power's upper bound at one ULP; the series must
        // still finish and bracket -ln(1/2) = ln 2.
        let f = neg_ln_mantissa128(1 << 127);
        let mid = (f.lo >> 64) as f64 * ULP64;
        assert!((mid - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_ln2_q128_precision() {
        let engine = Ln128::new();
        let ln2 = engine.ln2();
        // Interval width stays tiny relative to the 128-bit scale.
        assert!(ln2.hi - ln2.lo < 1 << 12);
        let mid = (ln2.lo >> 64) as f64 * ULP64;
        assert!((mid - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_ln_contains_f64_reference() {
        let mut engine = Ln128::new();
        let mut status = Status::new();
        for v in [1u64, 2, 3, 32, 33, 1000, 1_000_000_007, u64::MAX] {
            let f = engine.ln(v, &mut status);
            assert!(
                brackets_q64(f, (v as f64).ln()),
                "ln({v}) bound {:?} misses reference",
                f
            );
        }
        assert!(!status.is_flagged());
    }

    #[test]
    fn test_ln_delta_shrinks_with_v() {
        let mut engine = Ln128::new();
        let mut status = Status::new();
        let d10 = engine.ln_delta(10, &mut status);
        let d1000 = engine.ln_delta(1000, &mut status);
        assert!(!status.is_flagged());
        assert!(brackets_q64(d10, (1.1f64).ln()));
        assert!(brackets_q64(d1000, (1.001f64).ln()));
        assert!(d1000.hi < d10.lo);
    }

    #[test]
    fn test_ln_zero_flags() {
        let mut engine = Ln128::new();
        let mut status = Status::new();
        assert_eq!(engine.ln(0, &mut status), Frac128::FULL);
        assert!(status.is_flagged());
        status.clear();
        assert_eq!(engine.ln_delta(0, &mut status), Frac128::FULL);
        assert!(status.is_flagged());
    }
}
