//! # agnentro-loggamma
//!
//! Interval bounds on `ln Γ(v)` for native unsigned `v`, in Q64.64.
//!
//! Small inputs come from a table of exact-bounds log sums built once at
//! construction. Larger inputs use the Stirling/Binet asymptotic form
//!
//! ```text
//! ln Γ(v) = v ln v - ln v / 2 - v + ln(2π)/2 + μ(v)
//! ```
//!
//! where `μ(v)` is the alternating Bernoulli series `Σ ± c_m / v^(2m-1)`.
//! Each series term is evaluated exactly by big-integer long division, and
//! the alternating-series bound (remainder no larger than the first
//! omitted term) lets evaluation stop as soon as a term collapses below
//! one ULP, after which the result is widened by a single ULP per side.
//!
//! The only domain failure is `v == 0`, which flags the caller's
//! [`Status`] and returns the fully ambiguous interval. Inputs large
//! enough that `v ln v` overflows Q64.64 saturate and flag the same way.

use agnentro_biguint::{Biguint, BiguintError};
use agnentro_fract::{Frac128, Ln128, Status};
use thiserror::Error;

/// Largest input served from the exact small-value table.
pub const TABLE_ARG_MAX: u64 = 32;

const CACHE_SLOTS: usize = 256;

/// `ln(2π)/2` truncated to 28 decimal digits; the truncation error is
/// below `2^-93`, far under one Q64.64 ULP.
const HALF_LN_2PI_DIGITS: &str = "9189385332046727417803297364";
const HALF_LN_2PI_SCALE: &str = "10000000000000000000000000000";

/// `|B_2m| / (2m (2m-1))` for `m = 1..=10`, as decimal numerator and
/// denominator pairs. Ten terms are more than the series can consume
/// before collapsing below one ULP for any input above [`TABLE_ARG_MAX`].
const MU_COEFF_DIGITS: [(&str, &str); 10] = [
    ("1", "12"),
    ("1", "360"),
    ("1", "1260"),
    ("1", "1680"),
    ("1", "1188"),
    ("691", "360360"),
    ("1", "156"),
    ("3617", "122400"),
    ("43867", "244188"),
    ("174611", "125400"),
];

#[derive(Error, Debug)]
pub enum LogGammaError {
    #[error("constant table construction failed: {0}")]
    Table(#[from] BiguintError),
}

/// Log-gamma evaluator owning its constants, small-value table and a
/// direct-mapped result cache.
pub struct LogGamma {
    ln: Ln128,
    half_ln_2pi: Frac128,
    small_table: Vec<Frac128>,
    coeffs: Vec<(Biguint, Biguint)>,
    cache: Vec<Option<(u64, Frac128)>>,
}

impl LogGamma {
    pub fn new() -> Result<Self, LogGammaError> {
        let mut ln = Ln128::new();

        let digits = Biguint::from_decimal(HALF_LN_2PI_DIGITS)?;
        let scale = Biguint::from_decimal(HALF_LN_2PI_SCALE)?;
        let (q, _) = digits.shl_bits(64).divrem(&scale)?;
        let q = q.to_u128_saturating();
        let half_ln_2pi = Frac128::new(q, q + 1);

        // ln Γ(v) = Σ ln k over k < v; intervals accumulate conservatively.
        let mut small_table = vec![Frac128::ZERO; TABLE_ARG_MAX as usize + 1];
        let mut status = Status::new();
        let mut acc = Frac128::ZERO;
        for v in 1..=TABLE_ARG_MAX {
            small_table[v as usize] = acc;
            acc = acc.add(ln.ln(v, &mut status), &mut status);
        }
        debug_assert!(!status.is_flagged());

        let mut coeffs = Vec::with_capacity(MU_COEFF_DIGITS.len());
        for (num, den) in MU_COEFF_DIGITS {
            coeffs.push((Biguint::from_decimal(num)?, Biguint::from_decimal(den)?));
        }

        Ok(Self {
            ln,
            half_ln_2pi,
            small_table,
            coeffs,
            cache: vec![None; CACHE_SLOTS],
        })
    }

    /// The shared natural-log engine, for callers that need raw logs and
    /// log-deltas at the same precision.
    pub fn ln_engine(&mut self) -> &mut Ln128 {
        &mut self.ln
    }

    /// Q64.64 bounds on `ln 2`.
    pub fn ln2_q64(&self) -> Frac128 {
        self.ln.ln2_q64()
    }

    /// `ln Γ(v)` as a Q64.64 fracterval.
    pub fn ln_gamma(&mut self, v: u64, status: &mut Status) -> Frac128 {
        if v == 0 {
            status.flag();
            return Frac128::FULL;
        }
        if v <= TABLE_ARG_MAX {
            return self.small_table[v as usize];
        }
        let slot = v as usize & (CACHE_SLOTS - 1);
        if let Some((key, hit)) = self.cache[slot] {
            if key == v {
                return hit;
            }
        }
        let out = self.stirling(v, status);
        self.cache[slot] = Some((v, out));
        out
    }

    fn stirling(&mut self, v: u64, status: &mut Status) -> Frac128 {
        let ln_v = self.ln.ln(v, status);
        let mu = match self.mu(v, status) {
            Ok(m) => m,
            Err(_) => {
                status.flag();
                return Frac128::FULL;
            }
        };
        let v_exact = Frac128::from_mantissa((v as u128) << 64);
        let positive = ln_v
            .mul_scalar(v, status)
            .add(self.half_ln_2pi, status)
            .add(mu, status);
        let negative = ln_v.shr(1).add(v_exact, status);
        positive.sub(negative, status)
    }

    /// The Binet correction `μ(v)`: terms are exact rationals, each
    /// evaluated as `floor(num << 64 / (den * v^(2m-1)))` by long
    /// division, alternately added and subtracted until one collapses to
    /// zero ULPs; the final widening absorbs the omitted tail.
    fn mu(&self, v: u64, status: &mut Status) -> Result<Frac128, BiguintError> {
        let mut power = Biguint::from_u64(v);
        let mut mu = Frac128::ZERO;
        let mut add = true;
        for (num, den) in &self.coeffs {
            let denom = den.mul(&power);
            let (q, _) = num.shl_bits(64).divrem(&denom)?;
            let mantissa = q.to_u128_saturating();
            let term = Frac128::from_mantissa(mantissa);
            mu = if add {
                mu.add(term, status)
            } else {
                mu.sub(term, status)
            };
            add = !add;
            if mantissa == 0 {
                break;
            }
            power.mul_assign_u64(v);
            power.mul_assign_u64(v);
        }
        Ok(Frac128::new(
            mu.lo.saturating_sub(1),
            mu.hi.saturating_add(1),
        ))
    }
}
