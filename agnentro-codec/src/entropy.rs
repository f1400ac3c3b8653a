//! Entropy measurement over a mask frequency profile.
//!
//! [`agnentropy_nats`] is the exact combinatorial information content of a
//! sequence given only its frequency profile, in nats. Unlike Shannon
//! entropy scaled by length, it charges the cost of learning the profile
//! itself, so it is a true lower bound on any losslessly achievable code
//! length for the adaptive codec's model. Shannon and root-mean-square
//! statistics are provided alongside for comparison and diagnostics.

use agnentro_fract::{Frac128, Frac64, Ln64, Status};
use agnentro_loggamma::LogGamma;

use crate::codec::CodecError;

/// Frequency-by-mask profile of one sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqProfile {
    mask_max: u64,
    freqs: Vec<u64>,
    total: u64,
}

impl FreqProfile {
    /// Counts mask occurrences. `mask_max` must be nonzero and every mask
    /// must lie on `[0, mask_max]`.
    pub fn new(mask_max: u64, masks: &[u64]) -> Result<Self, CodecError> {
        if mask_max == 0 {
            return Err(CodecError::ZeroMaskSpan);
        }
        let span = usize::try_from(mask_max)
            .ok()
            .and_then(|m| m.checked_add(1))
            .ok_or(CodecError::SizeOverflow)?;
        let mut freqs = vec![0u64; span];
        for &mask in masks {
            if mask > mask_max {
                return Err(CodecError::MaskOutOfRange { mask, mask_max });
            }
            freqs[mask as usize] += 1;
        }
        Ok(Self {
            mask_max,
            freqs,
            total: masks.len() as u64,
        })
    }

    pub fn mask_max(&self) -> u64 {
        self.mask_max
    }

    pub fn freq(&self, mask: u64) -> u64 {
        self.freqs[mask as usize]
    }

    /// Number of masks counted.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Exact agnentropy of the profile in nats, as Q64.64 bounds:
///
/// ```text
/// ln Γ(M + n) - ln Γ(M) - Σ_s ln Γ(k_s + 1)
/// ```
///
/// with `M` the alphabet size, `n` the sequence length and `k_s` the
/// per-mask counts. This equals the log of the number of sequences the
/// adaptive code distinguishes divided by the weight shared by every
/// ordering of this profile.
pub fn agnentropy_nats(
    profile: &FreqProfile,
    gamma: &mut LogGamma,
    status: &mut Status,
) -> Frac128 {
    let span = profile.mask_max + 1;
    let top = match span.checked_add(profile.total) {
        Some(arg) => gamma.ln_gamma(arg, status),
        None => {
            status.flag();
            return Frac128::FULL;
        }
    };
    let base = gamma.ln_gamma(span, status);
    let mut nats = top.sub(base, status);
    for &freq in &profile.freqs {
        // ln Γ(1) and ln Γ(2) are both exactly zero.
        if freq >= 2 {
            nats = nats.sub(gamma.ln_gamma(freq + 1, status), status);
        }
    }
    nats
}

/// Shannon entropy of the profile as a fraction of its maximum
/// `ln(mask_max + 1)`, as a Q0.64 ratio on `[0, 1]`. Zero for empty and
/// single-valued profiles; one for a uniform profile over the whole
/// alphabet (the upper bound clamps at the largest mantissa, since an
/// exact one is the scale's exclusive supremum).
pub fn shannon_fraction(
    profile: &FreqProfile,
    ln: &mut Ln64,
    status: &mut Status,
) -> Frac64 {
    if profile.total < 2 {
        return Frac64::ZERO;
    }
    // H = ln n - Σ (k/n) ln k, all terms nonnegative.
    let mut dilution = Frac64::ZERO;
    for &freq in &profile.freqs {
        if freq >= 2 {
            let term = ln
                .ln(freq, status)
                .div_scalar(profile.total, status)
                .mul_scalar(freq, status);
            dilution = dilution.add(term, status);
        }
    }
    let entropy = ln.ln(profile.total, status).sub(dilution, status);
    let ceiling = ln.ln(profile.mask_max + 1, status);
    // H <= ln(mask_max + 1) holds exactly, so a quotient bound spilling
    // past one is the representation ceiling rather than a failure; keep
    // the caller's status out of the clamp.
    let mut ratio_status = Status::new();
    entropy.div(ceiling, &mut ratio_status)
}

/// Root-mean-square mask probability of the profile, on `(0, 1]`:
/// `sqrt(Σ p_s^2)` with `p_s = k_s / n`. Flags for an empty profile.
pub fn rms_probability(profile: &FreqProfile, status: &mut Status) -> Frac64 {
    if profile.total == 0 {
        status.flag();
        return Frac64::ZERO;
    }
    let mut sum = Frac64::ZERO;
    for &freq in &profile.freqs {
        if freq == 0 {
            continue;
        }
        let mantissa = ((freq as u128) << 64) / profile.total as u128;
        let p = Frac64::from_mantissa(mantissa.min(u64::MAX as u128) as u64);
        sum = sum.add(p.mul(p), status);
    }
    sum.sqrt()
}
