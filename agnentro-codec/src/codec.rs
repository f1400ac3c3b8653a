//! The agnentropic codec: a mixed-radix positional code over the exact
//! multiset-and-order state space of a mask sequence.
//!
//! Both directions share one pass shape: a shrinking combinatorial span
//! counts the equally likely completions of the sequence, each symbol
//! contributes `cumfreq * span` to the code, and the span is multiplied by
//! the symbol's pre-update frequency then divided (exactly) by the growing
//! total count. Every frequency starts at one and only ever grows, so the
//! final span equals the product of the per-step frequencies: the weight
//! `W` of the whole sequence. The codes of all sequences of one length
//! tile `[0, T)` in intervals of exactly their weights, `T` being the
//! Pochhammer total-state count, which is what makes the canonical
//! rounding below lossless.

use agnentro_biguint::{Biguint, BiguintError};
use agnentro_fract::{FractError, Status};
use agnentro_loggamma::{LogGamma, LogGammaError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::FreqTree;

/// Bumped on any wire- or API-incompatible change.
pub const BUILD_BREAK_COUNT: u64 = 0;
/// Bumped on any backward-compatible feature addition.
pub const BUILD_FEATURE_COUNT: u64 = 4;

/// Session parameters; travels alongside persisted streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Largest mask value a sequence may contain (alphabet is
    /// `[0, mask_max]`). Must be nonzero.
    pub mask_max: u64,
    /// Largest symbol count any one encode or decode call may pass.
    pub mask_count_max: u64,
    /// Must match [`BUILD_BREAK_COUNT`].
    pub break_count: u64,
    /// Must match [`BUILD_FEATURE_COUNT`].
    pub feature_count: u64,
}

impl CodecConfig {
    pub fn new(mask_max: u64, mask_count_max: u64) -> Self {
        Self {
            mask_max,
            mask_count_max,
            break_count: BUILD_BREAK_COUNT,
            feature_count: BUILD_FEATURE_COUNT,
        }
    }
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("build compatibility mismatch (break {got_break}, feature {got_feature})")]
    BuildMismatch { got_break: u64, got_feature: u64 },
    #[error("mask_max must be nonzero")]
    ZeroMaskSpan,
    #[error("session size computation overflowed")]
    SizeOverflow,
    #[error("sequence of {len} masks exceeds the configured bound {max}")]
    SequenceTooLong { len: u64, max: u64 },
    #[error("mask {mask} exceeds mask_max {mask_max}")]
    MaskOutOfRange { mask: u64, mask_max: u64 },
    #[error("element width {0} is unsupported (1-4 bytes)")]
    BadElementWidth(usize),
    #[error("byte buffer length {len} is not a multiple of element width {width}")]
    RaggedBuffer { len: usize, width: usize },
    #[error("stream is truncated or malformed")]
    Stream,
    #[error(transparent)]
    Bits(#[from] BiguintError),
    #[error(transparent)]
    Numeric(#[from] FractError),
    #[error(transparent)]
    Gamma(#[from] LogGammaError),
}

/// Adaptive exact-combinatorics codec over a fixed mask alphabet.
pub struct Agnentrocodec {
    config: CodecConfig,
    tree: FreqTree,
    gamma: LogGamma,
    code: Biguint,
    code_bit_len: u64,
    max_code_bits: u64,
    // Scratch, sized once per session and reused across calls.
    span: Biguint,
    term: Biguint,
    weight: Biguint,
}

impl Agnentrocodec {
    /// Validates the configuration and allocates all session state.
    pub fn new(config: CodecConfig) -> Result<Self, CodecError> {
        if config.break_count != BUILD_BREAK_COUNT
            || config.feature_count != BUILD_FEATURE_COUNT
        {
            return Err(CodecError::BuildMismatch {
                got_break: config.break_count,
                got_feature: config.feature_count,
            });
        }
        if config.mask_max == 0 {
            return Err(CodecError::ZeroMaskSpan);
        }
        let span_count = config
            .mask_max
            .checked_add(1)
            .ok_or(CodecError::SizeOverflow)?;
        let arg_top = span_count
            .checked_add(config.mask_count_max)
            .ok_or(CodecError::SizeOverflow)?;
        usize::try_from(config.mask_max).map_err(|_| CodecError::SizeOverflow)?;

        let mut gamma = LogGamma::new()?;
        let max_code_bits = code_bit_bound(&mut gamma, span_count, arg_top)?;
        Ok(Self {
            tree: FreqTree::new(config.mask_max),
            config,
            gamma,
            code: Biguint::zero(),
            code_bit_len: 0,
            max_code_bits,
            span: Biguint::zero(),
            term: Biguint::zero(),
            weight: Biguint::zero(),
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// The current code value; meaningful together with
    /// [`Self::code_bit_len`] after an encode or import.
    pub fn code(&self) -> &Biguint {
        &self.code
    }

    /// Declared bit length of the current code.
    pub fn code_bit_len(&self) -> u64 {
        self.code_bit_len
    }

    /// The session's log-gamma evaluator, for entropy measurement against
    /// the same cached constants the bit bound was derived from.
    pub fn log_gamma(&mut self) -> &mut LogGamma {
        &mut self.gamma
    }

    /// Largest provably decodable code length for this configuration: the
    /// nats of the maximal state count (a log-gamma difference) divided by
    /// the lower `ln 2` bound, widened by two bits.
    pub fn max_code_bit_len(&self) -> u64 {
        self.max_code_bits
    }

    /// Restores uniform frequencies and an empty code.
    pub fn reset(&mut self) {
        self.tree.reset();
        self.code = Biguint::zero();
        self.code_bit_len = 0;
    }

    /// Encodes `masks` into the canonical minimal-length code.
    ///
    /// The emitted bit length depends only on the multiset of masks,
    /// never their order.
    pub fn encode(&mut self, masks: &[u64]) -> Result<(), CodecError> {
        let n = masks.len() as u64;
        if n > self.config.mask_count_max {
            return Err(CodecError::SequenceTooLong {
                len: n,
                max: self.config.mask_count_max,
            });
        }
        for &mask in masks {
            if mask > self.config.mask_max {
                return Err(CodecError::MaskOutOfRange {
                    mask,
                    mask_max: self.config.mask_max,
                });
            }
        }
        self.reset();
        if n == 0 {
            return Ok(());
        }
        let span_count = self.config.mask_max + 1;
        self.span = Biguint::pochhammer(span_count + 1, n - 1)?;
        self.weight = Biguint::from_u64(1);
        for (t, &mask) in masks.iter().enumerate() {
            let cum = self.tree.cumfreq(mask);
            if cum != 0 {
                self.term.clone_from(&self.span);
                self.term.mul_assign_u64(cum);
                self.code.add_assign(&self.term);
            }
            let freq = self.tree.freq(mask);
            self.weight.mul_assign_u64(freq);
            if (t as u64) < n - 1 {
                self.span.mul_assign_u64(freq);
                let (quotient, rem) = self.span.divrem_u64(span_count + t as u64 + 1)?;
                debug_assert_eq!(rem, 0);
                self.span = quotient;
            }
            debug_assert_eq!(self.tree.total(), span_count + t as u64);
            self.tree.increment(mask);
        }
        // Canonical minimal-length form. The sequence owns the code
        // interval [C, C + W), so rounding C up to a multiple of
        // 2^(bit_len(W) - 1) stays inside it and the low bits can be
        // dropped entirely; the emitted length is then a pure function of
        // the state-count total and the order-invariant weight.
        let round_bits = self.weight.bit_len() - 1;
        let rounds_up = self.code.lsb().map_or(false, |low| low < round_bits);
        self.code.shr_assign_bits(round_bits);
        if rounds_up {
            self.code.add_assign_u64(1);
        }
        self.code_bit_len = self.total_code_bits(n)? - round_bits;
        Ok(())
    }

    /// Decodes exactly `count` masks from the current code.
    ///
    /// Any declared bit length and any bit pattern decode to *some* mask
    /// sequence; only the configured bounds are enforced.
    pub fn decode(&mut self, count: u64) -> Result<Vec<u64>, CodecError> {
        if count > self.config.mask_count_max {
            return Err(CodecError::SequenceTooLong {
                len: count,
                max: self.config.mask_count_max,
            });
        }
        let mut out = Vec::with_capacity(count as usize);
        if count == 0 {
            return Ok(out);
        }
        self.tree.reset();
        let span_count = self.config.mask_max + 1;
        // Fraction-normalize the declared-length code against the scale of
        // this sequence length's state count.
        let scale_bits = self.total_code_bits(count)?;
        let mut residue = if self.code_bit_len <= scale_bits {
            self.code.shl_bits(scale_bits - self.code_bit_len)
        } else {
            self.code.shr_bits(self.code_bit_len - scale_bits)
        };
        self.span = Biguint::pochhammer(span_count + 1, count - 1)?;
        for t in 0..count {
            let (floor, _) = residue.divrem(&self.span)?;
            let (mask, cum, freq) = self.tree.find_bucket(floor.to_u64_saturating());
            if cum != 0 {
                self.term.clone_from(&self.span);
                self.term.mul_assign_u64(cum);
                residue.sub_assign(&self.term)?;
            }
            out.push(mask);
            if t < count - 1 {
                self.span.mul_assign_u64(freq);
                let (quotient, rem) = self.span.divrem_u64(span_count + t + 1)?;
                debug_assert_eq!(rem, 0);
                self.span = quotient;
            }
            debug_assert_eq!(self.tree.total(), span_count + t);
            self.tree.increment(mask);
        }
        Ok(out)
    }

    /// Copies a code out of a caller buffer, saturating the declared bit
    /// count to the maximum provably decodable length.
    pub fn code_import(
        &mut self,
        buf: &[u8],
        bit_offset: u64,
        bit_count: u64,
    ) -> Result<(), CodecError> {
        let count = bit_count.min(self.max_code_bits);
        self.code = Biguint::import_bits(buf, bit_offset, count)?;
        self.code_bit_len = count;
        Ok(())
    }

    /// Copies the current code into a caller buffer at `bit_offset`,
    /// returning the number of bits written. Fails without mutating the
    /// buffer when the range does not fit.
    pub fn code_export(&self, buf: &mut [u8], bit_offset: u64) -> Result<u64, CodecError> {
        self.code.export_bits(buf, bit_offset, self.code_bit_len)?;
        Ok(self.code_bit_len)
    }

    /// Bit length of `T - 1`, `T` the total-state count for `count`
    /// symbols; the scale every code of that length is measured against.
    fn total_code_bits(&self, count: u64) -> Result<u64, BiguintError> {
        let mut total = Biguint::pochhammer(self.config.mask_max + 1, count)?;
        total.sub_assign_u64(1)?;
        Ok(total.bit_len())
    }
}

/// Conservative bit bound on any code this configuration can emit:
/// `ln T = ln Γ(arg_top) - ln Γ(span_count)` exactly, converted from nats
/// to bits against the lower `ln 2` bound and widened by two bits.
fn code_bit_bound(
    gamma: &mut LogGamma,
    span_count: u64,
    arg_top: u64,
) -> Result<u64, CodecError> {
    let mut status = Status::new();
    let upper = gamma.ln_gamma(arg_top, &mut status);
    let lower = gamma.ln_gamma(span_count, &mut status);
    let nats = upper.sub(lower, &mut status);
    status.check().map_err(|_| CodecError::SizeOverflow)?;
    let sup = nats.hi.checked_add(1).ok_or(CodecError::SizeOverflow)?;
    let ln2_lo = gamma.ln2_q64().lo;
    let bits = sup
        .checked_add(ln2_lo - 1)
        .ok_or(CodecError::SizeOverflow)?
        / ln2_lo;
    u64::try_from(bits)
        .ok()
        .and_then(|b| b.checked_add(2))
        .ok_or(CodecError::SizeOverflow)
}
