use std::cmp::Ordering;
use thiserror::Error;

/// Arbitrary-precision unsigned integer.
///
/// Storage is little-endian `u64` limbs and is never empty: the value zero
/// is the single limb `0`. A value may carry trailing zero limbs (a "hull")
/// left behind by arithmetic for performance; all comparisons and queries
/// ignore the hull, and [`Biguint::canonize`] trims it explicitly.
///
/// Capacity planning is the caller's concern only in the sense that hulls
/// grow once per operation chain; no operation here performs hidden I/O or
/// shared-state mutation, so two values on two threads never interfere.
#[derive(Debug, Clone)]
pub struct Biguint {
    pub(crate) words: Vec<u64>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BiguintError {
    #[error("subtraction underflow")]
    Underflow,
    #[error("division by zero")]
    DivideByZero,
    #[error("size computation overflowed the native width")]
    Overflow,
    #[error("empty numeric literal")]
    ParseEmpty,
    #[error("invalid digit {0:?}")]
    ParseDigit(char),
    #[error("bit range {offset}+{count} exceeds buffer capacity of {capacity} bits")]
    Capacity { offset: u64, count: u64, capacity: u64 },
    #[error("bitstream ended before the requested bit count")]
    UnexpectedEnd,
    #[error("malformed logplex prefix")]
    Malformed,
}

impl Biguint {
    /// The value zero, canonical.
    pub fn zero() -> Self {
        Self { words: vec![0] }
    }

    pub fn from_u64(value: u64) -> Self {
        Self { words: vec![value] }
    }

    pub fn from_u128(value: u128) -> Self {
        Self {
            words: vec![value as u64, (value >> 64) as u64],
        }
    }

    /// Builds a value from little-endian limbs. An empty slice is zero.
    pub fn from_le_words(words: &[u64]) -> Self {
        if words.is_empty() {
            return Self::zero();
        }
        Self { words: words.to_vec() }
    }

    /// Number of limbs ignoring the trailing zero hull (at least 1).
    pub fn eff_len(&self) -> usize {
        let mut len = self.words.len();
        while len > 1 && self.words[len - 1] == 0 {
            len -= 1;
        }
        len
    }

    /// Trims the trailing zero hull down to canonical form.
    pub fn canonize(&mut self) {
        let len = self.eff_len();
        self.words.truncate(len);
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Bit index of the most significant set bit, or `None` for zero.
    pub fn msb(&self) -> Option<u64> {
        for i in (0..self.words.len()).rev() {
            let w = self.words[i];
            if w != 0 {
                return Some(i as u64 * 64 + 63 - w.leading_zeros() as u64);
            }
        }
        None
    }

    /// Bit index of the least significant set bit, or `None` for zero.
    pub fn lsb(&self) -> Option<u64> {
        for (i, &w) in self.words.iter().enumerate() {
            if w != 0 {
                return Some(i as u64 * 64 + w.trailing_zeros() as u64);
            }
        }
        None
    }

    /// Number of significant bits; zero has bit length 0.
    pub fn bit_len(&self) -> u64 {
        self.msb().map_or(0, |m| m + 1)
    }

    pub fn bit(&self, idx: u64) -> bool {
        let limb = (idx / 64) as usize;
        if limb >= self.words.len() {
            return false;
        }
        (self.words[limb] >> (idx % 64)) & 1 == 1
    }

    pub fn set_bit(&mut self, idx: u64) {
        let limb = (idx / 64) as usize;
        if limb >= self.words.len() {
            self.words.resize(limb + 1, 0);
        }
        self.words[limb] |= 1 << (idx % 64);
    }

    pub fn clear_bit(&mut self, idx: u64) {
        let limb = (idx / 64) as usize;
        if limb < self.words.len() {
            self.words[limb] &= !(1 << (idx % 64));
        }
    }

    pub fn flip_bit(&mut self, idx: u64) {
        let limb = (idx / 64) as usize;
        if limb >= self.words.len() {
            self.words.resize(limb + 1, 0);
        }
        self.words[limb] ^= 1 << (idx % 64);
    }

    /// Returns the low `width` bits reversed end-for-end: output bit `i` is
    /// input bit `width - 1 - i`. Bits at or above `width` are discarded.
    pub fn reverse_bits(&self, width: u64) -> Biguint {
        let mut out = Biguint::zero();
        for b in 0..width {
            if self.bit(b) {
                out.set_bit(width - 1 - b);
            }
        }
        out
    }

    pub fn to_u64_saturating(&self) -> u64 {
        if self.eff_len() > 1 {
            u64::MAX
        } else {
            self.words[0]
        }
    }

    pub fn to_u64_wrapping(&self) -> u64 {
        self.words[0]
    }

    pub fn to_u128_saturating(&self) -> u128 {
        if self.eff_len() > 2 {
            u128::MAX
        } else {
            self.to_u128_wrapping()
        }
    }

    pub fn to_u128_wrapping(&self) -> u128 {
        let lo = self.words[0] as u128;
        let hi = self.words.get(1).copied().unwrap_or(0) as u128;
        (hi << 64) | lo
    }

    /// Parses a decimal literal. Every character must be an ASCII digit.
    pub fn from_decimal(text: &str) -> Result<Self, BiguintError> {
        if text.is_empty() {
            return Err(BiguintError::ParseEmpty);
        }
        let mut out = Biguint::zero();
        for ch in text.chars() {
            let digit = ch.to_digit(10).ok_or(BiguintError::ParseDigit(ch))?;
            out.mul_assign_u64(10);
            out.add_assign_u64(digit as u64);
        }
        Ok(out)
    }

    /// Formats the value in decimal, no leading zeros (zero is `"0"`).
    pub fn to_decimal(&self) -> String {
        // 10^19 is the largest power of ten below 2^64.
        const CHUNK: u64 = 10_000_000_000_000_000_000;
        if self.is_zero() {
            return "0".to_string();
        }
        let mut chunks: Vec<u64> = Vec::new();
        let mut cur = self.clone();
        cur.canonize();
        while !cur.is_zero() {
            let (q, r) = cur
                .divrem_u64(CHUNK)
                .expect("chunk divisor is nonzero");
            chunks.push(r);
            cur = q;
            cur.canonize();
        }
        let mut text = chunks[chunks.len() - 1].to_string();
        for &c in chunks[..chunks.len() - 1].iter().rev() {
            text.push_str(&format!("{:019}", c));
        }
        text
    }

    /// Parses a hexadecimal literal (no prefix, either letter case).
    pub fn from_hex(text: &str) -> Result<Self, BiguintError> {
        if text.is_empty() {
            return Err(BiguintError::ParseEmpty);
        }
        let mut out = Biguint::zero();
        for ch in text.chars() {
            let digit = ch.to_digit(16).ok_or(BiguintError::ParseDigit(ch))?;
            out.shl_assign_bits(4);
            out.add_assign_u64(digit as u64);
        }
        Ok(out)
    }

    /// Formats the value in lowercase hexadecimal, no leading zeros.
    pub fn to_hex(&self) -> String {
        let len = self.eff_len();
        let mut text = format!("{:x}", self.words[len - 1]);
        for i in (0..len - 1).rev() {
            text.push_str(&format!("{:016x}", self.words[i]));
        }
        text
    }

    fn cmp_effective(&self, other: &Biguint) -> Ordering {
        let a = self.eff_len();
        let b = other.eff_len();
        if a != b {
            return a.cmp(&b);
        }
        for i in (0..a).rev() {
            match self.words[i].cmp(&other.words[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    pub fn cmp_u64(&self, value: u64) -> Ordering {
        if self.eff_len() > 1 {
            Ordering::Greater
        } else {
            self.words[0].cmp(&value)
        }
    }

    pub fn cmp_u128(&self, value: u128) -> Ordering {
        if self.eff_len() > 2 {
            Ordering::Greater
        } else {
            self.to_u128_wrapping().cmp(&value)
        }
    }
}

impl PartialEq for Biguint {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_effective(other) == Ordering::Equal
    }
}

impl Eq for Biguint {}

impl PartialOrd for Biguint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Biguint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_effective(other)
    }
}
