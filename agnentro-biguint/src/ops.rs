//! Arithmetic on [`Biguint`]: carry-propagating add/sub, schoolbook and
//! scalar multiplication, the Pochhammer rising-factorial multiply, Knuth
//! long division and bit shifts.
//!
//! Mutating operations leave the trailing zero hull in place; callers that
//! need canonical storage call [`Biguint::canonize`] afterward.

use crate::biguint::{Biguint, BiguintError};
use std::cmp::Ordering;

impl Biguint {
    /// `self += rhs`.
    pub fn add_assign(&mut self, rhs: &Biguint) {
        let rlen = rhs.eff_len();
        if self.words.len() < rlen {
            self.words.resize(rlen, 0);
        }
        let mut carry = 0u64;
        for i in 0..rlen {
            let sum = self.words[i] as u128 + rhs.words[i] as u128 + carry as u128;
            self.words[i] = sum as u64;
            carry = (sum >> 64) as u64;
        }
        self.ripple_carry(rlen, carry);
    }

    /// `self += value`.
    pub fn add_assign_u64(&mut self, value: u64) {
        let sum = self.words[0] as u128 + value as u128;
        self.words[0] = sum as u64;
        self.ripple_carry(1, (sum >> 64) as u64);
    }

    /// `self += value << shift` without materializing the shifted operand.
    pub fn add_assign_u64_shifted(&mut self, value: u64, shift: u64) {
        if value == 0 {
            return;
        }
        let limb = (shift / 64) as usize;
        let s = (shift % 64) as u32;
        let lo = value << s;
        let hi = if s == 0 { 0 } else { value >> (64 - s) };
        if self.words.len() < limb + 2 {
            self.words.resize(limb + 2, 0);
        }
        let mut carry = 0u64;
        for (i, part) in [lo, hi].into_iter().enumerate() {
            let sum = self.words[limb + i] as u128 + part as u128 + carry as u128;
            self.words[limb + i] = sum as u64;
            carry = (sum >> 64) as u64;
        }
        self.ripple_carry(limb + 2, carry);
    }

    fn ripple_carry(&mut self, mut idx: usize, mut carry: u64) {
        while carry != 0 {
            if idx == self.words.len() {
                self.words.push(carry);
                return;
            }
            let sum = self.words[idx] as u128 + carry as u128;
            self.words[idx] = sum as u64;
            carry = (sum >> 64) as u64;
            idx += 1;
        }
    }

    /// `self -= rhs`, failing on underflow with `self` unchanged.
    pub fn sub_assign(&mut self, rhs: &Biguint) -> Result<(), BiguintError> {
        if (*self).cmp(rhs) == Ordering::Less {
            return Err(BiguintError::Underflow);
        }
        let rlen = rhs.eff_len();
        let mut borrow = 0u64;
        for i in 0..rlen {
            let (d1, b1) = self.words[i].overflowing_sub(rhs.words[i]);
            let (d2, b2) = d1.overflowing_sub(borrow);
            self.words[i] = d2;
            borrow = (b1 | b2) as u64;
        }
        let mut i = rlen;
        while borrow != 0 {
            let (d, b) = self.words[i].overflowing_sub(1);
            self.words[i] = d;
            borrow = b as u64;
            i += 1;
        }
        Ok(())
    }

    /// `self -= value`, failing on underflow with `self` unchanged.
    pub fn sub_assign_u64(&mut self, value: u64) -> Result<(), BiguintError> {
        self.sub_assign_u64_shifted(value, 0)
    }

    /// `self -= value << shift`, failing on underflow with `self` unchanged.
    pub fn sub_assign_u64_shifted(&mut self, value: u64, shift: u64) -> Result<(), BiguintError> {
        if value == 0 {
            return Ok(());
        }
        let limb = (shift / 64) as usize;
        let s = (shift % 64) as u32;
        let lo = value << s;
        let hi = if s == 0 { 0 } else { value >> (64 - s) };
        if self.cmp_two_limbs_at(limb, lo, hi) == Ordering::Less {
            return Err(BiguintError::Underflow);
        }
        // The subtrahend occupies limbs `limb` and `limb + 1`; grow the hull
        // so both are addressable even when the value ends exactly at `limb`.
        if self.words.len() < limb + 2 {
            self.words.resize(limb + 2, 0);
        }
        let mut borrow = 0u64;
        for (i, part) in [lo, hi].into_iter().enumerate() {
            let (d1, b1) = self.words[limb + i].overflowing_sub(part);
            let (d2, b2) = d1.overflowing_sub(borrow);
            self.words[limb + i] = d2;
            borrow = (b1 | b2) as u64;
        }
        let mut i = limb + 2;
        while borrow != 0 {
            let (d, b) = self.words[i].overflowing_sub(1);
            self.words[i] = d;
            borrow = b as u64;
            i += 1;
        }
        Ok(())
    }

    /// Compares `self` against the two-limb value `(hi, lo)` placed at limb
    /// index `limb`. At least one of `lo`/`hi` must be nonzero.
    fn cmp_two_limbs_at(&self, limb: usize, lo: u64, hi: u64) -> Ordering {
        let len = self.eff_len();
        let sub_len = if hi != 0 { limb + 2 } else { limb + 1 };
        if len != sub_len {
            return len.cmp(&sub_len);
        }
        for i in (0..len).rev() {
            let s = if i == limb + 1 {
                hi
            } else if i == limb {
                lo
            } else {
                0
            };
            match self.words[i].cmp(&s) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// Schoolbook product `self * rhs`.
    pub fn mul(&self, rhs: &Biguint) -> Biguint {
        let a = self.eff_len();
        let b = rhs.eff_len();
        let mut out = vec![0u64; a + b];
        for i in 0..a {
            let ai = self.words[i] as u128;
            let mut carry = 0u64;
            for j in 0..b {
                let t = ai * rhs.words[j] as u128 + out[i + j] as u128 + carry as u128;
                out[i + j] = t as u64;
                carry = (t >> 64) as u64;
            }
            out[i + b] += carry;
        }
        Biguint { words: out }
    }

    /// `self *= factor` with carry propagation into a fresh limb if needed.
    pub fn mul_assign_u64(&mut self, factor: u64) {
        let mut carry = 0u64;
        for w in &mut self.words {
            let t = *w as u128 * factor as u128 + carry as u128;
            *w = t as u64;
            carry = (t >> 64) as u64;
        }
        if carry != 0 {
            self.words.push(carry);
        }
    }

    /// Multiplies `self` by the rising factorial
    /// `base * (base+1) * ... * (base+count-1)`.
    ///
    /// Consecutive factors are batched into a single `u64` as long as their
    /// product fits, so the number of full-width passes over the limbs is
    /// far below `count`. Fails if `base + count - 1` exceeds `u64`.
    pub fn mul_assign_pochhammer(&mut self, base: u64, count: u64) -> Result<(), BiguintError> {
        let mut batch = 1u64;
        for i in 0..count {
            let factor = base.checked_add(i).ok_or(BiguintError::Overflow)?;
            match batch.checked_mul(factor) {
                Some(p) => batch = p,
                None => {
                    self.mul_assign_u64(batch);
                    batch = factor;
                }
            }
        }
        self.mul_assign_u64(batch);
        Ok(())
    }

    /// The rising factorial `base * (base+1) * ... * (base+count-1)` as a
    /// fresh value (`count == 0` gives 1).
    pub fn pochhammer(base: u64, count: u64) -> Result<Biguint, BiguintError> {
        let mut out = Biguint::from_u64(1);
        out.mul_assign_pochhammer(base, count)?;
        Ok(out)
    }

    /// Quotient and remainder of `self / divisor` (Knuth Algorithm D).
    pub fn divrem(&self, divisor: &Biguint) -> Result<(Biguint, Biguint), BiguintError> {
        if divisor.is_zero() {
            return Err(BiguintError::DivideByZero);
        }
        let dlen = divisor.eff_len();
        if dlen == 1 {
            let (q, r) = self.divrem_u64(divisor.words[0])?;
            return Ok((q, Biguint::from_u64(r)));
        }
        let nlen = self.eff_len();
        if self.cmp(divisor) == Ordering::Less {
            let mut r = self.clone();
            r.canonize();
            return Ok((Biguint::zero(), r));
        }

        // Normalize so the divisor's top limb has its high bit set; the
        // quotient-digit estimate is then off by at most two.
        let shift = divisor.words[dlen - 1].leading_zeros() as u64;
        let mut v = Biguint::from_le_words(&divisor.words[..dlen]);
        v.shl_assign_bits(shift);
        v.words.truncate(dlen);
        let mut u = Biguint::from_le_words(&self.words[..nlen]);
        u.shl_assign_bits(shift);
        u.words.resize(nlen + 1, 0);

        let m = nlen - dlen;
        let mut q = vec![0u64; m + 1];
        let vh = v.words[dlen - 1] as u128;
        let vl = v.words[dlen - 2] as u128;
        for j in (0..=m).rev() {
            let top = ((u.words[j + dlen] as u128) << 64) | u.words[j + dlen - 1] as u128;
            let mut qhat = top / vh;
            let mut rhat = top % vh;
            while qhat > u64::MAX as u128
                || qhat * vl > (rhat << 64) | u.words[j + dlen - 2] as u128
            {
                qhat -= 1;
                rhat += vh;
                if rhat > u64::MAX as u128 {
                    break;
                }
            }
            // Multiply-subtract; a surviving borrow means qhat was one too
            // large, fixed by a single add-back.
            let qd = qhat as u64;
            let mut carry = 0u128;
            let mut borrow = 0i128;
            for i in 0..dlen {
                let p = qd as u128 * v.words[i] as u128 + carry;
                carry = p >> 64;
                let t = u.words[j + i] as i128 - (p as u64) as i128 + borrow;
                u.words[j + i] = t as u64;
                borrow = t >> 64;
            }
            let t = u.words[j + dlen] as i128 - carry as i128 + borrow;
            u.words[j + dlen] = t as u64;
            if t < 0 {
                let mut c = 0u64;
                for i in 0..dlen {
                    let s = u.words[j + i] as u128 + v.words[i] as u128 + c as u128;
                    u.words[j + i] = s as u64;
                    c = (s >> 64) as u64;
                }
                u.words[j + dlen] = u.words[j + dlen].wrapping_add(c);
                q[j] = qd - 1;
            } else {
                q[j] = qd;
            }
        }

        u.words.truncate(dlen);
        u.shr_assign_bits(shift);
        Ok((Biguint { words: q }, u))
    }

    /// Quotient and remainder of `self / divisor` for a scalar divisor.
    pub fn divrem_u64(&self, divisor: u64) -> Result<(Biguint, u64), BiguintError> {
        if divisor == 0 {
            return Err(BiguintError::DivideByZero);
        }
        let len = self.eff_len();
        let mut q = vec![0u64; len];
        let mut rem = 0u128;
        for i in (0..len).rev() {
            let cur = (rem << 64) | self.words[i] as u128;
            q[i] = (cur / divisor as u128) as u64;
            rem = cur % divisor as u128;
        }
        Ok((Biguint { words: q }, rem as u64))
    }

    /// `self <<= bits`.
    pub fn shl_assign_bits(&mut self, bits: u64) {
        if bits == 0 || self.is_zero() {
            return;
        }
        let limb_shift = (bits / 64) as usize;
        let bit_shift = (bits % 64) as u32;
        let old_len = self.eff_len();
        let mut new = vec![0u64; old_len + limb_shift + 1];
        for i in 0..old_len {
            let w = self.words[i];
            new[i + limb_shift] |= w << bit_shift;
            if bit_shift != 0 {
                new[i + limb_shift + 1] |= w >> (64 - bit_shift);
            }
        }
        self.words = new;
    }

    /// `self >>= bits` (bits shifted past position zero are discarded).
    pub fn shr_assign_bits(&mut self, bits: u64) {
        let limb_shift = (bits / 64) as usize;
        let bit_shift = (bits % 64) as u32;
        let len = self.eff_len();
        if limb_shift >= len {
            self.words = vec![0];
            return;
        }
        let new_len = len - limb_shift;
        let mut new = vec![0u64; new_len];
        for i in 0..new_len {
            let lo = self.words[i + limb_shift] >> bit_shift;
            let hi = if bit_shift != 0 && i + limb_shift + 1 < len {
                self.words[i + limb_shift + 1] << (64 - bit_shift)
            } else {
                0
            };
            new[i] = lo | hi;
        }
        self.words = new;
    }

    pub fn shl_bits(&self, bits: u64) -> Biguint {
        let mut out = self.clone();
        out.shl_assign_bits(bits);
        out
    }

    pub fn shr_bits(&self, bits: u64) -> Biguint {
        let mut out = self.clone();
        out.shr_assign_bits(bits);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(dec: &str) -> Biguint {
        Biguint::from_decimal(dec).unwrap()
    }

    #[test]
    fn test_add_carry_chain() {
        let mut a = Biguint::from_le_words(&[u64::MAX, u64::MAX, u64::MAX]);
        a.add_assign_u64(1);
        assert_eq!(a, Biguint::from_le_words(&[0, 0, 0, 1]));
    }

    #[test]
    fn test_add_shifted_straddles_limbs() {
        let mut a = Biguint::zero();
        a.add_assign_u64_shifted(u64::MAX, 32);
        let mut b = Biguint::from_u64(u64::MAX);
        b.shl_assign_bits(32);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sub_underflow_leaves_value_intact() {
        let mut a = Biguint::from_u64(5);
        let err = a.sub_assign(&Biguint::from_u64(6));
        assert_eq!(err, Err(BiguintError::Underflow));
        assert_eq!(a, Biguint::from_u64(5));
        let err = a.sub_assign_u64_shifted(1, 64);
        assert_eq!(err, Err(BiguintError::Underflow));
        assert_eq!(a, Biguint::from_u64(5));
    }

    #[test]
    fn test_sub_borrow_chain() {
        let mut a = Biguint::from_le_words(&[0, 0, 1]);
        a.sub_assign_u64(1).unwrap();
        assert_eq!(a, Biguint::from_le_words(&[u64::MAX, u64::MAX]));
    }

    #[test]
    fn test_sub_scalar_from_single_limb() {
        let mut a = Biguint::from_u64(5);
        a.sub_assign_u64(3).unwrap();
        assert_eq!(a, Biguint::from_u64(2));

        let mut f = Biguint::pochhammer(3, 4).unwrap(); // 3*4*5*6 = 360
        f.sub_assign_u64(1).unwrap();
        assert_eq!(f, Biguint::from_u64(359));
    }

    #[test]
    fn test_sub_shifted_at_top_limb() {
        // Subtrahend lands exactly on the value's last limb with no hull.
        let mut a = Biguint::from_le_words(&[7, 9]);
        a.sub_assign_u64_shifted(9, 64).unwrap();
        assert_eq!(a, Biguint::from_u64(7));
    }

    #[test]
    fn test_sub_shifted_exact_to_zero() {
        let mut a = Biguint::from_u64(3);
        a.shl_assign_bits(100);
        a.sub_assign_u64_shifted(3, 100).unwrap();
        assert!(a.is_zero());
    }

    #[test]
    fn test_mul_known_square() {
        // (2^64 - 1)^2 = 2^128 - 2^65 + 1
        let a = Biguint::from_u64(u64::MAX);
        let p = a.mul(&a);
        assert_eq!(p.to_u128_saturating(), u128::MAX - (1 << 65) + 2);
    }

    #[test]
    fn test_pochhammer_factorial() {
        // 1 * 2 * ... * 25 = 25!
        let f = Biguint::pochhammer(1, 25).unwrap();
        assert_eq!(f.to_decimal(), "15511210043330985984000000");
        assert_eq!(Biguint::pochhammer(7, 0).unwrap(), Biguint::from_u64(1));
        assert!(Biguint::pochhammer(u64::MAX, 2).is_err());
    }

    #[test]
    fn test_pochhammer_zero_base() {
        assert!(Biguint::pochhammer(0, 3).unwrap().is_zero());
    }

    #[test]
    fn test_divrem_identity() {
        let n = big("123456789012345678901234567890123456789");
        let d = big("987654321987654321");
        let (q, r) = n.divrem(&d).unwrap();
        let mut back = q.mul(&d);
        back.add_assign(&r);
        assert_eq!(back, n);
        assert!(r < d);
    }

    #[test]
    fn test_divrem_requires_addback() {
        // Dividend crafted so the first quotient-digit estimate overshoots.
        let n = Biguint::from_le_words(&[0, u64::MAX - 1, 1 << 63]);
        let d = Biguint::from_le_words(&[u64::MAX, 1 << 63]);
        let (q, r) = n.divrem(&d).unwrap();
        let mut back = q.mul(&d);
        back.add_assign(&r);
        assert_eq!(back, n);
        assert!(r < d);
    }

    #[test]
    fn test_divrem_small_dividend() {
        let n = Biguint::from_u64(7);
        let d = big("18446744073709551616");
        let (q, r) = n.divrem(&d).unwrap();
        assert!(q.is_zero());
        assert_eq!(r, n);
    }

    #[test]
    fn test_divide_by_zero() {
        let n = Biguint::from_u64(1);
        assert_eq!(
            n.divrem(&Biguint::zero()),
            Err(BiguintError::DivideByZero)
        );
        assert_eq!(n.divrem_u64(0), Err(BiguintError::DivideByZero));
    }

    #[test]
    fn test_shift_roundtrip() {
        let v = big("340282366920938463463374607431768211455");
        let mut w = v.clone();
        w.shl_assign_bits(77);
        w.shr_assign_bits(77);
        assert_eq!(w, v);
    }

    #[test]
    fn test_shr_discards_low_bits() {
        let v = Biguint::from_u64(0b1011);
        assert_eq!(v.shr_bits(2), Biguint::from_u64(0b10));
        assert!(v.shr_bits(200).is_zero());
    }
}
