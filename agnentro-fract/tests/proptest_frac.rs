//! Containment laws for the interval engines, checked against exact
//! integer references so no floating-point error can blur the bound.

use agnentro_fract::{Frac128, Frac64, Status};
use proptest::prelude::*;

/// True iff the interval contains the exact mantissa-scale rational
/// `num / 2^0` (a point landing exactly on the ULP grid).
fn holds64(f: Frac64, exact: u64) -> bool {
    f.lo <= exact && exact <= f.hi
}

proptest! {
    #[test]
    fn prop_add_contains_exact_sum(a in any::<u64>(), b in any::<u64>()) {
        let mut status = Status::new();
        let sum = Frac64::from_mantissa(a).add(Frac64::from_mantissa(b), &mut status);
        match a.checked_add(b) {
            Some(exact) => {
                prop_assert!(!status.is_flagged());
                prop_assert!(holds64(sum, exact));
            }
            None => prop_assert!(status.is_flagged()),
        }
    }

    #[test]
    fn prop_sub_contains_exact_difference(a in any::<u64>(), b in any::<u64>()) {
        let mut status = Status::new();
        let (hi, lo) = (a.max(b), a.min(b));
        let d = Frac64::from_mantissa(hi).sub(Frac64::from_mantissa(lo), &mut status);
        prop_assert!(!status.is_flagged());
        prop_assert!(holds64(d, hi - lo));
    }

    #[test]
    fn prop_mul_contains_exact_product(a in any::<u64>(), b in any::<u64>()) {
        let p = Frac64::from_mantissa(a).mul(Frac64::from_mantissa(b));
        let exact = (a as u128 * b as u128 >> 64) as u64;
        prop_assert!(holds64(p, exact));
        // The upper bound also covers the product of the suprema.
        let sup = ((a as u128 + 1) * (b as u128 + 1) - 1) >> 64;
        prop_assert!(p.hi as u128 >= sup);
    }

    #[test]
    fn prop_div_contains_exact_quotient(a in any::<u64>(), b in 1u64..) {
        let mut status = Status::new();
        let q = Frac64::from_mantissa(a).div(Frac64::from_mantissa(b), &mut status);
        let exact = ((a as u128) << 64) / (b as u128 + 1);
        if exact <= u64::MAX as u128 {
            prop_assert!(q.lo <= exact as u64);
        }
        prop_assert!(q.hi as u128 >= ((a as u128) << 64) / b as u128 || q.hi == u64::MAX);
    }

    #[test]
    fn prop_sqrt_brackets_integer_root(a in any::<u64>()) {
        let r = Frac64::from_mantissa(a).sqrt();
        let n = (a as u128) << 64;
        prop_assert!(r.lo as u128 * r.lo as u128 <= n);
        let hi1 = r.hi as u128 + 1;
        prop_assert!(hi1 * hi1 > n);
    }

    #[test]
    fn prop_scalar_mul_div_never_narrows(a in any::<u64>(), v in 1u64..1_000_000) {
        let mut status = Status::new();
        let x = Frac64::from_mantissa(a);
        let y = x.mul_scalar(v, &mut status).div_scalar(v, &mut status);
        if !status.is_flagged() {
            prop_assert!(y.lo <= x.lo && x.hi <= y.hi);
        }
    }

    #[test]
    fn prop_union_contains_both(a in any::<u64>(), b in any::<u64>(), c in any::<u64>(), d in any::<u64>()) {
        let x = Frac64::new(a.min(b), a.max(b));
        let y = Frac64::new(c.min(d), c.max(d));
        let u = x.union(y);
        prop_assert!(u.lo <= x.lo && x.hi <= u.hi);
        prop_assert!(u.lo <= y.lo && y.hi <= u.hi);
    }

    #[test]
    fn prop_shr_shl_containment(a in any::<u64>(), s in 0u32..32) {
        let mut status = Status::new();
        let x = Frac64::from_mantissa(a);
        let y = x.shr(s).shl(s, &mut status);
        prop_assert!(!status.is_flagged());
        prop_assert!(y.lo <= x.lo && x.hi <= y.hi);
    }

    #[test]
    fn prop_frac128_mul_contains_exact_product(a in any::<u128>(), b in any::<u128>()) {
        let p = Frac128::from_mantissa(a).mul(Frac128::from_mantissa(b));
        let exact = agnentro_fract::frac128::umul256(a, b).0;
        prop_assert!(p.lo <= exact && exact <= p.hi);
    }

    #[test]
    fn prop_frac128_add_sub_roundtrip(a in 0..u128::MAX / 2, b in 0..u128::MAX / 2) {
        let mut status = Status::new();
        let x = Frac128::from_mantissa(a);
        let y = Frac128::from_mantissa(b);
        let z = x.add(y, &mut status).sub(y, &mut status);
        prop_assert!(!status.is_flagged());
        prop_assert!(z.lo <= a && a <= z.hi);
    }

    #[test]
    fn prop_frac128_scalar_ops(a in 0..1u128 << 96, v in 1u64..65536) {
        let mut status = Status::new();
        let x = Frac128::from_mantissa(a);
        let y = x.mul_scalar(v, &mut status).div_scalar(v, &mut status);
        prop_assert!(!status.is_flagged());
        prop_assert!(y.lo <= a && a <= y.hi);
    }
}
