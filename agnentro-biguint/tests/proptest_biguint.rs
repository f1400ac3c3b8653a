//! Arithmetic-law properties checked against a reference big-integer
//! implementation.

use agnentro_biguint::{logplex_read, logplex_write, BitReader, BitWriter, Biguint};
use num_bigint::BigUint as RefUint;
use proptest::prelude::*;

fn to_ref(v: &Biguint) -> RefUint {
    RefUint::parse_bytes(v.to_decimal().as_bytes(), 10).unwrap()
}

fn from_limbs(limbs: &[u64]) -> (Biguint, RefUint) {
    let ours = Biguint::from_le_words(limbs);
    (ours.clone(), to_ref(&ours))
}

fn limbs() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(any::<u64>(), 1..6)
}

proptest! {
    #[test]
    fn prop_add_commutes_and_matches_reference(a in limbs(), b in limbs()) {
        let (ba, ra) = from_limbs(&a);
        let (bb, rb) = from_limbs(&b);
        let mut ab = ba.clone();
        ab.add_assign(&bb);
        let mut ba2 = bb.clone();
        ba2.add_assign(&ba);
        prop_assert_eq!(&ab, &ba2);
        prop_assert_eq!(to_ref(&ab), ra + rb);
    }

    #[test]
    fn prop_mul_associates_and_matches_reference(a in limbs(), b in limbs(), c in limbs()) {
        let (ba, ra) = from_limbs(&a);
        let (bb, rb) = from_limbs(&b);
        let (bc, rc) = from_limbs(&c);
        let left = ba.mul(&bb).mul(&bc);
        let right = ba.mul(&bb.mul(&bc));
        prop_assert_eq!(&left, &right);
        prop_assert_eq!(to_ref(&left), ra * rb * rc);
    }

    #[test]
    fn prop_sub_inverts_add(a in limbs(), b in limbs()) {
        let (ba, _) = from_limbs(&a);
        let (bb, _) = from_limbs(&b);
        let mut sum = ba.clone();
        sum.add_assign(&bb);
        sum.sub_assign(&bb).unwrap();
        prop_assert_eq!(sum, ba);
    }

    #[test]
    fn prop_divmod_identity(n in limbs(), d in limbs()) {
        let (bn, rn) = from_limbs(&n);
        let (bd, rd) = from_limbs(&d);
        prop_assume!(!bd.is_zero());
        let (q, r) = bn.divrem(&bd).unwrap();
        prop_assert!(r < bd);
        let mut back = q.mul(&bd);
        back.add_assign(&r);
        prop_assert_eq!(back, bn);
        prop_assert_eq!(to_ref(&q), &rn / &rd);
        prop_assert_eq!(to_ref(&r), rn % rd);
    }

    #[test]
    fn prop_scalar_div_agrees_with_wide_div(n in limbs(), d in 1u64..) {
        let (bn, _) = from_limbs(&n);
        let (q1, r1) = bn.divrem_u64(d).unwrap();
        let (q2, r2) = bn.divrem(&Biguint::from_u64(d)).unwrap();
        prop_assert_eq!(q1, q2);
        prop_assert_eq!(Biguint::from_u64(r1), r2);
    }

    #[test]
    fn prop_shl_then_shr_is_identity(v in limbs(), s in 0u64..500) {
        let (bv, rv) = from_limbs(&v);
        let shifted = bv.shl_bits(s);
        prop_assert_eq!(to_ref(&shifted), rv << s as usize);
        prop_assert_eq!(shifted.shr_bits(s), bv);
    }

    #[test]
    fn prop_shifted_scalar_add_matches_composed_ops(
        v in limbs(),
        x in any::<u64>(),
        s in 0u64..200,
    ) {
        let (bv, _) = from_limbs(&v);
        let mut fast = bv.clone();
        fast.add_assign_u64_shifted(x, s);
        let mut slow = Biguint::from_u64(x);
        slow.shl_assign_bits(s);
        slow.add_assign(&bv);
        prop_assert_eq!(&fast, &slow);
        fast.sub_assign_u64_shifted(x, s).unwrap();
        prop_assert_eq!(fast, bv);
    }

    #[test]
    fn prop_pochhammer_matches_reference(base in 1u64..10_000, count in 0u64..200) {
        let ours = Biguint::pochhammer(base, count).unwrap();
        let mut reference = RefUint::from(1u64);
        for i in 0..count {
            reference *= RefUint::from(base + i);
        }
        prop_assert_eq!(to_ref(&ours), reference);
    }

    #[test]
    fn prop_decimal_parse_matches_reference(v in limbs()) {
        let (bv, rv) = from_limbs(&v);
        prop_assert_eq!(bv.to_decimal(), rv.to_str_radix(10));
        prop_assert_eq!(Biguint::from_decimal(&rv.to_str_radix(10)).unwrap(), bv.clone());
        prop_assert_eq!(bv.to_hex(), rv.to_str_radix(16));
    }

    #[test]
    fn prop_bit_len_matches_reference(v in limbs()) {
        let (bv, rv) = from_limbs(&v);
        prop_assert_eq!(bv.bit_len(), rv.bits());
    }

    #[test]
    fn prop_logplex_roundtrip(v in limbs()) {
        let (bv, _) = from_limbs(&v);
        let mut w = BitWriter::new();
        logplex_write(&mut w, &bv);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        prop_assert_eq!(logplex_read(&mut r).unwrap(), bv);
    }

    #[test]
    fn prop_export_import_roundtrip(v in limbs(), offset in 0u64..64) {
        let (bv, _) = from_limbs(&v);
        let count = bv.bit_len().max(1);
        let mut buf = vec![0u8; ((offset + count + 7) / 8) as usize];
        bv.export_bits(&mut buf, offset, count).unwrap();
        prop_assert_eq!(Biguint::import_bits(&buf, offset, count).unwrap(), bv);
    }
}
