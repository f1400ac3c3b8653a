//! Logplex: a self-delimiting universal code for unsigned integers of
//! unbounded magnitude.
//!
//! The value plus one is written as a chain of binary groups, innermost
//! last: each group is the full binary expansion (leading 1 bit included)
//! of the next group's bit length minus one, and a single 0 bit terminates
//! the chain. The reader starts from an implicit group of value 1, so the
//! value 0 costs exactly one bit and small values stay small while the
//! scheme still scales to any magnitude.

use crate::biguint::{Biguint, BiguintError};
use crate::bitio::{BitReader, BitWriter};
use std::cmp::Ordering;

/// Appends the logplex encoding of `value` to `writer`.
pub fn logplex_write(writer: &mut BitWriter, value: &Biguint) {
    let mut x = value.clone();
    x.add_assign_u64(1);
    // Length chain, innermost first: each entry is the bit length minus one
    // of the group inside it. The chain collapses to 1 within a few steps.
    let mut chain: Vec<u64> = Vec::new();
    let mut n = x.bit_len() - 1;
    while n > 1 {
        chain.push(n);
        n = 63 - n.leading_zeros() as u64;
    }
    for &g in chain.iter().rev() {
        writer.write_bits_u64(g, 64 - g.leading_zeros());
    }
    if x.cmp_u64(1) == Ordering::Greater {
        writer.write_biguint_bits(&x, x.bit_len());
    }
    writer.write_bit(false);
}

/// Reads one logplex-encoded value from `reader`.
pub fn logplex_read(reader: &mut BitReader<'_>) -> Result<Biguint, BiguintError> {
    let mut group = Biguint::from_u64(1);
    while reader.read_bit()? {
        // A 1 bit is the leading bit of the next group; the previous group
        // says how many bits follow it.
        let count = group.to_u64_saturating();
        let mut next = Biguint::from_u64(1);
        for _ in 0..count {
            next.shl_assign_bits(1);
            if reader.read_bit()? {
                next.set_bit(0);
            }
        }
        group = next;
    }
    group.sub_assign_u64(1)?;
    Ok(group)
}

/// [`logplex_write`] for a native scalar.
pub fn logplex_write_u64(writer: &mut BitWriter, value: u64) {
    logplex_write(writer, &Biguint::from_u64(value));
}

/// [`logplex_read`] constrained to a native scalar; a wider value in the
/// stream is malformed input.
pub fn logplex_read_u64(reader: &mut BitReader<'_>) -> Result<u64, BiguintError> {
    let value = logplex_read(reader)?;
    if value.bit_len() > 64 {
        return Err(BiguintError::Malformed);
    }
    Ok(value.to_u64_wrapping())
}
