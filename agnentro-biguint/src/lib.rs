//! # agnentro-biguint
//!
//! Arbitrary-precision unsigned integer arithmetic for the Agnentro exact
//! entropy codec.
//!
//! This crate provides [`Biguint`], a nonnegative integer stored as
//! little-endian `u64` limbs, together with:
//! - in-place add/sub/mul (including the Pochhammer rising-factorial
//!   multiply the codec uses to count state spaces), Knuth long division,
//!   and bit-level operations;
//! - MSB-first [`BitWriter`]/[`BitReader`] plus arbitrary-bit-offset
//!   export/import against caller byte buffers;
//! - the logplex universal code: a self-delimiting recursive binary
//!   encoding of an integer of unbounded magnitude.
//!
//! Determinism: every operation is synchronous and side-effect-only on the
//! value it was handed; there is no global state and no hidden I/O.

pub mod biguint;
pub mod bitio;
pub mod logplex;
pub mod ops;

pub use biguint::{Biguint, BiguintError};
pub use bitio::{BitReader, BitWriter};
pub use logplex::{logplex_read, logplex_read_u64, logplex_write, logplex_write_u64};
