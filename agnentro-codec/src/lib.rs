//! # agnentro-codec
//!
//! Adaptive exact-combinatorics entropy codec over fixed-span mask
//! sequences, with matching entropy measurement.
//!
//! The codec assigns every mask sequence of a given length a disjoint
//! integer interval whose width is the product of the adaptive add-one
//! frequencies the sequence passed through. Because that product depends
//! only on the multiset of masks, the emitted code length is
//! order-invariant, and because the intervals tile the total state count
//! exactly, the code is both minimal for the model and losslessly
//! reversible. [`entropy`] measures the same quantity analytically;
//! [`stream`] wraps codes in a self-delimiting byte frame.

pub mod codec;
pub mod entropy;
pub mod mask;
pub mod stream;
mod tree;

pub use codec::{
    Agnentrocodec, CodecConfig, CodecError, BUILD_BREAK_COUNT, BUILD_FEATURE_COUNT,
};
pub use entropy::{agnentropy_nats, rms_probability, shannon_fraction, FreqProfile};
pub use mask::{pack_masks, MaskList};
pub use stream::{compress, decompress};
