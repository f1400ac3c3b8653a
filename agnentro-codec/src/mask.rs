//! Raw-byte views of mask sequences.
//!
//! Masks travel through the codec as `u64`, but arrive from and return to
//! byte buffers of fixed-width little-endian elements (1 to 4 bytes).

use crate::codec::CodecError;

/// A mask sequence unpacked from bytes, with the largest value seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskList {
    masks: Vec<u64>,
    observed_max: u64,
}

impl MaskList {
    /// Unpacks `bytes` as little-endian elements of `width` bytes each.
    /// The buffer length must be an exact multiple of the width.
    pub fn unpack(bytes: &[u8], width: usize) -> Result<Self, CodecError> {
        if !(1..=4).contains(&width) {
            return Err(CodecError::BadElementWidth(width));
        }
        if bytes.len() % width != 0 {
            return Err(CodecError::RaggedBuffer {
                len: bytes.len(),
                width,
            });
        }
        let mut masks = Vec::with_capacity(bytes.len() / width);
        let mut observed_max = 0;
        for chunk in bytes.chunks_exact(width) {
            let mut mask = 0u64;
            for (i, &byte) in chunk.iter().enumerate() {
                mask |= (byte as u64) << (8 * i);
            }
            observed_max = observed_max.max(mask);
            masks.push(mask);
        }
        Ok(Self {
            masks,
            observed_max,
        })
    }

    pub fn masks(&self) -> &[u64] {
        &self.masks
    }

    /// Largest mask value in the sequence; zero when empty.
    pub fn observed_max(&self) -> u64 {
        self.observed_max
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}

/// Packs masks back into little-endian elements of `width` bytes each.
/// Fails on any mask too wide for the element.
pub fn pack_masks(masks: &[u64], width: usize) -> Result<Vec<u8>, CodecError> {
    if !(1..=4).contains(&width) {
        return Err(CodecError::BadElementWidth(width));
    }
    let limit = (1u64 << (8 * width)) - 1;
    let mut bytes = Vec::with_capacity(masks.len() * width);
    for &mask in masks {
        if mask > limit {
            return Err(CodecError::MaskOutOfRange {
                mask,
                mask_max: limit,
            });
        }
        for i in 0..width {
            bytes.push((mask >> (8 * i)) as u8);
        }
    }
    Ok(bytes)
}
