//! Bit-granular buffer I/O.
//!
//! The stream convention throughout is MSB-first: stream bit `i` lives in
//! byte `i / 8` at in-byte position `7 - i % 8`, and a multi-bit field is
//! written most significant bit first. [`BitWriter`]/[`BitReader`] cover
//! append/scan access; [`Biguint::export_bits`]/[`Biguint::import_bits`]
//! cover random-offset copies against caller-owned byte buffers.

use crate::biguint::{Biguint, BiguintError};

impl Biguint {
    /// Copies the low `bit_count` bits of `self` into `buf` starting at
    /// stream position `bit_offset`, most significant bit first. Other bits
    /// of `buf` are preserved. Fails without touching `buf` when the range
    /// does not fit.
    pub fn export_bits(
        &self,
        buf: &mut [u8],
        bit_offset: u64,
        bit_count: u64,
    ) -> Result<(), BiguintError> {
        let capacity = buf.len() as u64 * 8;
        let end = bit_offset
            .checked_add(bit_count)
            .ok_or(BiguintError::Overflow)?;
        if end > capacity {
            return Err(BiguintError::Capacity {
                offset: bit_offset,
                count: bit_count,
                capacity,
            });
        }
        for i in 0..bit_count {
            let pos = bit_offset + i;
            let mask = 0x80u8 >> (pos % 8);
            if self.bit(bit_count - 1 - i) {
                buf[(pos / 8) as usize] |= mask;
            } else {
                buf[(pos / 8) as usize] &= !mask;
            }
        }
        Ok(())
    }

    /// Reads `bit_count` bits from `buf` starting at stream position
    /// `bit_offset`, most significant bit first.
    pub fn import_bits(
        buf: &[u8],
        bit_offset: u64,
        bit_count: u64,
    ) -> Result<Biguint, BiguintError> {
        let capacity = buf.len() as u64 * 8;
        let end = bit_offset
            .checked_add(bit_count)
            .ok_or(BiguintError::Overflow)?;
        if end > capacity {
            return Err(BiguintError::Capacity {
                offset: bit_offset,
                count: bit_count,
                capacity,
            });
        }
        let mut out = Biguint::zero();
        for i in 0..bit_count {
            let pos = bit_offset + i;
            if buf[(pos / 8) as usize] >> (7 - pos % 8) & 1 == 1 {
                out.set_bit(bit_count - 1 - i);
            }
        }
        Ok(out)
    }
}

/// Append-only MSB-first bit sink backed by a growable byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    pub fn write_bit(&mut self, bit: bool) {
        let byte = (self.bit_len / 8) as usize;
        if byte == self.bytes.len() {
            self.bytes.push(0);
        }
        if bit {
            self.bytes[byte] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    /// Writes the low `count` bits of `value`, most significant first.
    pub fn write_bits_u64(&mut self, value: u64, count: u32) {
        for i in (0..count).rev() {
            self.write_bit(value >> i & 1 == 1);
        }
    }

    /// Writes the low `count` bits of `value`, most significant first.
    pub fn write_biguint_bits(&mut self, value: &Biguint, count: u64) {
        for i in (0..count).rev() {
            self.write_bit(value.bit(i));
        }
    }

    /// Pads with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        while self.bit_len % 8 != 0 {
            self.write_bit(false);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// MSB-first bit scanner over a borrowed byte buffer.
#[derive(Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn remaining(&self) -> u64 {
        self.bytes.len() as u64 * 8 - self.pos
    }

    pub fn read_bit(&mut self) -> Result<bool, BiguintError> {
        if self.pos >= self.bytes.len() as u64 * 8 {
            return Err(BiguintError::UnexpectedEnd);
        }
        let bit = self.bytes[(self.pos / 8) as usize] >> (7 - self.pos % 8) & 1 == 1;
        self.pos += 1;
        Ok(bit)
    }

    /// Reads `count` bits into the low end of a `u64`, most significant
    /// stream bit first. `count` must not exceed 64.
    pub fn read_bits_u64(&mut self, count: u32) -> Result<u64, BiguintError> {
        let mut acc = 0u64;
        for _ in 0..count {
            acc = acc << 1 | self.read_bit()? as u64;
        }
        Ok(acc)
    }

    pub fn read_biguint_bits(&mut self, count: u64) -> Result<Biguint, BiguintError> {
        let mut out = Biguint::zero();
        for i in 0..count {
            if self.read_bit()? {
                out.set_bit(count - 1 - i);
            }
        }
        Ok(out)
    }
}
