//! Self-delimiting byte-stream container around the codec.
//!
//! Layout, MSB-first: logplex(mask count), logplex(mask_max), the
//! canonical code left-justified, zero padding to the next byte boundary.
//! The decoder treats every remaining bit after the header as declared
//! code length; the padding is harmless because code normalization scales
//! by declared length rather than trusting it.

use agnentro_biguint::{logplex_read_u64, logplex_write_u64, BitReader, BitWriter};

use crate::codec::{Agnentrocodec, CodecConfig, CodecError};

/// Encodes `masks` through `codec` and wraps the code in a stream frame.
pub fn compress(codec: &mut Agnentrocodec, masks: &[u64]) -> Result<Vec<u8>, CodecError> {
    codec.encode(masks)?;
    let mut writer = BitWriter::new();
    logplex_write_u64(&mut writer, masks.len() as u64);
    logplex_write_u64(&mut writer, codec.config().mask_max);
    writer.write_biguint_bits(codec.code(), codec.code_bit_len());
    writer.align_to_byte();
    Ok(writer.into_bytes())
}

/// Decodes one stream frame produced by [`compress`], rebuilding the
/// codec session from the frame header.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u64>, CodecError> {
    let mut reader = BitReader::new(bytes);
    let count = logplex_read_u64(&mut reader).map_err(|_| CodecError::Stream)?;
    let mask_max = logplex_read_u64(&mut reader).map_err(|_| CodecError::Stream)?;
    let mut codec = Agnentrocodec::new(CodecConfig::new(mask_max, count))?;
    codec.code_import(bytes, reader.pos(), reader.remaining())?;
    codec.decode(count)
}
