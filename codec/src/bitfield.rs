//! Sub-byte integer packing.
//!
//! A field of `width` bits is laid out least-significant bit first. For
//! big-endian fields the bits are split into 8-bit groups (the last one may
//! be short) and the groups, not the bits inside them, are written in
//! reverse order. A byte-aligned big-endian field therefore matches the
//! conventional byte order, while fields that straddle byte boundaries keep
//! each group's internal bit layout.

use bitstream::{BitBuffer, Endian};

use crate::error::{CodecError, CodecResult};

const GROUP_BITS: usize = 8;

/// Writes the low `width` bits of `raw`.
pub fn pack_bits(buffer: &mut BitBuffer, raw: u64, width: u32, endian: Endian) {
    let bits: Vec<bool> = (0..width).map(|i| (raw >> i) & 1 == 1).collect();
    match endian {
        Endian::Little => {
            buffer.write_bits(&bits);
        }
        Endian::Big => {
            for group in bits.chunks(GROUP_BITS).rev() {
                buffer.write_bits(group);
            }
        }
    }
}

/// Reads `width` bits written by [`pack_bits`].
///
/// # Errors
///
/// Returns [`CodecError::EndOfData`] if fewer than `width` bits remain.
pub fn unpack_bits(buffer: &mut BitBuffer, width: u32, endian: Endian) -> CodecResult<u64> {
    let width = width as usize;
    let mut bits = vec![false; width];
    let read = buffer.read_bits(&mut bits);
    if read < width {
        return Err(CodecError::EndOfData {
            requested: width,
            available: read,
        });
    }

    let ordered: Box<dyn Iterator<Item = &bool>> = match endian {
        Endian::Little => Box::new(bits.iter()),
        Endian::Big => Box::new(bits.rchunks(GROUP_BITS).flatten()),
    };
    Ok(ordered
        .enumerate()
        .fold(0u64, |acc, (i, &bit)| acc | (u64::from(bit) << i)))
}

/// Sign-extends the low `width` bits of `raw` as a two's-complement value.
#[must_use]
pub const fn sign_extend(raw: u64, width: u32) -> i64 {
    if width == 0 || width >= 64 {
        return raw as i64;
    }
    let shift = 64 - width;
    ((raw << shift) as i64) >> shift
}
