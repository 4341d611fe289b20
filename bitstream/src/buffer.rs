//! Growable bit sequence with a single read/write cursor.

use std::io;

use crate::endian::Endian;
use crate::error::{BitError, BitResult};

const MAX_UINT_BYTES: usize = 8;

/// A growable, bit-addressable buffer.
///
/// The buffer holds a sequence of bits and one cursor shared by reads and
/// writes. Writes overwrite in place while the cursor is inside the sequence
/// and append once it reaches the end. Bytes are laid out
/// least-significant-bit first: bit 0 of the sequence is the low bit of the
/// first byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bits: Vec<bool>,
    pos: usize,
}

impl BitBuffer {
    /// Creates a new empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty buffer with room for `bits` bits.
    #[must_use]
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits),
            pos: 0,
        }
    }

    /// Creates a buffer holding `bytes`, with the cursor at the start.
    pub fn from_bytes(bytes: &[u8]) -> BitResult<Self> {
        let mut buffer = Self::with_capacity(bytes.len().saturating_mul(8));
        let written = buffer.write_bytes(bytes);
        if written != bytes.len() {
            return Err(BitError::IncompleteWrite {
                expected: bytes.len(),
                written,
            });
        }
        buffer.reset_to_start();
        Ok(buffer)
    }

    /// Creates a buffer holding `bits`, with the cursor at the start.
    pub fn from_bits(bits: &[bool]) -> BitResult<Self> {
        let mut buffer = Self::with_capacity(bits.len());
        let written = buffer.write_bits(bits);
        if written != bits.len() {
            return Err(BitError::IncompleteWrite {
                expected: bits.len(),
                written,
            });
        }
        buffer.reset_to_start();
        Ok(buffer)
    }

    /// Returns the length of the sequence in bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the sequence holds no bits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the cursor position in bits.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bits between the cursor and the end.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    /// Moves the cursor to the first bit.
    pub fn reset_to_start(&mut self) {
        self.pos = 0;
    }

    /// Moves the cursor past the last bit.
    pub fn reset_to_end(&mut self) {
        self.pos = self.bits.len();
    }

    /// Returns `true` if the cursor sits at the end of the sequence.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.pos == self.bits.len()
    }

    /// Returns the whole bit sequence, independent of the cursor.
    #[must_use]
    pub fn as_bits(&self) -> &[bool] {
        &self.bits
    }

    /// Reads a single bit, or `None` at the end.
    pub fn read_bit(&mut self) -> Option<bool> {
        let bit = self.bits.get(self.pos).copied()?;
        self.pos += 1;
        Some(bit)
    }

    /// Writes a single bit at the cursor.
    pub fn write_bit(&mut self, bit: bool) {
        if self.pos < self.bits.len() {
            self.bits[self.pos] = bit;
        } else {
            self.bits.push(bit);
        }
        self.pos += 1;
    }

    /// Reads up to `out.len()` bytes and returns how many were produced.
    ///
    /// Each byte is assembled from up to 8 bits. A short final byte still
    /// counts; its missing high bits are zero.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::EndOfData`] only if the cursor was already at the
    /// end before the call.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> BitResult<usize> {
        if self.at_end() {
            return Err(BitError::EndOfData {
                requested: out.len().saturating_mul(8),
                available: 0,
            });
        }

        let mut produced = 0;
        while produced < out.len() && !self.at_end() {
            out[produced] = self.read_byte();
            produced += 1;
        }
        Ok(produced)
    }

    /// Reads up to `out.len()` bits and returns how many were read.
    ///
    /// Fewer bits than requested are returned at the end of the sequence.
    pub fn read_bits(&mut self, out: &mut [bool]) -> usize {
        let count = out.len().min(self.remaining());
        out[..count].copy_from_slice(&self.bits[self.pos..self.pos + count]);
        self.pos += count;
        count
    }

    /// Writes `bytes` at the cursor, least-significant bit of each byte first.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        for &byte in bytes {
            for i in 0..8 {
                self.write_bit((byte >> i) & 1 == 1);
            }
        }
        bytes.len()
    }

    /// Writes `bits` at the cursor, overwriting before appending.
    pub fn write_bits(&mut self, bits: &[bool]) -> usize {
        let overlap = bits.len().min(self.remaining());
        self.bits[self.pos..self.pos + overlap].copy_from_slice(&bits[..overlap]);
        self.bits.extend_from_slice(&bits[overlap..]);
        self.pos += bits.len();
        bits.len()
    }

    /// Reads a `byte_len`-byte unsigned integer in the given byte order.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidByteLength`] if `byte_len > 8` and
    /// [`BitError::EndOfData`] if fewer than `byte_len` bytes can be produced.
    pub fn read_uint(&mut self, byte_len: usize, endian: Endian) -> BitResult<u64> {
        if byte_len > MAX_UINT_BYTES {
            return Err(BitError::InvalidByteLength {
                len: byte_len,
                max: MAX_UINT_BYTES,
            });
        }
        if byte_len == 0 {
            return Ok(0);
        }

        let available = self.remaining();
        let mut bytes = [0u8; MAX_UINT_BYTES];
        let produced = self.read_bytes(&mut bytes[..byte_len])?;
        if produced < byte_len {
            return Err(BitError::EndOfData {
                requested: byte_len * 8,
                available,
            });
        }

        let value = match endian {
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => bytes[..byte_len]
                .iter()
                .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte)),
        };
        Ok(value)
    }

    /// Writes the low `byte_len` bytes of `value` in the given byte order.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidByteLength`] if `byte_len > 8`.
    pub fn write_uint(&mut self, value: u64, byte_len: usize, endian: Endian) -> BitResult<()> {
        if byte_len > MAX_UINT_BYTES {
            return Err(BitError::InvalidByteLength {
                len: byte_len,
                max: MAX_UINT_BYTES,
            });
        }

        match endian {
            Endian::Little => {
                self.write_bytes(&value.to_le_bytes()[..byte_len]);
            }
            Endian::Big => {
                self.write_bytes(&value.to_be_bytes()[MAX_UINT_BYTES - byte_len..]);
            }
        }
        Ok(())
    }

    /// Packs the entire sequence into bytes, independent of the cursor.
    ///
    /// A trailing partial byte is zero-padded.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.chunks(8).map(pack_byte).collect()
    }

    fn read_byte(&mut self) -> u8 {
        let end = (self.pos + 8).min(self.bits.len());
        let byte = pack_byte(&self.bits[self.pos..end]);
        self.pos = end;
        byte
    }
}

fn pack_byte(bits: &[bool]) -> u8 {
    bits.iter()
        .enumerate()
        .fold(0u8, |acc, (i, &bit)| acc | (u8::from(bit) << i))
}

impl io::Read for BitBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.at_end() {
            return Ok(0);
        }
        self.read_bytes(buf)
            .map_err(|err| io::Error::new(io::ErrorKind::UnexpectedEof, err))
    }
}

impl io::Write for BitBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_bytes(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
