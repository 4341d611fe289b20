//! Bit-addressable buffer primitives for the bitform codec.
//!
//! This crate provides [`BitBuffer`], a growable bit sequence with a single
//! cursor used both as a byte stream and as a raw bit stream, and [`Endian`],
//! the per-field byte order.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bit exact** - Bit 0 of a byte is its least-significant bit; a trailing
//!   partial byte is zero-padded.
//! - **No domain knowledge** - This crate knows nothing about records, fields, or annotations.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitBuffer, Endian};
//!
//! let mut buffer = BitBuffer::new();
//! buffer.write_bits(&[true, false, true]);
//! buffer.write_uint(0x1234, 2, Endian::Big).unwrap();
//!
//! let bytes = buffer.to_bytes();
//!
//! let mut reader = BitBuffer::from_bytes(&bytes).unwrap();
//! let mut bits = [false; 3];
//! assert_eq!(reader.read_bits(&mut bits), 3);
//! assert_eq!(bits, [true, false, true]);
//! assert_eq!(reader.read_uint(2, Endian::Big).unwrap(), 0x1234);
//! ```

mod buffer;
mod endian;
mod error;

pub use buffer::BitBuffer;
pub use endian::Endian;
pub use error::{BitError, BitResult};
