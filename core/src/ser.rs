//! `ByteFormat`: the bit-exact encode/decode contract used throughout the workspace.
//!
//! Any deviation between `write_to` and the canonical wire layout it documents is a correctness
//! bug, not a style choice -- these bytes are hashed and signed.

use std::io::{Read, Write};

use thiserror::Error;

/// Errors arising from (de)serialization.
#[derive(Debug, Error)]
pub enum SerError {
    /// Propagated I/O error from the underlying reader/writer.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// A compact (varint) integer used a non-minimal encoding.
    #[error("Non-minimal CompactInt encoding")]
    NonMinimalCompactInt,

    /// Hex decoding failed.
    #[error(transparent)]
    HexError(#[from] hex::FromHexError),

    /// The reader produced fewer bytes than a fixed-size field requires.
    #[error("Unexpected EOF while reading a fixed-size field")]
    UnexpectedEof,
}

/// Result alias for `ByteFormat` operations.
pub type SerResult<T> = Result<T, SerError>;

/// A type that can be written to and read from a canonical byte encoding.
///
/// Implementors get `write_u32_le`/`read_u32_le`/etc as associated functions so that the
/// serialize/deserialize bodies of composite types read as a flat sequence of field writes,
/// matching the wire layout top to bottom.
pub trait ByteFormat: Sized {
    /// The error type returned on malformed input.
    type Error: From<SerError> + std::error::Error;

    /// The length, in bytes, of this value's canonical encoding.
    fn serialized_length(&self) -> usize;

    /// Decode `Self` from a reader holding its canonical encoding.
    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error>;

    /// Encode `Self` to its canonical byte representation, returning the number of bytes written.
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error>;

    /// Write a little-endian `u32`.
    fn write_u32_le<W: Write>(writer: &mut W, n: u32) -> Result<usize, Self::Error> {
        writer.write_all(&n.to_le_bytes()).map_err(SerError::from)?;
        Ok(4)
    }

    /// Write a little-endian `u64`.
    fn write_u64_le<W: Write>(writer: &mut W, n: u64) -> Result<usize, Self::Error> {
        writer.write_all(&n.to_le_bytes()).map_err(SerError::from)?;
        Ok(8)
    }

    /// Read a little-endian `u32`.
    fn read_u32_le<R: Read>(reader: &mut R) -> Result<u32, Self::Error> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).map_err(SerError::from)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a little-endian `u64`.
    fn read_u64_le<R: Read>(reader: &mut R) -> Result<u64, Self::Error> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).map_err(SerError::from)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Encode to a hex string.
    fn serialize_hex(&self) -> Result<String, Self::Error> {
        let mut buf = vec![];
        self.write_to(&mut buf)?;
        Ok(hex::encode(buf))
    }

    /// Decode from a hex string.
    fn deserialize_hex(s: &str) -> Result<Self, Self::Error> {
        let bytes = hex::decode(s).map_err(SerError::from)?;
        Self::read_from(&mut bytes.as_slice())
    }
}

/// Read a Bitcoin "CompactSize" (varint) integer, enforcing minimal encoding.
///
/// Encoding: `< 0xfd` as 1 byte; `0xfd` + u16 LE; `0xfe` + u32 LE; `0xff` + u64 LE.
pub fn read_compact_int<R: Read>(reader: &mut R) -> SerResult<u64> {
    let mut prefix = [0u8; 1];
    reader.read_exact(&mut prefix)?;
    match prefix[0] {
        0xff => {
            let mut buf = [0u8; 8];
            reader.read_exact(&mut buf)?;
            let n = u64::from_le_bytes(buf);
            if n < 0x1_0000_0000 {
                return Err(SerError::NonMinimalCompactInt);
            }
            Ok(n)
        }
        0xfe => {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            let n = u32::from_le_bytes(buf) as u64;
            if n < 0xfd {
                return Err(SerError::NonMinimalCompactInt);
            }
            Ok(n)
        }
        0xfd => {
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            let n = u16::from_le_bytes(buf) as u64;
            if n < 0xfd {
                return Err(SerError::NonMinimalCompactInt);
            }
            Ok(n)
        }
        n => Ok(n as u64),
    }
}

/// Write a Bitcoin "CompactSize" (varint) integer using the minimal encoding for `n`.
pub fn write_compact_int<W: Write>(writer: &mut W, n: u64) -> SerResult<usize> {
    if n < 0xfd {
        writer.write_all(&[n as u8])?;
        Ok(1)
    } else if n <= 0xffff {
        writer.write_all(&[0xfd])?;
        writer.write_all(&(n as u16).to_le_bytes())?;
        Ok(3)
    } else if n <= 0xffff_ffff {
        writer.write_all(&[0xfe])?;
        writer.write_all(&(n as u32).to_le_bytes())?;
        Ok(5)
    } else {
        writer.write_all(&[0xff])?;
        writer.write_all(&n.to_le_bytes())?;
        Ok(9)
    }
}

/// The serialized length of `n` as a CompactSize integer.
pub fn compact_int_length(n: u64) -> usize {
    if n < 0xfd {
        1
    } else if n <= 0xffff {
        3
    } else if n <= 0xffff_ffff {
        5
    } else {
        9
    }
}
