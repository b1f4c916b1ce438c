//! Variable-length integer encoding and decoding
//!
//! Lengths and counts are written as a `VarUint`:
//! - values below `0xFD` use a single byte
//! - values up to `u16::MAX` use `0xFD` followed by a little-endian `u16`
//! - values up to `u32::MAX` use `0xFE` followed by a little-endian `u32`
//! - all other values use `0xFF` followed by a little-endian `u64`
//!
//! Decoding rejects values that could have been written in a shorter form.

use crate::{codec::at_least, EncodeSize, Error, Read, Write};
use bytes::{Buf, BufMut};

const MARKER_U16: u8 = 0xFD;
const MARKER_U32: u8 = 0xFE;
const MARKER_U64: u8 = 0xFF;

/// Encodes an unsigned integer as a varint.
pub fn write(value: u64, buf: &mut impl BufMut) {
    if value < MARKER_U16 as u64 {
        buf.put_u8(value as u8);
    } else if value <= u16::MAX as u64 {
        buf.put_u8(MARKER_U16);
        buf.put_u16_le(value as u16);
    } else if value <= u32::MAX as u64 {
        buf.put_u8(MARKER_U32);
        buf.put_u32_le(value as u32);
    } else {
        buf.put_u8(MARKER_U64);
        buf.put_u64_le(value);
    }
}

/// Decodes an unsigned integer from a varint.
pub fn read(buf: &mut impl Buf) -> Result<u64, Error> {
    at_least(buf, 1)?;
    let (value, min) = match buf.get_u8() {
        MARKER_U16 => {
            at_least(buf, 2)?;
            (buf.get_u16_le() as u64, MARKER_U16 as u64)
        }
        MARKER_U32 => {
            at_least(buf, 4)?;
            (buf.get_u32_le() as u64, u16::MAX as u64 + 1)
        }
        MARKER_U64 => {
            at_least(buf, 8)?;
            (buf.get_u64_le(), u32::MAX as u64 + 1)
        }
        byte => return Ok(byte as u64),
    };
    if value < min {
        return Err(Error::InvalidVarint);
    }
    Ok(value)
}

/// Calculates the number of bytes needed to encode an unsigned integer as a varint.
pub fn size(value: u64) -> usize {
    if value < MARKER_U16 as u64 {
        1
    } else if value <= u16::MAX as u64 {
        3
    } else if value <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Reads a varint length and checks that it fits in a `usize`.
pub(crate) fn read_len(buf: &mut impl Buf) -> Result<usize, Error> {
    let len = read(buf)?;
    usize::try_from(len).map_err(|_| Error::InvalidVarint)
}

/// An ergonomic wrapper to allow for encoding and decoding `u64` values as varints
/// rather than fixed-width integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarUint(pub u64);

impl Write for VarUint {
    fn write(&self, buf: &mut impl BufMut) {
        write(self.0, buf);
    }
}

impl Read for VarUint {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        read(buf).map(VarUint)
    }
}

impl EncodeSize for VarUint {
    fn encode_size(&self) -> usize {
        size(self.0)
    }
}

impl From<VarUint> for u64 {
    fn from(value: VarUint) -> Self {
        value.0
    }
}
