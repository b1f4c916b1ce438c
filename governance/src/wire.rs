//! Decode limits and helpers for length-prefixed fixed-size values.
//!
//! Keys and signatures inside governance payloads are written as `varBytes`
//! (`VarUint(len) ‖ bytes`) even though their length is fixed, so readers must check the
//! prefix matches before reading the value.

use bytes::{Buf, BufMut};
use vigil_codec::{varint, Error, FixedSize, Read, Write};

/// Bounds applied to every variable-length field while decoding untrusted payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum length of a method name in bytes.
    pub max_method: usize,

    /// Maximum number of parameters in an invocation.
    pub max_params: usize,

    /// Maximum length of a single encoded parameter.
    pub max_param_size: usize,

    /// Maximum number of keys (or signatures) in a signer list.
    pub max_signers: usize,

    /// Maximum number of aggregate signatures attached to a transaction or request.
    pub max_groups: usize,

    /// Maximum number of transactions in a block.
    pub max_transactions: usize,

    /// Maximum length of a consensus payload.
    pub max_payload: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_method: 256,
            max_params: 64,
            max_param_size: 1 << 16,
            max_signers: 1024,
            max_groups: 16,
            max_transactions: 1 << 14,
            max_payload: 1 << 20,
        }
    }
}

/// Writes a fixed-size value with a `VarUint` length prefix.
pub fn write_var<T: Write + FixedSize>(value: &T, buf: &mut impl BufMut) {
    varint::write(T::SIZE as u64, buf);
    value.write(buf);
}

/// Reads a fixed-size value written by [write_var].
pub fn read_var<T: Read<Cfg = ()> + FixedSize>(buf: &mut impl Buf) -> Result<T, Error> {
    let len = varint::read(buf)?;
    if len != T::SIZE as u64 {
        return Err(Error::InvalidLength(len.min(usize::MAX as u64) as usize));
    }
    T::read_cfg(buf, &())
}

/// Encoded size of a fixed-size value written by [write_var].
pub fn var_size<T: FixedSize>() -> usize {
    varint::size(T::SIZE as u64) + T::SIZE
}

/// Reads a `VarUint` count, rejecting values above `max`.
pub fn read_count(buf: &mut impl Buf, max: usize) -> Result<usize, Error> {
    let count = varint::read(buf)?;
    match usize::try_from(count) {
        Ok(count) if count <= max => Ok(count),
        _ => Err(Error::InvalidLength(count.min(usize::MAX as u64) as usize)),
    }
}
