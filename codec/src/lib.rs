//! Serialize governance payloads in their canonical wire format.
//!
//! # Overview
//!
//! Every payload a chain node must be able to verify (transactions, blocks, aggregate
//! signatures, emergency requests) is written with the primitives in this crate:
//!
//! - Fixed-width integers (`u8`, `u16`, `u32`, `u64`) in little-endian order
//! - Fixed-size byte arrays (`[u8; N]`) written without a prefix
//! - [VarUint] lengths: one byte below `0xFD`, otherwise a marker byte (`0xFD`, `0xFE`,
//!   `0xFF`) followed by a little-endian `u16`, `u32` or `u64`
//! - Byte strings ([bytes::Bytes]) and vectors prefixed with a [VarUint] length
//!
//! Decoding untrusted input is bounded: variable-length types take a [RangeCfg] that
//! limits how many bytes (or items) may be allocated, and non-minimal [VarUint]
//! encodings are rejected so that every value has exactly one encoding.
//!
//! # Example
//!
//! ```
//! use bytes::{Buf, BufMut, Bytes};
//! use vigil_codec::{Decode, Encode, EncodeSize, Error, RangeCfg, Read, ReadExt, Write};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Memo {
//!     height: u32,
//!     note: Bytes,
//! }
//!
//! impl Write for Memo {
//!     fn write(&self, buf: &mut impl BufMut) {
//!         self.height.write(buf);
//!         self.note.write(buf);
//!     }
//! }
//!
//! impl EncodeSize for Memo {
//!     fn encode_size(&self) -> usize {
//!         self.height.encode_size() + self.note.encode_size()
//!     }
//! }
//!
//! impl Read for Memo {
//!     type Cfg = RangeCfg;
//!
//!     fn read_cfg(buf: &mut impl Buf, cfg: &RangeCfg) -> Result<Self, Error> {
//!         let height = u32::read(buf)?;
//!         let note = Bytes::read_cfg(buf, cfg)?;
//!         Ok(Self { height, note })
//!     }
//! }
//!
//! let memo = Memo { height: 7, note: Bytes::from_static(b"halt") };
//! let encoded = memo.encode();
//! assert_eq!(&encoded[..], &[7, 0, 0, 0, 4, b'h', b'a', b'l', b't']);
//! let decoded = Memo::decode_cfg(encoded, &(..=16).into()).unwrap();
//! assert_eq!(memo, decoded);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod types;
pub mod varint;

pub use codec::{Decode, DecodeExt, Encode, EncodeSize, FixedSize, Read, ReadExt, Write};
pub use config::RangeCfg;
pub use error::Error;
pub use varint::VarUint;
