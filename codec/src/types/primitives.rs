//! Codec implementations for Rust primitive types.
//!
//! All fixed-width integers are written little-endian. `usize` is deliberately not
//! supported: lengths go through [crate::VarUint] so that the wire format is identical
//! across architectures.

use crate::{codec::at_least, Error, FixedSize, Read, Write};
use bytes::{Buf, BufMut};

macro_rules! impl_numeric {
    ($type:ty, $read_method:ident, $write_method:ident) => {
        impl Write for $type {
            #[inline]
            fn write(&self, buf: &mut impl BufMut) {
                buf.$write_method(*self);
            }
        }

        impl Read for $type {
            type Cfg = ();

            #[inline]
            fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
                at_least(buf, std::mem::size_of::<$type>())?;
                Ok(buf.$read_method())
            }
        }

        impl FixedSize for $type {
            const SIZE: usize = std::mem::size_of::<$type>();
        }
    };
}

impl_numeric!(u8, get_u8, put_u8);
impl_numeric!(u16, get_u16_le, put_u16_le);
impl_numeric!(u32, get_u32_le, put_u32_le);
impl_numeric!(u64, get_u64_le, put_u64_le);

impl Write for bool {
    #[inline]
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(u8::from(*self));
    }
}

impl Read for bool {
    type Cfg = ();

    #[inline]
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        match u8::read_cfg(buf, &())? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(Error::InvalidEnum("bool", value)),
        }
    }
}

impl FixedSize for bool {
    const SIZE: usize = 1;
}

impl<const N: usize> Write for [u8; N] {
    #[inline]
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_slice(self);
    }
}

impl<const N: usize> Read for [u8; N] {
    type Cfg = ();

    #[inline]
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        at_least(buf, N)?;
        let mut dst = [0; N];
        buf.copy_to_slice(&mut dst);
        Ok(dst)
    }
}

impl<const N: usize> FixedSize for [u8; N] {
    const SIZE: usize = N;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecodeExt, Encode, EncodeSize};
    use bytes::Bytes;

    #[test]
    fn test_little_endian() {
        assert_eq!(&0x0102u16.encode()[..], &[0x02, 0x01]);
        assert_eq!(&0x0102_0304u32.encode()[..], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(
            &0x0102_0304_0506_0708u64.encode()[..],
            &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(u64::decode(Bytes::from_static(&[1, 0, 0, 0, 0, 0, 0, 0])).unwrap(), 1);
    }

    #[test]
    fn test_bool() {
        assert!(bool::decode(Bytes::from_static(&[1])).unwrap());
        assert!(!bool::decode(Bytes::from_static(&[0])).unwrap());
        assert!(matches!(
            bool::decode(Bytes::from_static(&[2])),
            Err(Error::InvalidEnum("bool", 2))
        ));
    }

    #[test]
    fn test_array() {
        let value = [7u8; 20];
        let encoded = value.encode();
        assert_eq!(encoded.len(), 20);
        assert_eq!(value.encode_size(), 20);
        assert_eq!(<[u8; 20]>::decode(encoded).unwrap(), value);
        assert!(matches!(
            <[u8; 20]>::decode(Bytes::from_static(&[0; 19])),
            Err(Error::EndOfBuffer)
        ));
    }
}
