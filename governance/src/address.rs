//! 20-byte account and contract addresses.
//!
//! Addresses are derived from keys rather than chosen:
//!
//! - A single key hashes to the first 20 bytes of `sha256(0x01 ‖ public_key)`.
//! - A multisig hashes to the first 20 bytes of
//!   `sha256(0x02 ‖ u16 threshold ‖ VarUint(n) ‖ public_key_1 … public_key_n)`, with keys
//!   in the order they were supplied.
//! - Native contract `k` is nineteen zero bytes followed by `k`.

use crate::Error;
use bytes::{Buf, BufMut};
use std::{
    fmt::{Debug, Display},
    str::FromStr,
};
use vigil_codec::{Error as CodecError, FixedSize, Read, ReadExt, VarUint, Write};
use vigil_cryptography::{ed25519::PublicKey, hash, sha256::Digest};
use vigil_utils::{from_hex_formatted, hex};

/// Length of an [Address] in bytes.
pub const ADDRESS_LENGTH: usize = 20;

const SINGLE_PREFIX: u8 = 0x01;
const MULTISIG_PREFIX: u8 = 0x02;

/// Address of the native governance contract.
pub const GOVERNANCE: Address = Address::native(0x07);

/// A 20-byte account or contract address.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Returns the address of native contract `id`.
    pub const fn native(id: u8) -> Self {
        let mut raw = [0; ADDRESS_LENGTH];
        raw[ADDRESS_LENGTH - 1] = id;
        Self(raw)
    }

    /// Derives the address controlled by a single key.
    pub fn from_public_key(key: &PublicKey) -> Self {
        let mut buf = Vec::with_capacity(1 + PublicKey::SIZE);
        buf.put_u8(SINGLE_PREFIX);
        key.write(&mut buf);
        Self::truncate(&hash(&buf))
    }

    /// Derives the address controlled by `threshold` of `keys`.
    ///
    /// Key order is significant: permuting `keys` yields a different address.
    pub fn from_multisig(threshold: u16, keys: &[PublicKey]) -> Self {
        let count = VarUint(keys.len() as u64);
        let mut buf = Vec::with_capacity(
            1 + u16::SIZE + vigil_codec::varint::size(count.0) + keys.len() * PublicKey::SIZE,
        );
        buf.put_u8(MULTISIG_PREFIX);
        threshold.write(&mut buf);
        count.write(&mut buf);
        for key in keys {
            key.write(&mut buf);
        }
        Self::truncate(&hash(&buf))
    }

    fn truncate(digest: &Digest) -> Self {
        let mut raw = [0; ADDRESS_LENGTH];
        raw.copy_from_slice(&digest[..ADDRESS_LENGTH]);
        Self(raw)
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parses 40 hex characters, with or without a `0x` prefix.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = from_hex_formatted(value)
            .ok_or_else(|| Error::Address(format!("{value:?} is not hex")))?;
        let raw: [u8; ADDRESS_LENGTH] = raw.try_into().map_err(|raw: Vec<u8>| {
            Error::Address(format!(
                "expected {ADDRESS_LENGTH} bytes, found {}",
                raw.len()
            ))
        })?;
        Ok(Self(raw))
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(value: [u8; ADDRESS_LENGTH]) -> Self {
        Self(value)
    }
}

impl From<&PublicKey> for Address {
    fn from(key: &PublicKey) -> Self {
        Self::from_public_key(key)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Write for Address {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for Address {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        <[u8; ADDRESS_LENGTH]>::read(buf).map(Self)
    }
}

impl FixedSize for Address {
    const SIZE: usize = ADDRESS_LENGTH;
}

impl Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex(&self.0))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_codec::{DecodeExt, Encode};
    use vigil_cryptography::{ed25519::PrivateKey, PrivateKeyExt, Signer};

    fn keys(seeds: &[u64]) -> Vec<PublicKey> {
        seeds
            .iter()
            .map(|seed| PrivateKey::from_seed(*seed).public_key())
            .collect()
    }

    #[test]
    fn test_native() {
        assert_eq!(
            GOVERNANCE.to_string(),
            "0000000000000000000000000000000000000007"
        );
        assert_eq!(Address::native(0x07), GOVERNANCE);
    }

    #[test]
    fn test_parse() {
        let plain: Address = "0000000000000000000000000000000000000007".parse().unwrap();
        let prefixed: Address = "0x0000000000000000000000000000000000000007".parse().unwrap();
        assert_eq!(plain, GOVERNANCE);
        assert_eq!(prefixed, GOVERNANCE);

        // Display round-trips
        let derived = Address::from_public_key(&keys(&[1])[0]);
        assert_eq!(derived.to_string().parse::<Address>().unwrap(), derived);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!("zz".parse::<Address>(), Err(Error::Address(_))));
        assert!(matches!("0x0007".parse::<Address>(), Err(Error::Address(_))));
        assert!(matches!(
            "000000000000000000000000000000000000000007".parse::<Address>(),
            Err(Error::Address(_))
        ));
    }

    #[test]
    fn test_single_key() {
        let key = keys(&[1])[0];
        let expected = hash(&[&[SINGLE_PREFIX][..], key.as_ref()].concat());
        assert_eq!(Address::from_public_key(&key).as_ref(), &expected[..20]);
        assert_eq!(Address::from(&key), Address::from_public_key(&key));
    }

    #[test]
    fn test_multisig_deterministic() {
        let set = keys(&[1, 2, 3, 4]);
        assert_eq!(
            Address::from_multisig(3, &set),
            Address::from_multisig(3, &set)
        );

        // Threshold is committed to
        assert_ne!(
            Address::from_multisig(3, &set),
            Address::from_multisig(2, &set)
        );

        // Order is committed to
        let mut reversed = set.clone();
        reversed.reverse();
        assert_ne!(
            Address::from_multisig(3, &set),
            Address::from_multisig(3, &reversed)
        );

        // Multisig over one key is distinct from the single-key address
        assert_ne!(
            Address::from_multisig(1, &set[..1]),
            Address::from_public_key(&set[0])
        );
    }

    #[test]
    fn test_codec() {
        let address = Address::from_public_key(&keys(&[9])[0]);
        let encoded = address.encode();
        assert_eq!(encoded.len(), ADDRESS_LENGTH);
        assert_eq!(Address::decode(encoded).unwrap(), address);
    }
}
