//! Generate keys, sign governance payloads, and deterministically verify signatures.
//!
//! Signing is fallible at the trait level: a [Signer] may front a remote wallet or key
//! store that can refuse or fail to produce a signature. Local keys (like
//! [ed25519::PrivateKey]) never fail.

use rand::{CryptoRng, Rng, SeedableRng};
use std::{fmt::Debug, hash::Hash};
use vigil_codec::{FixedSize, Read, Write};

pub mod ed25519;
pub mod error;
pub mod sha256;

pub use error::Error;
pub use sha256::{double_hash, hash, Sha256};

/// Produces [Signature]s over messages that can be verified with a corresponding [PublicKey].
pub trait Signer: Send + Sync {
    /// The type of [Signature] produced by this [Signer].
    type Signature: Signature;

    /// The corresponding [PublicKey] type.
    type PublicKey: PublicKey<Signature = Self::Signature>;

    /// Returns the [PublicKey] corresponding to this [Signer].
    fn public_key(&self) -> Self::PublicKey;

    /// Sign a message.
    ///
    /// The message is signed as provided. Callers that sign a digest must hash the
    /// payload themselves.
    fn sign(&self, message: &[u8]) -> Result<Self::Signature, Error>;
}

/// A [Signer] that can be generated from a seed or RNG.
pub trait PrivateKeyExt: Signer + Sized {
    /// Create a [Signer] from a seed.
    ///
    /// # Warning
    ///
    /// This function is insecure and should only be used for examples
    /// and testing.
    fn from_seed(seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        Self::from_rng(&mut rng)
    }

    /// Create a fresh [Signer] using the supplied RNG.
    fn from_rng<R: Rng + CryptoRng>(rng: &mut R) -> Self;
}

/// Verifies [Signature]s over messages.
pub trait Verifier {
    /// The type of [Signature] that this verifier can verify.
    type Signature: Signature;

    /// Verify that a [Signature] is valid over a given message.
    fn verify(&self, message: &[u8], signature: &Self::Signature) -> bool;
}

/// A [PublicKey], able to verify [Signature]s.
pub trait PublicKey:
    Verifier
    + Clone
    + Eq
    + Ord
    + Hash
    + Debug
    + Send
    + Sync
    + AsRef<[u8]>
    + for<'a> TryFrom<&'a [u8], Error = Error>
    + Write
    + Read<Cfg = ()>
    + FixedSize
{
}

/// A [Signature] over a message.
pub trait Signature:
    Clone
    + Eq
    + Ord
    + Hash
    + Debug
    + Send
    + Sync
    + AsRef<[u8]>
    + for<'a> TryFrom<&'a [u8], Error = Error>
    + Write
    + Read<Cfg = ()>
    + FixedSize
{
}

/// A cryptographic digest (cheap to copy).
pub trait Digest:
    Copy + Eq + Ord + Hash + Debug + Send + Sync + AsRef<[u8]> + Write + Read<Cfg = ()> + FixedSize
{
}

/// Interface for incremental hashing.
///
/// This trait is required to implement the `Clone` trait because it is often
/// part of a struct that is cloned. In practice, implementations do not actually
/// clone the hasher state but users should not rely on this behavior and call `reset`
/// after cloning.
pub trait Hasher: Clone + Send + Sync + 'static {
    /// Digest generated by the hasher.
    type Digest: Digest;

    /// Create a new hasher.
    fn new() -> Self;

    /// Append message to previously recorded data.
    fn update(&mut self, message: &[u8]);

    /// Hash all recorded data and reset the hasher
    /// to the initial state.
    fn finalize(&mut self) -> Self::Digest;

    /// Reset the hasher without generating a hash.
    ///
    /// This function does not need to be called after `finalize`.
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rand::rngs::OsRng;
    use vigil_codec::{DecodeExt, Encode};

    fn test_validate<C: PrivateKeyExt>() {
        let private_key = C::from_rng(&mut OsRng);
        let public_key = private_key.public_key();
        let encoded = public_key.encode();
        assert_eq!(C::PublicKey::decode(encoded).unwrap(), public_key);
    }

    fn test_validate_invalid_public_key<C: Signer>() {
        let result = C::PublicKey::decode(Bytes::from(vec![0; 1024]));
        assert!(result.is_err());
    }

    fn test_sign_and_verify<C: PrivateKeyExt>() {
        let private_key = C::from_seed(0);
        let message = b"test_message";
        let signature = private_key.sign(message).unwrap();
        let public_key = private_key.public_key();
        assert!(public_key.verify(message, &signature));
    }

    fn test_sign_and_verify_wrong_message<C: PrivateKeyExt>() {
        let private_key = C::from_seed(0);
        let signature = private_key.sign(b"test_message").unwrap();
        let public_key = private_key.public_key();
        assert!(!public_key.verify(b"wrong_message", &signature));
    }

    fn test_signature_determinism<C: PrivateKeyExt>() {
        let private_key_1 = C::from_seed(0);
        let private_key_2 = C::from_seed(0);
        let message = b"test_message";
        let signature_1 = private_key_1.sign(message).unwrap();
        let signature_2 = private_key_2.sign(message).unwrap();
        assert_eq!(private_key_1.public_key(), private_key_2.public_key());
        assert_eq!(signature_1, signature_2);
    }

    fn test_invalid_signature_publickey_pair<C: PrivateKeyExt>() {
        let private_key = C::from_seed(0);
        let private_key_2 = C::from_seed(1);
        let message = b"test_message";
        let signature = private_key.sign(message).unwrap();
        let public_key = private_key_2.public_key();
        assert!(!public_key.verify(message, &signature));
    }

    #[test]
    fn test_ed25519_validate() {
        test_validate::<ed25519::PrivateKey>();
    }

    #[test]
    fn test_ed25519_validate_invalid_public_key() {
        test_validate_invalid_public_key::<ed25519::PrivateKey>();
    }

    #[test]
    fn test_ed25519_sign_and_verify() {
        test_sign_and_verify::<ed25519::PrivateKey>();
    }

    #[test]
    fn test_ed25519_sign_and_verify_wrong_message() {
        test_sign_and_verify_wrong_message::<ed25519::PrivateKey>();
    }

    #[test]
    fn test_ed25519_signature_determinism() {
        test_signature_determinism::<ed25519::PrivateKey>();
    }

    #[test]
    fn test_ed25519_invalid_signature_publickey_pair() {
        test_invalid_signature_publickey_pair::<ed25519::PrivateKey>();
    }

    #[test]
    fn test_ed25519_len() {
        assert_eq!(ed25519::PublicKey::SIZE, 32);
        assert_eq!(ed25519::Signature::SIZE, 64);
    }
}
