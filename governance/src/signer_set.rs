//! Ordered signer sets and their derived threshold and address.

use crate::{Address, Error};
use std::collections::HashSet;
use vigil_cryptography::ed25519::PublicKey;
use vigil_utils::quorum;

/// Maximum number of keys in a [SignerSet].
pub const MAX_SIGNERS: usize = 1024;

/// An ordered set of public keys authorized to sign together.
///
/// The order keys are supplied in is preserved (and committed to by [SignerSet::address]).
/// Sets are immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerSet {
    keys: Vec<PublicKey>,
    threshold: u16,
    address: Address,
}

impl SignerSet {
    /// Creates a set requiring the default quorum of `keys`.
    ///
    /// The threshold is `floor((5n + 6) / 7)` for `n` keys.
    pub fn new(keys: Vec<PublicKey>) -> Result<Self, Error> {
        Self::check(&keys)?;
        let threshold = quorum(keys.len() as u32).ok_or(Error::EmptySignerSet)?;

        // MAX_SIGNERS keeps the quorum far below u16::MAX
        Ok(Self::assemble(keys, threshold as u16))
    }

    /// Creates a set requiring an explicit `threshold` of `keys`.
    pub fn with_threshold(keys: Vec<PublicKey>, threshold: u16) -> Result<Self, Error> {
        Self::check(&keys)?;
        if threshold == 0 || threshold as usize > keys.len() {
            return Err(Error::InvalidThreshold {
                threshold,
                signers: keys.len(),
            });
        }
        Ok(Self::assemble(keys, threshold))
    }

    fn check(keys: &[PublicKey]) -> Result<(), Error> {
        if keys.is_empty() {
            return Err(Error::EmptySignerSet);
        }
        if keys.len() > MAX_SIGNERS {
            return Err(Error::TooManySigners(keys.len(), MAX_SIGNERS));
        }
        let mut seen = HashSet::with_capacity(keys.len());
        for key in keys {
            if !seen.insert(key) {
                return Err(Error::DuplicateSigner(*key));
            }
        }
        Ok(())
    }

    fn assemble(keys: Vec<PublicKey>, threshold: u16) -> Self {
        let address = Address::from_multisig(threshold, &keys);
        Self {
            keys,
            threshold,
            address,
        }
    }

    /// Keys in the order they were supplied.
    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }

    /// Minimum number of signatures required from the set.
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Multisig address controlled by the set.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &PublicKey) -> bool {
        self.position(key).is_some()
    }

    /// Returns the index of `key` in the set, if present.
    pub fn position(&self, key: &PublicKey) -> Option<usize> {
        self.keys.iter().position(|candidate| candidate == key)
    }
}
