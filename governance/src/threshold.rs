//! Collect quorum signatures from a [SignerSet].
//!
//! # Overview
//!
//! The [Coordinator] takes a fixed message (a transaction hash or, on the emergency path,
//! an arbitrary canonical buffer) and the signers available to the caller, validates that
//! they can satisfy the set's threshold, and asks each of them to sign. The resulting
//! `(public key, signature)` pairs are appended, in the order signers were supplied, to an
//! [AggregateSignature].
//!
//! # Validation
//!
//! Before any signer is asked to sign:
//!
//! - every signer's key must belong to the set ([Error::UnknownSigner])
//! - no signer may appear twice ([Error::DuplicateSigner])
//! - at least `M` signers must be supplied ([Error::QuorumUnmet])
//!
//! # Concurrency
//!
//! With a concurrency greater than one, signers are invoked on a dedicated [rayon] pool
//! and joined before [Coordinator::sign] returns. Any signer failure aborts the entire
//! aggregate; partial aggregates are never returned and no signer is retried.

use crate::{
    transaction::{Transaction, UnsignedTransaction},
    wire::{read_count, read_var, var_size, write_var, Limits},
    Error, SignerSet, Stage, Wallet,
};
use bytes::{Buf, BufMut};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use std::{collections::HashSet, num::NonZeroUsize, sync::Arc};
use tracing::debug;
use vigil_codec::{varint, EncodeSize, Error as CodecError, FixedSize, Read, ReadExt, Write};
use vigil_cryptography::{
    ed25519::{PublicKey, Signature},
    Verifier as _,
};

/// Signatures from (at least) a threshold of a [SignerSet] over one message.
///
/// Encoded as `u16 threshold ‖ VarUint(n) ‖ n × varBytes(public key) ‖ VarUint(n) ‖
/// n × varBytes(signature)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateSignature {
    threshold: u16,
    public_keys: Vec<PublicKey>,
    signatures: Vec<Signature>,
}

impl AggregateSignature {
    /// Creates an empty aggregate for a set requiring `threshold` signatures.
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            public_keys: Vec::new(),
            signatures: Vec::new(),
        }
    }

    /// Appends a signature.
    pub fn push(&mut self, public_key: PublicKey, signature: Signature) {
        self.public_keys.push(public_key);
        self.signatures.push(signature);
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.public_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.public_keys.is_empty()
    }

    /// Iterates over `(public key, signature)` pairs in the order they were appended.
    pub fn iter(&self) -> impl Iterator<Item = (&PublicKey, &Signature)> {
        self.public_keys.iter().zip(self.signatures.iter())
    }

    /// Checks that the aggregate authorizes `message` on behalf of `set`.
    ///
    /// The threshold must match the set, every signer must be a distinct member of the
    /// set with a valid signature over `message`, and there must be at least as many
    /// signatures as the threshold.
    pub fn verify(&self, stage: Stage, set: &SignerSet, message: &[u8]) -> Result<(), Error> {
        if self.threshold != set.threshold() {
            return Err(Error::ThresholdMismatch {
                expected: set.threshold(),
                found: self.threshold,
            });
        }
        let mut seen = HashSet::with_capacity(self.len());
        for (public_key, signature) in self.iter() {
            if !set.contains(public_key) {
                return Err(Error::UnknownSigner {
                    stage,
                    signer: *public_key,
                });
            }
            if !seen.insert(public_key) {
                return Err(Error::DuplicateSigner(*public_key));
            }
            if !public_key.verify(message, signature) {
                return Err(Error::InvalidSignature {
                    stage,
                    signer: *public_key,
                });
            }
        }
        if self.len() < self.threshold as usize {
            return Err(Error::QuorumUnmet {
                stage,
                got: self.len(),
                need: self.threshold as usize,
            });
        }
        Ok(())
    }
}

impl Write for AggregateSignature {
    fn write(&self, buf: &mut impl BufMut) {
        self.threshold.write(buf);
        varint::write(self.public_keys.len() as u64, buf);
        for public_key in &self.public_keys {
            write_var(public_key, buf);
        }
        varint::write(self.signatures.len() as u64, buf);
        for signature in &self.signatures {
            write_var(signature, buf);
        }
    }
}

impl EncodeSize for AggregateSignature {
    fn encode_size(&self) -> usize {
        u16::SIZE
            + varint::size(self.public_keys.len() as u64)
            + self.public_keys.len() * var_size::<PublicKey>()
            + varint::size(self.signatures.len() as u64)
            + self.signatures.len() * var_size::<Signature>()
    }
}

impl Read for AggregateSignature {
    type Cfg = Limits;

    fn read_cfg(buf: &mut impl Buf, limits: &Limits) -> Result<Self, CodecError> {
        let threshold = u16::read(buf)?;
        let count = read_count(buf, limits.max_signers)?;
        let mut public_keys = Vec::with_capacity(count);
        for _ in 0..count {
            public_keys.push(read_var(buf)?);
        }
        if read_count(buf, limits.max_signers)? != count {
            return Err(CodecError::Invalid(
                "AggregateSignature",
                "key and signature counts differ",
            ));
        }
        let mut signatures = Vec::with_capacity(count);
        for _ in 0..count {
            signatures.push(read_var(buf)?);
        }
        Ok(Self {
            threshold,
            public_keys,
            signatures,
        })
    }
}

/// Collects signatures from the signers of a [SignerSet].
#[derive(Clone)]
pub struct Coordinator {
    pool: Option<Arc<ThreadPool>>,
}

impl Coordinator {
    /// Creates a coordinator that asks up to `concurrency` signers at once.
    pub fn new(concurrency: NonZeroUsize) -> Result<Self, Error> {
        if concurrency.get() == 1 {
            return Ok(Self { pool: None });
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(concurrency.get())
            .build()?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    /// Collects a signature over `message` from every supplied signer.
    pub fn sign<W: Wallet>(
        &self,
        stage: Stage,
        set: &SignerSet,
        signers: &[W],
        message: &[u8],
    ) -> Result<AggregateSignature, Error> {
        // Reject before asking anyone to sign
        let mut seen = HashSet::with_capacity(signers.len());
        for signer in signers {
            let public_key = signer.public_key();
            if !set.contains(&public_key) {
                return Err(Error::UnknownSigner {
                    stage,
                    signer: public_key,
                });
            }
            if !seen.insert(public_key) {
                return Err(Error::DuplicateSigner(public_key));
            }
        }
        let need = set.threshold() as usize;
        if signers.len() < need {
            return Err(Error::QuorumUnmet {
                stage,
                got: signers.len(),
                need,
            });
        }

        // Ask every signer
        let sign = |signer: &W| {
            let public_key = signer.public_key();
            signer
                .sign(message)
                .map(|signature| (public_key, signature))
                .map_err(|source| Error::Signing {
                    stage,
                    signer: public_key,
                    source,
                })
        };
        let signed = match &self.pool {
            Some(pool) => pool.install(|| {
                signers
                    .par_iter()
                    .map(&sign)
                    .collect::<Result<Vec<_>, _>>()
            }),
            None => signers.iter().map(&sign).collect::<Result<Vec<_>, _>>(),
        }?;

        // Append from the joining thread only
        let mut aggregate = AggregateSignature::new(set.threshold());
        for (public_key, signature) in signed {
            aggregate.push(public_key, signature);
        }
        debug!(
            %stage,
            signers = aggregate.len(),
            threshold = set.threshold(),
            address = %set.address(),
            "collected signatures"
        );
        Ok(aggregate)
    }

    /// Signs the hash of `unsigned` on behalf of `set`.
    pub fn sign_transaction<W: Wallet>(
        &self,
        set: &SignerSet,
        signers: &[W],
        unsigned: UnsignedTransaction,
    ) -> Result<Transaction, Error> {
        let hash = unsigned.hash();
        let aggregate = self.sign(Stage::Transaction, set, signers, hash.as_ref())?;
        Ok(Transaction::new(unsigned, vec![aggregate]))
    }
}
