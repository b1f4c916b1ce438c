//! Errors produced while building, signing, submitting and verifying governance payloads.

use crate::emergency::State;
use std::{fmt, time::Duration};
use thiserror::Error;
use vigil_cryptography::{ed25519::PublicKey, sha256::Digest, Error as CryptoError};

/// The signing stage an error originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Multi-signing a native-contract invocation.
    Transaction,
    /// The proposer signing the candidate block hash.
    Proposer,
    /// The admin quorum signing the canonical request buffer.
    Quorum,
    /// The requester signing the assembled request.
    Requester,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transaction => "transaction",
            Self::Proposer => "proposer",
            Self::Quorum => "quorum",
            Self::Requester => "requester",
        };
        f.write_str(name)
    }
}

/// Error that may be encountered when interacting with `vigil-governance`.
#[derive(Debug, Error)]
pub enum Error {
    // Encoding Errors
    #[error("invalid address: {0}")]
    Address(String),
    #[error("invalid parameter {0}: {1}")]
    Parameter(usize, String),
    #[error("invalid method: {0}")]
    Method(String),
    #[error("codec error: {0}")]
    Codec(#[from] vigil_codec::Error),

    // Signer Set Errors
    #[error("signer set is empty")]
    EmptySignerSet,
    #[error("signer set has {0} keys (max {1})")]
    TooManySigners(usize, usize),
    #[error("invalid threshold {threshold} for {signers} signers")]
    InvalidThreshold { threshold: u16, signers: usize },
    #[error("duplicate signer {0}")]
    DuplicateSigner(PublicKey),

    // Signing Errors
    #[error("{stage} signer {signer} failed: {source}")]
    Signing {
        stage: Stage,
        signer: PublicKey,
        #[source]
        source: CryptoError,
    },
    #[error("{stage} signer {signer} is not in the signer set")]
    UnknownSigner { stage: Stage, signer: PublicKey },
    #[error("{stage} quorum unmet: got {got}, need {need}")]
    QuorumUnmet {
        stage: Stage,
        got: usize,
        need: usize,
    },
    #[error("unable to build signing pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    // Pipeline Errors
    #[error("out of order: expected {expected}, found {found}")]
    OutOfOrder { expected: State, found: State },

    // Remote Errors
    #[error("{0} unavailable: {1}")]
    RemoteUnavailable(&'static str, String),
    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),
    #[error("stale tip: expected height {expected}, found {found}")]
    StaleTip { expected: u32, found: u32 },
    #[error("invalid tip at height {height}: {reason}")]
    InvalidTip { height: u32, reason: &'static str },
    #[error("node reported hash {remote} for transaction {local}")]
    HashMismatch { local: Digest, remote: Digest },

    // Verification Errors
    #[error("{stage} signature from {signer} is invalid")]
    InvalidSignature { stage: Stage, signer: PublicKey },
    #[error("threshold mismatch: signature carries {found}, set requires {expected}")]
    ThresholdMismatch { expected: u16, found: u16 },
    #[error("proposal height {proposal} does not match block height {block}")]
    ProposalHeight { proposal: u32, block: u32 },
    #[error("requester {0} is not an admin")]
    UnauthorizedRequester(PublicKey),
    #[error("request carries no admin signatures")]
    MissingAdminSignatures,
    #[error("transactions root mismatch: header has {expected}, transactions hash to {found}")]
    TransactionsRoot { expected: Digest, found: Digest },

    // Registry Errors
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl Error {
    /// Returns true if the caller may retry the operation that produced this error.
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::RemoteUnavailable(..) | Error::Timeout(..) | Error::StaleTip { .. }
        )
    }

    /// Returns the signing stage this error is attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Signing { stage, .. }
            | Error::UnknownSigner { stage, .. }
            | Error::QuorumUnmet { stage, .. }
            | Error::InvalidSignature { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
