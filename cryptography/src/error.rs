//! Error types for cryptographic operations

use thiserror::Error;

/// Error type for cryptographic operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid private key length")]
    InvalidPrivateKeyLength,
    #[error("invalid public key length")]
    InvalidPublicKeyLength,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid signature length")]
    InvalidSignatureLength,
    #[error("invalid digest length")]
    InvalidDigestLength,
    #[error("signing failed: {0}")]
    SigningFailed(String),
}
