//! Error types for codec operations

use thiserror::Error;

/// Error type for codec operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
    #[error("invalid varint")]
    InvalidVarint,
    #[error("invalid length: {0}")]
    InvalidLength(usize),
    #[error("invalid enum value in {0}: {1}")]
    InvalidEnum(&'static str, u8),
    #[error("invalid data in {0}: {1}")]
    Invalid(&'static str, &'static str), // context, message
    #[error("wrapped error in {0}: {1}")]
    Wrapped(&'static str, Box<dyn std::error::Error + Send + Sync>),
}
