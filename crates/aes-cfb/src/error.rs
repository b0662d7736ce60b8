//! Error taxonomy for the stream mode and its buffer helpers.

use std::io;

use thiserror::Error;

/// Errors raised before a stream starts or while loading its inputs.
#[derive(Debug, Error)]
pub enum Error {
    /// The key buffer is not 16 bytes.
    #[error("AES-128 key must be 16 bytes, got {got}")]
    InvalidKeyLength {
        /// Length of the rejected buffer.
        got: usize,
    },

    /// The IV buffer is not 16 bytes.
    #[error("IV must be 16 bytes, got {got}")]
    InvalidIvLength {
        /// Length of the rejected buffer.
        got: usize,
    },

    /// A persisted buffer has the wrong size.
    #[error("malformed {what}: expected {expected} bytes, got {got}")]
    MalformedInput {
        /// What was being loaded.
        what: String,
        /// Required size in bytes.
        expected: usize,
        /// Size actually found.
        got: usize,
    },

    /// Reading or writing a persisted buffer failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<aes_core::Error> for Error {
    fn from(err: aes_core::Error) -> Self {
        match err {
            aes_core::Error::InvalidKeyLength { got } => Error::InvalidKeyLength { got },
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
