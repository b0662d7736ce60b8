//! Error type for key handling.

use thiserror::Error;

/// Errors raised by the AES core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The supplied key buffer is not 16 bytes long.
    #[error("AES-128 key must be 16 bytes, got {got}")]
    InvalidKeyLength {
        /// Length of the rejected buffer.
        got: usize,
    },
}
