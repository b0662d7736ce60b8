//! CFB-128 stream mode built on the `aes-core` forward cipher.
//!
//! This crate provides:
//! - [`Cfb128`], a session holding one expanded key and IV, with one-shot,
//!   incremental ([`CfbStream`]) and multi-threaded decryption entry points.
//! - Trace sinks ([`HexWriter`], [`Recorder`]) that observe every intermediate
//!   state without affecting results.
//! - Helpers for raw 16-byte key/IV files.
//!
//! The feedback is always the latest ciphertext chunk. Full blocks therefore
//! follow textbook CFB-128; a short final chunk uses only a prefix of its
//! keystream block and never feeds the cipher again. No authentication is
//! performed.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod blockfile;
mod error;
mod mode;
mod parallel;
mod stream;
pub mod trace;

pub use aes_core::{Aes128Key, Block, Direction, TraceEvent, TraceSink, BLOCK_LEN};

pub use crate::error::{Error, Result};
pub use crate::mode::{decrypt_stream, encrypt_stream, Cfb128};
pub use crate::parallel::Parallelism;
pub use crate::stream::CfbStream;
pub use crate::trace::{HexWriter, Recorded, Recorder};
