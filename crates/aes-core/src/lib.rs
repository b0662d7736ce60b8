//! Forward-only AES-128 built from its primitive transforms.
//!
//! This crate mirrors the FIPS-197 description and provides:
//! - GF(2^8) multiplication and the S-box/Rcon tables.
//! - A column-major [`State`] grid with explicit block conversions.
//! - The four round transforms, the key schedule and single-block encryption.
//! - [`TraceSink`], an optional observer for every intermediate state.
//!
//! No inverse cipher is provided: feedback modes only ever run the forward
//! direction. The implementation aims for clarity and testability rather than
//! constant-time guarantees; it should not be treated as side-channel hardened.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod block;
mod cipher;
mod error;
mod gf;
mod key;
pub mod round;
mod sbox;
pub mod trace;

pub use crate::block::{xor_in_place, Block, State, BLOCK_LEN};
pub use crate::cipher::{encrypt_block, encrypt_block_traced, encrypt_state, expand_key, ROUNDS};
pub use crate::error::Error;
pub use crate::gf::{gf_mul, xtime};
pub use crate::key::{Aes128Key, ExpandedKey, EXPANDED_LEN, EXPANDED_WORDS};
pub use crate::sbox::{sbox, RCON, S_BOX};
pub use crate::trace::{Direction, Step, TraceEvent, TraceSink};
