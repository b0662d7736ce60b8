//! Key types for AES-128.

use core::fmt;

use crate::block::Block;
use crate::error::Error;

/// Number of 32-bit words in the expanded key.
pub const EXPANDED_WORDS: usize = 44;

/// Expanded key length in bytes.
pub const EXPANDED_LEN: usize = EXPANDED_WORDS * 4;

/// AES-128 key wrapper.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Aes128Key(pub [u8; 16]);

impl From<[u8; 16]> for Aes128Key {
    fn from(value: [u8; 16]) -> Self {
        Self(value)
    }
}

impl TryFrom<&[u8]> for Aes128Key {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let key: [u8; 16] = bytes
            .try_into()
            .map_err(|_| Error::InvalidKeyLength { got: bytes.len() })?;
        Ok(Self(key))
    }
}

impl fmt::Debug for Aes128Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Aes128Key(..)")
    }
}

/// Expanded key: 44 words, 176 bytes, 11 round keys of 16 bytes each.
///
/// Round `r` uses words `[4r, 4r + 4)`.
#[derive(Clone, PartialEq, Eq)]
pub struct ExpandedKey([Block; 11]);

impl ExpandedKey {
    pub(crate) fn from_words(words: &[[u8; 4]; EXPANDED_WORDS]) -> Self {
        let mut round_keys = [[0u8; 16]; 11];
        for (round_key, group) in round_keys.iter_mut().zip(words.chunks_exact(4)) {
            for (chunk, word) in round_key.chunks_exact_mut(4).zip(group) {
                chunk.copy_from_slice(word);
            }
        }
        Self(round_keys)
    }

    /// Returns the round key at the requested index (0..=10).
    #[inline]
    pub fn round_key(&self, round: usize) -> &Block {
        &self.0[round]
    }

    /// Returns word `index` (0..44).
    #[inline]
    pub fn word(&self, index: usize) -> [u8; 4] {
        let round_key = &self.0[index / 4];
        let start = (index % 4) * 4;
        [
            round_key[start],
            round_key[start + 1],
            round_key[start + 2],
            round_key[start + 3],
        ]
    }

    /// Returns the whole schedule as a flat byte array.
    pub fn to_bytes(&self) -> [u8; EXPANDED_LEN] {
        let mut bytes = [0u8; EXPANDED_LEN];
        for (chunk, round_key) in bytes.chunks_exact_mut(16).zip(self.0.iter()) {
            chunk.copy_from_slice(round_key);
        }
        bytes
    }
}

impl fmt::Debug for ExpandedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExpandedKey(..)")
    }
}
