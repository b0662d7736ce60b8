//! Multi-threaded CFB decryption.
//!
//! Decryption feedback is ciphertext, which is known up front, so every
//! keystream block can be computed independently. The ciphertext is split into
//! block-aligned segments, one per worker, all sharing the read-only key schedule.

use std::num::NonZeroUsize;
use std::thread;

use aes_core::{encrypt_block, xor_in_place, Block, ExpandedKey, BLOCK_LEN};
use tracing::debug;

use crate::mode::Cfb128;

/// Number of worker threads used for decryption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parallelism(NonZeroUsize);

impl Parallelism {
    /// A single worker; decryption runs on the calling thread.
    pub const SEQUENTIAL: Self = Self(NonZeroUsize::MIN);

    /// Returns `None` for zero workers.
    pub fn new(workers: usize) -> Option<Self> {
        NonZeroUsize::new(workers).map(Self)
    }

    /// Whatever the OS reports as available, falling back to one worker.
    pub fn available() -> Self {
        Self(thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }

    /// Worker count.
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::available()
    }
}

impl Cfb128 {
    /// Decrypts with up to `parallelism` worker threads.
    ///
    /// The output is identical to [`Cfb128::decrypt`]. Tracing is not offered
    /// here since events from concurrent workers have no single order.
    pub fn decrypt_parallel(&self, ciphertext: &[u8], parallelism: Parallelism) -> Vec<u8> {
        let blocks = ciphertext.len().div_ceil(BLOCK_LEN);
        let workers = parallelism.get().min(blocks);
        if workers <= 1 {
            return self.decrypt(ciphertext);
        }

        let span = blocks.div_ceil(workers) * BLOCK_LEN;
        let mut plaintext = ciphertext.to_vec();
        let expanded = self.expanded_key();
        thread::scope(|scope| {
            for (segment, out) in plaintext.chunks_mut(span).enumerate() {
                let start = segment * span;
                let input = &ciphertext[start..start + out.len()];
                let feedback = if start == 0 {
                    *self.iv()
                } else {
                    let mut block = [0u8; BLOCK_LEN];
                    block.copy_from_slice(&ciphertext[start - BLOCK_LEN..start]);
                    block
                };
                scope.spawn(move || apply_keystream(expanded, feedback, input, out));
            }
        });
        debug!(bytes = ciphertext.len(), workers, "cfb parallel decryption done");
        plaintext
    }
}

/// XORs the keystream for `ciphertext` into `out`, which holds a copy of it.
fn apply_keystream(
    expanded: &ExpandedKey,
    mut feedback: Block,
    ciphertext: &[u8],
    out: &mut [u8],
) {
    for (chunk, dst) in ciphertext.chunks(BLOCK_LEN).zip(out.chunks_mut(BLOCK_LEN)) {
        let keystream = encrypt_block(&feedback, expanded);
        xor_in_place(dst, &keystream);
        if let Ok(next) = <Block>::try_from(chunk) {
            feedback = next;
        }
    }
}
