//! Incremental CFB streams for input that arrives in pieces.

use aes_core::{Direction, TraceSink, BLOCK_LEN};
use tracing::debug;

use crate::mode::{Cfb128, Chain};

/// An open stream. Full blocks are processed as soon as they are complete; a
/// trailing partial block waits in a buffer until more input or [`finish`].
///
/// Consuming the stream with [`finish`] is the only way to flush a final
/// partial block, so a finished stream cannot be fed again.
///
/// [`finish`]: CfbStream::finish
pub struct CfbStream<'a, S = ()> {
    chain: Chain<'a>,
    direction: Direction,
    pending: Vec<u8>,
    sink: S,
    consumed: usize,
}

impl Cfb128 {
    /// Opens an incremental encryption stream.
    pub fn encryptor(&self) -> CfbStream<'_> {
        self.encryptor_traced(())
    }

    /// Opens an incremental decryption stream.
    pub fn decryptor(&self) -> CfbStream<'_> {
        self.decryptor_traced(())
    }

    /// Opens an incremental encryption stream that reports to `sink`.
    pub fn encryptor_traced<S: TraceSink>(&self, sink: S) -> CfbStream<'_, S> {
        CfbStream::open(self, Direction::Encrypt, sink)
    }

    /// Opens an incremental decryption stream that reports to `sink`.
    pub fn decryptor_traced<S: TraceSink>(&self, sink: S) -> CfbStream<'_, S> {
        CfbStream::open(self, Direction::Decrypt, sink)
    }
}

impl<'a, S: TraceSink> CfbStream<'a, S> {
    fn open(cfb: &'a Cfb128, direction: Direction, sink: S) -> Self {
        Self {
            chain: Chain::new(cfb.expanded_key(), *cfb.iv()),
            direction,
            pending: Vec::with_capacity(BLOCK_LEN),
            sink,
            consumed: 0,
        }
    }

    /// Feeds more input and returns the output for every block it completed.
    pub fn update(&mut self, mut input: &[u8]) -> Vec<u8> {
        self.consumed += input.len();
        let mut out = Vec::with_capacity(self.pending.len() + input.len());

        if !self.pending.is_empty() {
            let take = (BLOCK_LEN - self.pending.len()).min(input.len());
            self.pending.extend_from_slice(&input[..take]);
            input = &input[take..];
            if self.pending.len() < BLOCK_LEN {
                return out;
            }
            self.chain
                .step(self.direction, &self.pending, &mut out, &mut self.sink);
            self.pending.clear();
        }

        let mut blocks = input.chunks_exact(BLOCK_LEN);
        for block in &mut blocks {
            self.chain.step(self.direction, block, &mut out, &mut self.sink);
        }
        self.pending.extend_from_slice(blocks.remainder());
        out
    }

    /// Flushes a trailing partial block and closes the stream.
    pub fn finish(self) -> Vec<u8> {
        self.finish_with_sink().0
    }

    /// Like [`finish`](Self::finish), also handing back the sink.
    pub fn finish_with_sink(mut self) -> (Vec<u8>, S) {
        let mut out = Vec::with_capacity(self.pending.len());
        if !self.pending.is_empty() {
            self.chain
                .step(self.direction, &self.pending, &mut out, &mut self.sink);
        }
        debug!(
            direction = ?self.direction,
            bytes = self.consumed,
            chunks = self.chain.chunks(),
            "cfb stream finished"
        );
        (out, self.sink)
    }

    /// Number of input bytes accepted so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}
