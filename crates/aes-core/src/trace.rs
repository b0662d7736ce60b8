//! Observation hooks for the cipher pipeline.
//!
//! A [`TraceSink`] receives every intermediate value the cipher and the stream
//! mode produce. Sinks only observe: nothing they do can change a result, and
//! they have no way to report failure back into the computation.

use crate::block::{Block, State};
use crate::key::ExpandedKey;

/// Transform that produced a traced state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// State as it entered the cipher.
    Input,
    /// After SubBytes.
    SubBytes,
    /// After ShiftRows.
    ShiftRows,
    /// After MixColumns.
    MixColumns,
    /// After AddRoundKey.
    AddRoundKey,
}

/// Direction of the stream that produced an output chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

/// A single observation.
#[derive(Clone, Copy, Debug)]
pub enum TraceEvent<'a> {
    /// The key schedule, emitted once per stream.
    ExpandedKey(&'a ExpandedKey),
    /// The feedback block about to be encrypted for chunk `index`.
    Feedback {
        /// Chunk index, starting at zero.
        index: usize,
        /// Feedback bytes.
        block: &'a [u8],
    },
    /// Cipher state after `step` in `round`.
    State {
        /// Round number, 0..=10.
        round: usize,
        /// Transform just applied.
        step: Step,
        /// The grid.
        state: &'a State,
    },
    /// Keystream block generated for chunk `index`.
    Keystream {
        /// Chunk index.
        index: usize,
        /// Cipher output on the feedback block.
        block: &'a Block,
    },
    /// Output bytes for chunk `index`.
    Output {
        /// Chunk index.
        index: usize,
        /// Which way the stream runs.
        direction: Direction,
        /// Produced bytes, 1..=16 of them.
        chunk: &'a [u8],
    },
}

/// Receiver for [`TraceEvent`]s.
pub trait TraceSink {
    /// Observes one event.
    fn record(&mut self, event: TraceEvent<'_>);

    /// Whether events are wanted at all. Producers may skip work when `false`.
    fn enabled(&self) -> bool {
        true
    }
}

/// The unit sink discards everything.
impl TraceSink for () {
    #[inline]
    fn record(&mut self, _event: TraceEvent<'_>) {}

    #[inline]
    fn enabled(&self) -> bool {
        false
    }
}

impl<S: TraceSink + ?Sized> TraceSink for &mut S {
    #[inline]
    fn record(&mut self, event: TraceEvent<'_>) {
        (**self).record(event);
    }

    #[inline]
    fn enabled(&self) -> bool {
        (**self).enabled()
    }
}

impl<S: TraceSink> TraceSink for Option<S> {
    #[inline]
    fn record(&mut self, event: TraceEvent<'_>) {
        if let Some(sink) = self {
            sink.record(event);
        }
    }

    #[inline]
    fn enabled(&self) -> bool {
        self.as_ref().map_or(false, TraceSink::enabled)
    }
}
