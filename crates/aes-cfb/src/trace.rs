//! Trace sinks that render or retain cipher internals.

use std::io::{self, Write};

use aes_core::{Block, Direction, State, Step, TraceEvent, TraceSink, EXPANDED_LEN, ROUNDS};
use tracing::warn;

/// Renders every event as uppercase hex lines on a writer.
///
/// Write failures never reach the cipher. The first one is logged and kept for
/// [`HexWriter::take_error`]; everything after it is dropped.
pub struct HexWriter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> HexWriter<W> {
    /// Wraps a writer.
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Returns the write failure that silenced this sink, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_event(&mut self, event: TraceEvent<'_>) -> io::Result<()> {
        let out = &mut self.out;
        match event {
            TraceEvent::ExpandedKey(expanded) => {
                writeln!(out, "expanded key:")?;
                for round in 0..=ROUNDS {
                    writeln!(
                        out,
                        "  round {round:2}: {}",
                        spaced_hex(expanded.round_key(round))
                    )?;
                }
            }
            TraceEvent::Feedback { index, block } => {
                writeln!(out)?;
                writeln!(out, "block {}:", index + 1)?;
                writeln!(out, "  feedback:  {}", spaced_hex(block))?;
            }
            TraceEvent::State { round, step, state } => {
                writeln!(out, "  round {round:2} {}:", step_name(step))?;
                write_grid(out, state)?;
            }
            TraceEvent::Keystream { block, .. } => {
                writeln!(out, "  keystream: {}", spaced_hex(block))?;
            }
            TraceEvent::Output {
                direction, chunk, ..
            } => {
                let label = match direction {
                    Direction::Encrypt => "ciphertext",
                    Direction::Decrypt => "plaintext",
                };
                writeln!(out, "  {label}: {}", spaced_hex(chunk))?;
            }
        }
        Ok(())
    }
}

impl<W: Write> TraceSink for HexWriter<W> {
    fn record(&mut self, event: TraceEvent<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.write_event(event) {
            warn!(error = %err, "trace output failed; further trace output dropped");
            self.error = Some(err);
        }
    }

    fn enabled(&self) -> bool {
        self.error.is_none()
    }
}

fn step_name(step: Step) -> &'static str {
    match step {
        Step::Input => "input",
        Step::SubBytes => "after SubBytes",
        Step::ShiftRows => "after ShiftRows",
        Step::MixColumns => "after MixColumns",
        Step::AddRoundKey => "after AddRoundKey",
    }
}

fn write_grid(out: &mut impl Write, state: &State) -> io::Result<()> {
    for row in state.rows() {
        writeln!(out, "    {}", spaced_hex(row))?;
    }
    Ok(())
}

/// Uppercase hex with a space between bytes.
pub fn spaced_hex(bytes: &[u8]) -> String {
    let encoded = hex::encode_upper(bytes);
    let mut spaced = String::with_capacity(encoded.len() + bytes.len());
    for (i, pair) in encoded.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            spaced.push(' ');
        }
        spaced.extend(pair.iter().map(|&c| c as char));
    }
    spaced
}

/// Owned copy of a [`TraceEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recorded {
    /// Flat key schedule.
    ExpandedKey(Box<[u8; EXPANDED_LEN]>),
    /// Feedback for chunk `index`.
    Feedback {
        /// Chunk index.
        index: usize,
        /// Feedback bytes.
        block: Vec<u8>,
    },
    /// Cipher state, flattened back to wire order.
    State {
        /// Round number.
        round: usize,
        /// Transform just applied.
        step: Step,
        /// Flat state.
        block: Block,
    },
    /// Keystream for chunk `index`.
    Keystream {
        /// Chunk index.
        index: usize,
        /// Keystream bytes.
        block: Block,
    },
    /// Output for chunk `index`.
    Output {
        /// Chunk index.
        index: usize,
        /// Stream direction.
        direction: Direction,
        /// Produced bytes.
        chunk: Vec<u8>,
    },
}

/// Keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    events: Vec<Recorded>,
}

impl Recorder {
    /// All events in arrival order.
    pub fn events(&self) -> &[Recorded] {
        &self.events
    }

    /// Feedback blocks in chunk order.
    pub fn feedbacks(&self) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Recorded::Feedback { block, .. } => Some(block.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Keystream blocks in chunk order.
    pub fn keystreams(&self) -> Vec<Block> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Recorded::Keystream { block, .. } => Some(*block),
                _ => None,
            })
            .collect()
    }

    /// Output chunks in order.
    pub fn outputs(&self) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Recorded::Output { chunk, .. } => Some(chunk.as_slice()),
                _ => None,
            })
            .collect()
    }
}

impl TraceSink for Recorder {
    fn record(&mut self, event: TraceEvent<'_>) {
        let owned = match event {
            TraceEvent::ExpandedKey(expanded) => {
                Recorded::ExpandedKey(Box::new(expanded.to_bytes()))
            }
            TraceEvent::Feedback { index, block } => Recorded::Feedback {
                index,
                block: block.to_vec(),
            },
            TraceEvent::State { round, step, state } => Recorded::State {
                round,
                step,
                block: state.to_block(),
            },
            TraceEvent::Keystream { index, block } => Recorded::Keystream {
                index,
                block: *block,
            },
            TraceEvent::Output {
                index,
                direction,
                chunk,
            } => Recorded::Output {
                index,
                direction,
                chunk: chunk.to_vec(),
            },
        };
        self.events.push(owned);
    }
}
