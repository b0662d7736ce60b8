//! AES-128 key schedule and forward block encryption.

use crate::block::{Block, State};
use crate::key::{Aes128Key, ExpandedKey, EXPANDED_WORDS};
use crate::round::{add_round_key, mix_columns, shift_rows, sub_bytes};
use crate::sbox::{sbox, RCON};
use crate::trace::{Step, TraceEvent, TraceSink};

/// Number of rounds for a 128-bit key.
pub const ROUNDS: usize = 10;

fn rot_word(word: [u8; 4]) -> [u8; 4] {
    let [b0, b1, b2, b3] = word;
    [b1, b2, b3, b0]
}

fn sub_word(word: [u8; 4]) -> [u8; 4] {
    word.map(sbox)
}

fn xor_words(a: [u8; 4], b: [u8; 4]) -> [u8; 4] {
    [a[0] ^ b[0], a[1] ^ b[1], a[2] ^ b[2], a[3] ^ b[3]]
}

/// Expands a 128-bit key into 11 round keys.
pub fn expand_key(key: &Aes128Key) -> ExpandedKey {
    let mut w = [[0u8; 4]; EXPANDED_WORDS];
    for (word, chunk) in w.iter_mut().zip(key.0.chunks_exact(4)) {
        word.copy_from_slice(chunk);
    }

    for i in 4..EXPANDED_WORDS {
        let mut temp = w[i - 1];
        if i % 4 == 0 {
            temp = sub_word(rot_word(temp));
            temp[0] ^= RCON[i / 4];
        }
        w[i] = xor_words(w[i - 4], temp);
    }

    ExpandedKey::from_words(&w)
}

/// Encrypts a single 16-byte block with a pre-expanded key.
pub fn encrypt_block(block: &Block, expanded: &ExpandedKey) -> Block {
    encrypt_block_traced(block, expanded, &mut ())
}

/// Same as [`encrypt_block`], reporting every intermediate state to `sink`.
pub fn encrypt_block_traced<S>(block: &Block, expanded: &ExpandedKey, sink: &mut S) -> Block
where
    S: TraceSink + ?Sized,
{
    let mut state = State::from_block(block);
    encrypt_state(&mut state, expanded, sink);
    state.to_block()
}

#[inline]
fn emit<S: TraceSink + ?Sized>(sink: &mut S, round: usize, step: Step, state: &State) {
    if sink.enabled() {
        sink.record(TraceEvent::State { round, step, state });
    }
}

/// Runs the ten-round forward cipher over a grid in place.
pub fn encrypt_state<S>(state: &mut State, expanded: &ExpandedKey, sink: &mut S)
where
    S: TraceSink + ?Sized,
{
    emit(sink, 0, Step::Input, state);
    add_round_key(state, expanded, 0);
    emit(sink, 0, Step::AddRoundKey, state);

    for round in 1..ROUNDS {
        sub_bytes(state);
        emit(sink, round, Step::SubBytes, state);
        shift_rows(state);
        emit(sink, round, Step::ShiftRows, state);
        mix_columns(state);
        emit(sink, round, Step::MixColumns, state);
        add_round_key(state, expanded, round);
        emit(sink, round, Step::AddRoundKey, state);
    }

    sub_bytes(state);
    emit(sink, ROUNDS, Step::SubBytes, state);
    shift_rows(state);
    emit(sink, ROUNDS, Step::ShiftRows, state);
    add_round_key(state, expanded, ROUNDS);
    emit(sink, ROUNDS, Step::AddRoundKey, state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Aes128Key;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const NIST_KEY: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];
    const NIST_PLAIN: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];
    const NIST_CIPHER: [u8; 16] = [
        0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4, 0xc5,
        0x5a,
    ];

    fn block(s: &str) -> Block {
        hex::decode(s)
            .expect("valid hex")
            .try_into()
            .expect("16 bytes")
    }

    #[derive(Default)]
    struct Steps(Vec<(usize, Step, Block)>);

    impl TraceSink for Steps {
        fn record(&mut self, event: TraceEvent<'_>) {
            if let TraceEvent::State { round, step, state } = event {
                self.0.push((round, step, state.to_block()));
            }
        }
    }

    #[test]
    fn encrypt_matches_nist_vector() {
        let key = Aes128Key::from(NIST_KEY);
        let expanded = expand_key(&key);
        let ct = encrypt_block(&NIST_PLAIN, &expanded);
        assert_eq!(ct, NIST_CIPHER);
    }

    #[test]
    fn encrypt_matches_appendix_b_vector() {
        let key = Aes128Key::from(block("2b7e151628aed2a6abf7158809cf4f3c"));
        let expanded = expand_key(&key);
        let ct = encrypt_block(&block("3243f6a8885a308d313198a2e0370734"), &expanded);
        assert_eq!(ct, block("3925841d02dc09fbdc118597196a0b32"));
    }

    #[test]
    fn expansion_keeps_key_as_first_round_key() {
        let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
        for _ in 0..16 {
            let mut key_bytes = [0u8; 16];
            rng.fill_bytes(&mut key_bytes);
            let expanded = expand_key(&Aes128Key::from(key_bytes));
            let flat = expanded.to_bytes();
            assert_eq!(flat.len(), 176);
            assert_eq!(&flat[..16], &key_bytes);
        }
    }

    #[test]
    fn expansion_matches_known_schedules() {
        let expanded = expand_key(&Aes128Key::from(block("2b7e151628aed2a6abf7158809cf4f3c")));
        assert_eq!(expanded.word(4), [0xa0, 0xfa, 0xfe, 0x17]);
        assert_eq!(
            expanded.round_key(1),
            &block("a0fafe1788542cb123a339392a6c7605")
        );
        assert_eq!(
            expanded.round_key(10),
            &block("d014f9a8c9ee2589e13f0cc8b6630ca6")
        );

        let expanded = expand_key(&Aes128Key::from(NIST_KEY));
        assert_eq!(
            expanded.round_key(10),
            &block("13111d7fe3944a17f307a78b4d2b30c5")
        );
    }

    #[test]
    fn traced_run_reports_every_transform() {
        let expanded = expand_key(&Aes128Key::from(NIST_KEY));
        let mut steps = Steps::default();
        let ct = encrypt_block_traced(&NIST_PLAIN, &expanded, &mut steps);
        assert_eq!(ct, NIST_CIPHER);

        // input + initial AddRoundKey + 9 full rounds + final round without MixColumns
        assert_eq!(steps.0.len(), 2 + 9 * 4 + 3);
        assert_eq!(steps.0[0], (0, Step::Input, NIST_PLAIN));
        assert_eq!(steps.0[1].1, Step::AddRoundKey);
        assert!(steps
            .0
            .iter()
            .filter(|(round, _, _)| *round == ROUNDS)
            .all(|(_, step, _)| *step != Step::MixColumns));
        assert_eq!(steps.0.last(), Some(&(ROUNDS, Step::AddRoundKey, NIST_CIPHER)));
    }

    #[test]
    fn tracing_does_not_change_results() {
        let mut rng = ChaCha20Rng::from_seed([9u8; 32]);
        for _ in 0..32 {
            let mut key_bytes = [0u8; 16];
            let mut input = [0u8; 16];
            rng.fill_bytes(&mut key_bytes);
            rng.fill_bytes(&mut input);
            let expanded = expand_key(&Aes128Key::from(key_bytes));
            let mut steps = Steps::default();
            assert_eq!(
                encrypt_block(&input, &expanded),
                encrypt_block_traced(&input, &expanded, &mut steps)
            );
        }
    }
}
