//! AES round transformations over the grid view.

use crate::block::State;
use crate::gf::gf_mul;
use crate::key::ExpandedKey;
use crate::sbox::sbox;

/// Applies SubBytes to the state in place.
#[inline]
pub fn sub_bytes(state: &mut State) {
    for row in state.rows_mut().iter_mut() {
        for byte in row.iter_mut() {
            *byte = sbox(*byte);
        }
    }
}

/// Performs ShiftRows in place: row `r` rotates left by `r`.
#[inline]
pub fn shift_rows(state: &mut State) {
    for (r, row) in state.rows_mut().iter_mut().enumerate() {
        row.rotate_left(r);
    }
}

fn mix_single_column(col: [u8; 4]) -> [u8; 4] {
    let [a0, a1, a2, a3] = col;
    [
        gf_mul(a0, 2) ^ gf_mul(a1, 3) ^ a2 ^ a3,
        a0 ^ gf_mul(a1, 2) ^ gf_mul(a2, 3) ^ a3,
        a0 ^ a1 ^ gf_mul(a2, 2) ^ gf_mul(a3, 3),
        gf_mul(a0, 3) ^ a1 ^ a2 ^ gf_mul(a3, 2),
    ]
}

/// MixColumns over all four columns.
#[inline]
pub fn mix_columns(state: &mut State) {
    for col in 0..4 {
        let mixed = mix_single_column(state.column(col));
        state.set_column(col, mixed);
    }
}

/// XORs round key `round` into the state; grid byte `(r, c)` takes key byte `16 * round + 4c + r`.
#[inline]
pub fn add_round_key(state: &mut State, expanded: &ExpandedKey, round: usize) {
    let round_key = expanded.round_key(round);
    for (r, row) in state.rows_mut().iter_mut().enumerate() {
        for (c, byte) in row.iter_mut().enumerate() {
            *byte ^= round_key[c * 4 + r];
        }
    }
}
