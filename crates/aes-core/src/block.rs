//! Block representation helpers.

use core::fmt;

/// AES block of 16 bytes in wire order.
pub type Block = [u8; 16];

/// Block length in bytes.
pub const BLOCK_LEN: usize = 16;

/// XORs `rhs` into `dst` over the shorter of the two lengths.
#[inline]
pub fn xor_in_place(dst: &mut [u8], rhs: &[u8]) {
    for (d, r) in dst.iter_mut().zip(rhs.iter()) {
        *d ^= *r;
    }
}

/// Column-major 4×4 grid view of a block.
///
/// Byte `i` of the flat block sits at row `i % 4`, column `i / 4`. Conversions
/// in both directions go through [`State::from_block`] and [`State::to_block`].
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct State {
    rows: [[u8; 4]; 4],
}

impl State {
    /// Lays a flat block out as a grid.
    pub fn from_block(block: &Block) -> Self {
        let mut rows = [[0u8; 4]; 4];
        for (i, &byte) in block.iter().enumerate() {
            rows[i % 4][i / 4] = byte;
        }
        Self { rows }
    }

    /// Flattens the grid back into wire order.
    pub fn to_block(&self) -> Block {
        let mut block = [0u8; 16];
        for (i, byte) in block.iter_mut().enumerate() {
            *byte = self.rows[i % 4][i / 4];
        }
        block
    }

    /// Returns the byte at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.rows[row][col]
    }

    /// Returns the four rows of the grid.
    #[inline]
    pub fn rows(&self) -> &[[u8; 4]; 4] {
        &self.rows
    }

    #[inline]
    pub(crate) fn rows_mut(&mut self) -> &mut [[u8; 4]; 4] {
        &mut self.rows
    }

    /// Copies column `col` out of the grid, top to bottom.
    #[inline]
    pub fn column(&self, col: usize) -> [u8; 4] {
        [
            self.rows[0][col],
            self.rows[1][col],
            self.rows[2][col],
            self.rows[3][col],
        ]
    }

    #[inline]
    pub(crate) fn set_column(&mut self, col: usize, column: [u8; 4]) {
        for (row, byte) in self.rows.iter_mut().zip(column) {
            row[col] = byte;
        }
    }
}

impl From<Block> for State {
    fn from(block: Block) -> Self {
        Self::from_block(&block)
    }
}

impl From<State> for Block {
    fn from(state: State) -> Self {
        state.to_block()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("State[")?;
        for (r, row) in self.rows.iter().enumerate() {
            if r > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{:02x}{:02x}{:02x}{:02x}", row[0], row[1], row[2], row[3])?;
        }
        f.write_str("]")
    }
}
