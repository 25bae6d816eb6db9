//! Board Model
//!
//! The 4x4 grid of nullable item kinds shared by both players of a
//! session, plus the terminal-board scan used for game-over detection.
//! Pure data, no transport or clock dependencies.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::BOARD_SIZE;

// =============================================================================
// ITEM KINDS
// =============================================================================

/// One of the fixed, finite set of item kinds a cell can hold.
///
/// Serialized as lowercase strings on the wire (`"red"`, `"green"`, ...).
/// An empty cell is `Option::<Item>::None`, which serializes as `null`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Item {
    /// Red tile.
    Red,
    /// Green tile.
    Green,
    /// Blue tile.
    Blue,
    /// Yellow tile.
    Yellow,
    /// Pink tile.
    Pink,
    /// Orange tile.
    Orange,
}

impl Item {
    /// Every item kind, in wire order.
    pub const ALL: [Item; 6] = [
        Item::Red,
        Item::Green,
        Item::Blue,
        Item::Yellow,
        Item::Pink,
        Item::Orange,
    ];

    /// Draw one kind uniformly at random.
    pub fn random<R: Rng>(rng: &mut R) -> Item {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

// =============================================================================
// CELL COORDINATES
// =============================================================================

/// A board coordinate, serialized as a `[row, col]` pair.
///
/// Coordinates are signed so that out-of-range input from a client is a
/// legality failure rather than a parse failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell(pub i16, pub i16);

impl Cell {
    /// Create a cell from row and column.
    pub const fn new(row: i16, col: i16) -> Self {
        Self(row, col)
    }

    /// Row index.
    pub const fn row(&self) -> i16 {
        self.0
    }

    /// Column index.
    pub const fn col(&self) -> i16 {
        self.1
    }

    /// Whether both coordinates are within the 0..BOARD_SIZE range.
    pub fn in_bounds(&self) -> bool {
        let size = BOARD_SIZE as i16;
        (0..size).contains(&self.0) && (0..size).contains(&self.1)
    }

    /// Whether `other` is edge-adjacent: same row or same column with
    /// Manhattan distance exactly 1. Diagonals are never adjacent.
    pub fn is_adjacent(&self, other: &Cell) -> bool {
        let row_diff = (self.0 - other.0).abs();
        let col_diff = (self.1 - other.1).abs();
        row_diff + col_diff == 1
    }
}

// =============================================================================
// BOARD
// =============================================================================

/// The 4x4 game board. Exactly 16 cells, rows and columns addressed 0-3.
///
/// Serializes as a nested array of item kinds / nulls, matching the
/// client wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Option<Item>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Generate a fully filled board, each cell drawn independently and
    /// uniformly from the item-kind set. No cell is empty at creation.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        for row in cells.iter_mut() {
            for cell in row.iter_mut() {
                *cell = Some(Item::random(rng));
            }
        }
        Self { cells }
    }

    /// Build a board from explicit rows.
    pub fn from_rows(cells: [[Option<Item>; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    /// Read a cell's contents. `cell` must be in bounds.
    pub fn get(&self, cell: Cell) -> Option<Item> {
        self.cells[cell.0 as usize][cell.1 as usize]
    }

    /// Write a cell's contents. `cell` must be in bounds.
    pub fn set(&mut self, cell: Cell, value: Option<Item>) {
        self.cells[cell.0 as usize][cell.1 as usize] = value;
    }

    /// Terminal scan: true iff no two edge-adjacent cells hold equal,
    /// non-empty values, i.e. no legal merge remains anywhere.
    ///
    /// Checks all 24 interior boundaries of the 4x4 grid (right and down
    /// neighbor of every cell that has one).
    pub fn is_terminal(&self) -> bool {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let Some(item) = self.cells[row][col] else {
                    continue;
                };
                if col + 1 < BOARD_SIZE && self.cells[row][col + 1] == Some(item) {
                    return false;
                }
                if row + 1 < BOARD_SIZE && self.cells[row + 1][col] == Some(item) {
                    return false;
                }
            }
        }
        true
    }
}
