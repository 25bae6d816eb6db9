//! Move Validation & Resolution
//!
//! Legality rules for a submitted move and the merge/swap semantics
//! applied to a board. Validation runs at receipt; resolution runs once
//! per tick when the session's move buffer is drained.

use crate::game::board::{Board, Cell};
use crate::game::session::PlayerId;
use crate::MERGE_POINTS;

/// A single move submitted by a player.
///
/// Ephemeral: created on receipt, buffered, consumed once applied. The
/// timestamp is the submission time in milliseconds and is used only to
/// order moves within a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    /// The submitting player.
    pub player: PlayerId,
    /// Source cell.
    pub from: Cell,
    /// Destination cell.
    pub to: Cell,
    /// Submission timestamp (ms), monotonic per connection.
    pub timestamp: u64,
}

/// Outcome of applying a move to a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Source and destination held equal non-empty items; both cells were
    /// emptied and the mover is awarded points.
    Merged {
        /// Points awarded to the moving player.
        points: u32,
    },
    /// Cell contents were exchanged (including the degenerate case where
    /// one side is empty).
    Swapped,
}

/// Check whether a move is legal on the given board.
///
/// Rejects coordinates outside 0-3, non-adjacent cell pairs, and moves
/// whose destination is empty. The *source* cell is intentionally allowed
/// to be empty: a move from an empty source into a filled destination is
/// a legal swap.
pub fn is_legal(board: &Board, mv: &Move) -> bool {
    if !mv.from.in_bounds() || !mv.to.in_bounds() {
        return false;
    }
    if board.get(mv.to).is_none() {
        return false;
    }
    mv.from.is_adjacent(&mv.to)
}

/// Apply a move to the board, returning whether it merged or swapped.
///
/// Both coordinates must be in bounds (guaranteed by [`is_legal`] at
/// receipt). The merge branch requires *both* cells non-empty; anything
/// else, including equal-empty, is a swap. Either branch changes board
/// state, so the caller flags the session for a broadcast this tick.
pub fn apply(board: &mut Board, mv: &Move) -> MoveOutcome {
    let src = board.get(mv.from);
    let dst = board.get(mv.to);

    match (src, dst) {
        (Some(a), Some(b)) if a == b => {
            board.set(mv.from, None);
            board.set(mv.to, None);
            MoveOutcome::Merged {
                points: MERGE_POINTS,
            }
        }
        _ => {
            board.set(mv.from, dst);
            board.set(mv.to, src);
            MoveOutcome::Swapped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Item;
    use crate::BOARD_SIZE;
    use uuid::Uuid;

    fn mv(from: Cell, to: Cell) -> Move {
        Move {
            player: Uuid::new_v4(),
            from,
            to,
            timestamp: 0,
        }
    }

    fn filled_board() -> Board {
        let mut cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        for (row, row_cells) in cells.iter_mut().enumerate() {
            for (col, cell) in row_cells.iter_mut().enumerate() {
                *cell = Some(Item::ALL[(row * BOARD_SIZE + col) % Item::ALL.len()]);
            }
        }
        Board::from_rows(cells)
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let board = filled_board();
        assert!(!is_legal(&board, &mv(Cell::new(-1, 0), Cell::new(0, 0))));
        assert!(!is_legal(&board, &mv(Cell::new(0, 0), Cell::new(0, 4))));
        assert!(!is_legal(&board, &mv(Cell::new(4, 4), Cell::new(3, 4))));
    }

    #[test]
    fn rejects_non_adjacent_cells() {
        let board = filled_board();
        assert!(!is_legal(&board, &mv(Cell::new(0, 0), Cell::new(0, 2))));
        assert!(!is_legal(&board, &mv(Cell::new(0, 0), Cell::new(1, 1))));
        assert!(!is_legal(&board, &mv(Cell::new(2, 2), Cell::new(2, 2))));
    }

    #[test]
    fn rejects_empty_destination() {
        let mut board = filled_board();
        board.set(Cell::new(1, 1), None);
        assert!(!is_legal(&board, &mv(Cell::new(1, 0), Cell::new(1, 1))));
    }

    #[test]
    fn allows_empty_source() {
        let mut board = filled_board();
        board.set(Cell::new(1, 0), None);
        assert!(is_legal(&board, &mv(Cell::new(1, 0), Cell::new(1, 1))));
    }

    #[test]
    fn accepts_in_range_adjacent_with_filled_destination() {
        let board = filled_board();
        assert!(is_legal(&board, &mv(Cell::new(0, 0), Cell::new(0, 1))));
        assert!(is_legal(&board, &mv(Cell::new(3, 3), Cell::new(2, 3))));
    }

    #[test]
    fn merge_empties_both_cells_and_awards_points() {
        let mut board = filled_board();
        let from = Cell::new(0, 0);
        let to = Cell::new(0, 1);
        board.set(from, Some(Item::Red));
        board.set(to, Some(Item::Red));

        let outcome = apply(&mut board, &mv(from, to));
        assert_eq!(outcome, MoveOutcome::Merged { points: MERGE_POINTS });
        assert_eq!(board.get(from), None);
        assert_eq!(board.get(to), None);
    }

    #[test]
    fn unequal_cells_swap() {
        let mut board = filled_board();
        let from = Cell::new(2, 0);
        let to = Cell::new(2, 1);
        board.set(from, Some(Item::Blue));
        board.set(to, Some(Item::Yellow));

        let outcome = apply(&mut board, &mv(from, to));
        assert_eq!(outcome, MoveOutcome::Swapped);
        assert_eq!(board.get(from), Some(Item::Yellow));
        assert_eq!(board.get(to), Some(Item::Blue));
    }

    #[test]
    fn swap_is_an_involution() {
        let mut board = filled_board();
        board.set(Cell::new(1, 2), None);
        let before = board.clone();
        let m = mv(Cell::new(1, 2), Cell::new(1, 3));

        assert_eq!(apply(&mut board, &m), MoveOutcome::Swapped);
        assert_ne!(board, before);
        // Applying the same move again undoes it. The second application
        // would fail the legality check (empty destination), which is why
        // the resolver, not the validator, owns this property.
        apply(&mut board, &m);
        assert_eq!(board, before);
    }

    #[test]
    fn equal_empty_cells_do_not_merge() {
        let mut board = filled_board();
        let from = Cell::new(3, 0);
        let to = Cell::new(3, 1);
        board.set(from, None);
        board.set(to, None);

        // Stale buffered move whose cells were emptied earlier in the same
        // tick: must not award points.
        let outcome = apply(&mut board, &mv(from, to));
        assert_eq!(outcome, MoveOutcome::Swapped);
        assert_eq!(board.get(from), None);
        assert_eq!(board.get(to), None);
    }
}
