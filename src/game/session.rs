//! Session State
//!
//! One in-progress two-player match: identity and score for both
//! players, the shared board, and the wall-clock deadline. Pure data
//! plus winner/termination helpers; transport handles live in the
//! engine's connection table, never inside player records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::board::Board;
use crate::MATCH_DURATION_MS;

/// Unique player identifier, stable for the connection's lifetime.
pub type PlayerId = Uuid;

/// Unique session identifier.
pub type SessionId = Uuid;

/// Why a session ended. Wire strings per the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    /// Wall clock reached the session's absolute end time.
    TimeExpired,
    /// The board has no remaining adjacent equal pair.
    NoLegalMoves,
    /// One player's connection closed mid-session.
    PlayerDisconnected,
}

/// Identity and score of one player inside a session.
///
/// Score is a non-negative integer, monotonically non-decreasing for the
/// session's lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Accumulated score.
    pub score: u32,
}

impl PlayerState {
    /// Create a zero-score player.
    pub fn new(id: PlayerId, name: String) -> Self {
        Self { id, name, score: 0 }
    }
}

/// An active two-player session.
///
/// Invariant: exactly two distinct player ids, each mapped to at most
/// one session by the registry.
#[derive(Clone, Debug)]
pub struct GameSession {
    /// Session identifier.
    pub id: SessionId,
    /// The two matched players, in pairing order.
    pub players: [PlayerState; 2],
    /// The shared board.
    pub board: Board,
    /// Wall-clock creation time (ms since epoch).
    pub started_at: u64,
    /// Absolute end time: `started_at + MATCH_DURATION_MS`. Immune to
    /// tick-scheduling jitter because it is absolute, not a countdown.
    pub end_time: u64,
    /// Last time a move changed the board (ms since epoch).
    pub last_update: u64,
}

impl GameSession {
    /// Create a session starting now.
    pub fn new(id: SessionId, players: [PlayerState; 2], board: Board, now: u64) -> Self {
        debug_assert_ne!(players[0].id, players[1].id);
        Self {
            id,
            players,
            board,
            started_at: now,
            end_time: now + MATCH_DURATION_MS,
            last_update: now,
        }
    }

    /// Look up a player by id.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// The other player of the pair, if `id` belongs to this session.
    pub fn opponent_of(&self, id: &PlayerId) -> Option<&PlayerState> {
        if self.player(id).is_none() {
            return None;
        }
        self.players.iter().find(|p| p.id != *id)
    }

    /// Add points to a player's score. Returns false if the id does not
    /// belong to this session.
    pub fn award(&mut self, id: &PlayerId, points: u32) -> bool {
        match self.players.iter_mut().find(|p| p.id == *id) {
            Some(player) => {
                player.score += points;
                true
            }
            None => false,
        }
    }

    /// Current scores keyed by player id, as broadcast to clients.
    pub fn scores(&self) -> BTreeMap<PlayerId, u32> {
        self.players.iter().map(|p| (p.id, p.score)).collect()
    }

    /// Milliseconds until the deadline, clamped at zero.
    pub fn time_remaining(&self, now: u64) -> u64 {
        self.end_time.saturating_sub(now)
    }

    /// Whether the wall clock has reached the deadline.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.end_time
    }

    /// The player with the strictly higher score, or `None` on a tie.
    ///
    /// A tie is a draw; the winner-by-disconnect case is decided by the
    /// engine, not here, since it ignores scores entirely.
    pub fn winner(&self) -> Option<PlayerId> {
        let [a, b] = &self.players;
        match a.score.cmp(&b.score) {
            std::cmp::Ordering::Greater => Some(a.id),
            std::cmp::Ordering::Less => Some(b.id),
            std::cmp::Ordering::Equal => None,
        }
    }
}
