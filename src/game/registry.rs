//! Game Registry
//!
//! Owns every active session and the player-to-session index. Uses
//! BTreeMap so tick iteration order is stable. Both indices are mutated
//! together; from the engine's single-threaded point of view a session
//! and its two player mappings appear and disappear atomically.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::game::board::Board;
use crate::game::session::{GameSession, PlayerId, PlayerState, SessionId};

/// All active sessions plus the player index.
#[derive(Debug, Default)]
pub struct GameRegistry {
    sessions: BTreeMap<SessionId, GameSession>,
    player_index: BTreeMap<PlayerId, SessionId>,
}

impl GameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh session for two just-paired players and register
    /// both player mappings. The caller (the engine) guarantees neither
    /// player is currently mapped, since both come straight off the queue.
    pub fn create_session(
        &mut self,
        players: [PlayerState; 2],
        board: Board,
        now: u64,
    ) -> SessionId {
        let id = Uuid::new_v4();
        self.player_index.insert(players[0].id, id);
        self.player_index.insert(players[1].id, id);
        self.sessions.insert(id, GameSession::new(id, players, board, now));
        id
    }

    /// Look up a session by id.
    pub fn get(&self, id: &SessionId) -> Option<&GameSession> {
        self.sessions.get(id)
    }

    /// Mutable session lookup.
    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut GameSession> {
        self.sessions.get_mut(id)
    }

    /// The session id a player is currently mapped to, if any.
    pub fn session_id_for_player(&self, player_id: &PlayerId) -> Option<SessionId> {
        self.player_index.get(player_id).copied()
    }

    /// The session a player is currently in, if any.
    pub fn session_for_player(&self, player_id: &PlayerId) -> Option<&GameSession> {
        self.session_id_for_player(player_id)
            .and_then(|id| self.sessions.get(&id))
    }

    /// Remove a session and both of its player mappings, returning the
    /// session for final-score reporting.
    pub fn remove_session(&mut self, id: &SessionId) -> Option<GameSession> {
        let session = self.sessions.remove(id)?;
        for player in &session.players {
            self.player_index.remove(&player.id);
        }
        Some(session)
    }

    /// Ids of every active session, for tick iteration.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    /// Number of active sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
