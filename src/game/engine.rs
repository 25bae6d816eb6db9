//! Session Orchestrator
//!
//! Ties queue, registry, resolver, and protocol together. All session
//! mutation happens either synchronously on message receipt (join,
//! disconnect, reconnect, move buffering) or inside `tick`; moves are
//! never applied at receipt time. The engine is synchronous and takes
//! the wall clock as an argument, so tests drive it without a runtime.
//!
//! Transport handles live in a player-id to channel table here, never
//! inside player records; sends are best-effort and a closed channel is
//! simply skipped until the player reconnects.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::game::board::{Board, Cell};
use crate::game::moves::{self, Move, MoveOutcome};
use crate::game::queue::{MatchQueue, QueuedPlayer};
use crate::game::registry::GameRegistry;
use crate::game::session::{EndReason, GameSession, PlayerId, PlayerState, SessionId};
use crate::network::protocol::{PlayerPublic, ServerMessage};

/// Outbound message channel for one connected player.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Errors surfaced to a client as `error` events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A move arrived from a player with no live session.
    #[error("not in a game")]
    NotInGame,

    /// A move failed the legality check. Surfaced to the sender rather
    /// than silently dropped.
    #[error("illegal move")]
    IllegalMove,
}

/// The authoritative session engine.
///
/// One instance owns all matchmaking and session state; the network
/// layer serializes access behind a single mutex, which is the only
/// mutual-exclusion discipline the engine needs.
pub struct GameEngine {
    queue: MatchQueue,
    registry: GameRegistry,
    /// Per-session moves awaiting the next tick, in arrival order.
    buffers: BTreeMap<SessionId, Vec<Move>>,
    /// Player id to live transport handle. Absent while disconnected.
    connections: BTreeMap<PlayerId, Outbound>,
    rng: StdRng,
}

impl GameEngine {
    /// Create an engine with no players and no sessions.
    pub fn new() -> Self {
        Self {
            queue: MatchQueue::new(),
            registry: GameRegistry::new(),
            buffers: BTreeMap::new(),
            connections: BTreeMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Number of connected players (queued or in session).
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of players waiting in the queue.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of active sessions.
    pub fn session_count(&self) -> usize {
        self.registry.session_count()
    }

    // =========================================================================
    // INBOUND EVENT HANDLERS
    // =========================================================================

    /// Handle a join request: mint a player id bound to the connection,
    /// enqueue it, and report the queue position. Pairing happens
    /// synchronously if the queue now holds two players.
    pub fn handle_join(&mut self, name: &str, sender: Outbound, now: u64) -> PlayerId {
        let id = Uuid::new_v4();
        self.connections.insert(id, sender);

        let position = self.queue.enqueue(QueuedPlayer {
            id,
            name: name.to_string(),
        });
        debug!(player = %id, name, position, "player queued");
        self.send_to(&id, ServerMessage::QueueUpdate { position });

        self.try_pair(now);
        id
    }

    /// Handle a move submission. Legal moves are buffered for the next
    /// tick; they are never applied at receipt time.
    pub fn handle_move(
        &mut self,
        player: PlayerId,
        from: Cell,
        to: Cell,
        now: u64,
    ) -> Result<(), EngineError> {
        let sid = self
            .registry
            .session_id_for_player(&player)
            .ok_or(EngineError::NotInGame)?;
        let session = self
            .registry
            .get(&sid)
            .expect("player index points at a missing session");

        let mv = Move {
            player,
            from,
            to,
            timestamp: now,
        };
        if !moves::is_legal(&session.board, &mv) {
            return Err(EngineError::IllegalMove);
        }

        self.buffers.entry(sid).or_default().push(mv);
        Ok(())
    }

    /// Handle a closed connection. A queued player is simply removed; a
    /// player in a session forfeits it, and the remaining player wins
    /// regardless of score.
    pub fn handle_disconnect(&mut self, player: &PlayerId) {
        self.connections.remove(player);

        if self.queue.remove(player) {
            debug!(player = %player, "queued player disconnected");
            return;
        }

        if let Some(sid) = self.registry.session_id_for_player(player) {
            let winner = self
                .registry
                .get(&sid)
                .expect("player index points at a missing session")
                .opponent_of(player)
                .map(|p| p.id);
            info!(player = %player, session = %sid, "player disconnected mid-session");
            self.end_session(&sid, EndReason::PlayerDisconnected, winner);
        }
    }

    /// Handle a reconnect request: if the id maps to a live session,
    /// rebind the connection and send that player a full snapshot.
    /// Queued-but-unmatched ids cannot reconnect.
    pub fn handle_reconnect(&mut self, player: PlayerId, sender: Outbound, now: u64) -> bool {
        let Some(sid) = self.registry.session_id_for_player(&player) else {
            return false;
        };
        self.connections.insert(player, sender);

        let session = self
            .registry
            .get(&sid)
            .expect("player index points at a missing session");
        let snapshot = Self::update_message(session, now);
        self.send_to(&player, snapshot);
        info!(player = %player, session = %sid, "player reconnected");
        true
    }

    // =========================================================================
    // TICK
    // =========================================================================

    /// Run one orchestrator tick.
    ///
    /// Per session: drain the move buffer in timestamp order (stable, so
    /// ties keep arrival order), apply each move, emit one merge or swap
    /// event per move, and at most one consolidated `game-update`. A
    /// terminal board after this tick's moves ends the session. The
    /// deadline check runs for every session, moves or not.
    pub fn tick(&mut self, now: u64) {
        for sid in self.registry.session_ids() {
            let mut pending = self
                .buffers
                .get_mut(&sid)
                .map(std::mem::take)
                .unwrap_or_default();
            pending.sort_by_key(|m| m.timestamp);

            let mut outgoing = Vec::new();
            let mut terminal = false;

            if let Some(session) = self.registry.get_mut(&sid) {
                for mv in &pending {
                    match moves::apply(&mut session.board, mv) {
                        MoveOutcome::Merged { points } => {
                            session.award(&mv.player, points);
                            outgoing.push(ServerMessage::Merge {
                                player_id: mv.player,
                                from_cell: mv.from,
                                to_cell: mv.to,
                                points,
                            });
                        }
                        MoveOutcome::Swapped => {
                            outgoing.push(ServerMessage::Swap {
                                player_id: mv.player,
                                from_cell: mv.from,
                                to_cell: mv.to,
                            });
                        }
                    }
                }

                if !pending.is_empty() {
                    session.last_update = now;
                    outgoing.push(Self::update_message(session, now));
                    terminal = session.board.is_terminal();
                }
            }

            if !outgoing.is_empty() {
                if let Some(session) = self.registry.get(&sid) {
                    for msg in outgoing {
                        self.broadcast_session(session, msg);
                    }
                }
            }

            if terminal {
                let winner = self.registry.get(&sid).and_then(|s| s.winner());
                self.end_session(&sid, EndReason::NoLegalMoves, winner);
            }
        }

        // Deadline pass. Absolute end times, so jitter in tick scheduling
        // never shortens or extends a session.
        for sid in self.registry.session_ids() {
            let expired = match self.registry.get(&sid) {
                Some(s) if s.is_expired(now) => Some(s.winner()),
                _ => None,
            };
            if let Some(winner) = expired {
                self.end_session(&sid, EndReason::TimeExpired, winner);
            }
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Pair queued players while at least two are waiting.
    fn try_pair(&mut self, now: u64) {
        while let Some((first, second)) = self.queue.dequeue_pair() {
            let board = Board::random(&mut self.rng);
            let players = [
                PlayerState::new(first.id, first.name),
                PlayerState::new(second.id, second.name),
            ];
            let sid = self.registry.create_session(players, board, now);
            self.buffers.insert(sid, Vec::new());

            let session = self.registry.get(&sid).expect("session just created");
            info!(
                session = %sid,
                first = %session.players[0].id,
                second = %session.players[1].id,
                "session started"
            );

            let msg = ServerMessage::GameStart {
                session_id: sid,
                players: session
                    .players
                    .iter()
                    .map(|p| PlayerPublic {
                        id: p.id,
                        name: p.name.clone(),
                        score: p.score,
                    })
                    .collect(),
                board: session.board.clone(),
                end_time: session.end_time,
            };
            self.broadcast_session(session, msg);
        }
    }

    /// Broadcast one `game-over`, then drop the session, its buffer, and
    /// both player mappings. Further moves for it are "not in a game".
    fn end_session(&mut self, sid: &SessionId, reason: EndReason, winner: Option<PlayerId>) {
        let Some(session) = self.registry.remove_session(sid) else {
            return;
        };
        self.buffers.remove(sid);

        info!(session = %sid, ?reason, winner = ?winner, "session ended");
        let msg = ServerMessage::GameOver {
            reason,
            winner_id: winner,
            final_scores: session.scores(),
        };
        for player in &session.players {
            self.send_to(&player.id, msg.clone());
        }
    }

    /// The consolidated state broadcast for one session.
    fn update_message(session: &GameSession, now: u64) -> ServerMessage {
        ServerMessage::GameUpdate {
            board: session.board.clone(),
            scores: session.scores(),
            time_remaining: session.time_remaining(now),
        }
    }

    /// Best-effort send to one player; a missing or closed channel is
    /// skipped, the peer catches up on reconnect.
    fn send_to(&self, player: &PlayerId, msg: ServerMessage) {
        if let Some(tx) = self.connections.get(player) {
            let _ = tx.send(msg);
        }
    }

    /// Best-effort send to both players of a session.
    fn broadcast_session(&self, session: &GameSession, msg: ServerMessage) {
        for player in &session.players {
            self.send_to(&player.id, msg.clone());
        }
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new()
    }
}
