//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket. All
//! payloads are flat JSON records tagged by a `type` field; incoming
//! frames that don't match a known tag and shape are a malformed-input
//! error, answered with an `error` event.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::board::{Board, Cell};
use crate::game::session::{EndReason, PlayerId, SessionId};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Enter the matchmaking queue under a display name.
    #[serde(rename_all = "camelCase")]
    Join {
        /// Display name for this player.
        name: String,
    },

    /// Submit a move in the current session.
    #[serde(rename_all = "camelCase")]
    Move {
        /// Source cell, `[row, col]`.
        from_cell: Cell,
        /// Destination cell, `[row, col]`.
        to_cell: Cell,
    },

    /// Rebind an existing player id to this connection.
    #[serde(rename_all = "camelCase")]
    Reconnect {
        /// The player id issued at join time.
        player_id: PlayerId,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Public player info included in `game-start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerPublic {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Score at the time of the message.
    pub score: u32,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Queue position notification (1-based), sent on enqueue.
    #[serde(rename_all = "camelCase")]
    QueueUpdate {
        /// Position in the FIFO queue.
        position: usize,
    },

    /// Both players were paired; the session begins now.
    #[serde(rename_all = "camelCase")]
    GameStart {
        /// Session identifier.
        session_id: SessionId,
        /// Both players' public info, in pairing order.
        players: Vec<PlayerPublic>,
        /// The initial board.
        board: Board,
        /// Absolute end time (ms since epoch).
        end_time: u64,
    },

    /// Consolidated per-tick state broadcast, and the reconnect snapshot.
    #[serde(rename_all = "camelCase")]
    GameUpdate {
        /// Current board.
        board: Board,
        /// Scores keyed by player id.
        scores: BTreeMap<PlayerId, u32>,
        /// Milliseconds until the deadline, clamped at zero.
        time_remaining: u64,
    },

    /// Two equal cells were cleared and points awarded.
    #[serde(rename_all = "camelCase")]
    Merge {
        /// The moving player.
        player_id: PlayerId,
        /// Source cell of the move.
        from_cell: Cell,
        /// Destination cell of the move.
        to_cell: Cell,
        /// Points awarded.
        points: u32,
    },

    /// Two cell contents were exchanged.
    #[serde(rename_all = "camelCase")]
    Swap {
        /// The moving player.
        player_id: PlayerId,
        /// Source cell of the move.
        from_cell: Cell,
        /// Destination cell of the move.
        to_cell: Cell,
    },

    /// The session ended; sent exactly once to both players.
    #[serde(rename_all = "camelCase")]
    GameOver {
        /// Why the session ended.
        reason: EndReason,
        /// Winning player, or null on a draw.
        winner_id: Option<PlayerId>,
        /// Final scores keyed by player id.
        final_scores: BTreeMap<PlayerId, u32>,
    },

    /// Request-level failure; the connection stays open.
    #[serde(rename_all = "camelCase")]
    Error {
        /// Human-readable message.
        message: String,
    },

    /// The reconnect request matched a live session.
    ReconnectSuccess,

    /// The reconnect request did not match a live session.
    ReconnectFailed,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Item;
    use crate::BOARD_SIZE;
    use uuid::Uuid;

    #[test]
    fn join_parses_from_client_json() {
        let msg = ClientMessage::from_json(r#"{"type":"join","name":"alice"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Join { name } if name == "alice"));
    }

    #[test]
    fn move_parses_cell_pairs() {
        let msg =
            ClientMessage::from_json(r#"{"type":"move","fromCell":[0,0],"toCell":[0,1]}"#).unwrap();
        if let ClientMessage::Move { from_cell, to_cell } = msg {
            assert_eq!(from_cell, Cell::new(0, 0));
            assert_eq!(to_cell, Cell::new(0, 1));
        } else {
            panic!("wrong message type");
        }
    }

    #[test]
    fn reconnect_parses_player_id() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"type":"reconnect","playerId":"{id}"}}"#);
        let msg = ClientMessage::from_json(&json).unwrap();
        assert!(matches!(msg, ClientMessage::Reconnect { player_id } if player_id == id));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(ClientMessage::from_json(r#"{"type":"cheat","name":"x"}"#).is_err());
        assert!(ClientMessage::from_json(r#"{"name":"no tag"}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }

    #[test]
    fn queue_update_wire_shape() {
        let json = ServerMessage::QueueUpdate { position: 1 }.to_json().unwrap();
        assert_eq!(json, r#"{"type":"queue-update","position":1}"#);
    }

    #[test]
    fn game_over_wire_shape() {
        let winner = Uuid::new_v4();
        let loser = Uuid::new_v4();
        let mut final_scores = BTreeMap::new();
        final_scores.insert(winner, 30);
        final_scores.insert(loser, 10);

        let json = ServerMessage::GameOver {
            reason: EndReason::TimeExpired,
            winner_id: Some(winner),
            final_scores,
        }
        .to_json()
        .unwrap();

        assert!(json.contains(r#""type":"game-over""#));
        assert!(json.contains(r#""reason":"time-expired""#));
        assert!(json.contains(&format!(r#""winnerId":"{winner}""#)));
        assert!(json.contains(r#""finalScores""#));
    }

    #[test]
    fn draw_serializes_null_winner() {
        let json = ServerMessage::GameOver {
            reason: EndReason::NoLegalMoves,
            winner_id: None,
            final_scores: BTreeMap::new(),
        }
        .to_json()
        .unwrap();
        assert!(json.contains(r#""winnerId":null"#));
    }

    #[test]
    fn merge_and_swap_field_names() {
        let id = Uuid::new_v4();
        let json = ServerMessage::Merge {
            player_id: id,
            from_cell: Cell::new(0, 0),
            to_cell: Cell::new(0, 1),
            points: 10,
        }
        .to_json()
        .unwrap();
        assert!(json.contains(r#""type":"merge""#));
        assert!(json.contains(r#""fromCell":[0,0]"#));
        assert!(json.contains(r#""toCell":[0,1]"#));
        assert!(json.contains(r#""points":10"#));

        let json = ServerMessage::Swap {
            player_id: id,
            from_cell: Cell::new(2, 3),
            to_cell: Cell::new(3, 3),
        }
        .to_json()
        .unwrap();
        assert!(json.contains(r#""type":"swap""#));
        assert!(!json.contains("points"));
    }

    #[test]
    fn reconnect_results_are_tag_only() {
        assert_eq!(
            ServerMessage::ReconnectSuccess.to_json().unwrap(),
            r#"{"type":"reconnect-success"}"#
        );
        assert_eq!(
            ServerMessage::ReconnectFailed.to_json().unwrap(),
            r#"{"type":"reconnect-failed"}"#
        );
    }

    #[test]
    fn game_start_round_trip() {
        let board = Board::from_rows([[Some(Item::Red); BOARD_SIZE]; BOARD_SIZE]);
        let msg = ServerMessage::GameStart {
            session_id: Uuid::new_v4(),
            players: vec![
                PlayerPublic {
                    id: Uuid::new_v4(),
                    name: "alice".into(),
                    score: 0,
                },
                PlayerPublic {
                    id: Uuid::new_v4(),
                    name: "bob".into(),
                    score: 0,
                },
            ],
            board,
            end_time: 60_000,
        };

        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"game-start""#));
        assert!(json.contains(r#""sessionId""#));
        assert!(json.contains(r#""endTime":60000"#));

        let parsed = ServerMessage::from_json(&json).unwrap();
        assert!(matches!(parsed, ServerMessage::GameStart { players, .. } if players.len() == 2));
    }

    #[test]
    fn game_update_round_trip() {
        let a = Uuid::new_v4();
        let mut scores = BTreeMap::new();
        scores.insert(a, 20);

        let msg = ServerMessage::GameUpdate {
            board: Board::from_rows([[None; BOARD_SIZE]; BOARD_SIZE]),
            scores,
            time_remaining: 12_345,
        };

        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""timeRemaining":12345"#));

        let parsed = ServerMessage::from_json(&json).unwrap();
        if let ServerMessage::GameUpdate { scores, .. } = parsed {
            assert_eq!(scores[&a], 20);
        } else {
            panic!("wrong message type");
        }
    }
}
