//! # Tilematch Game Server
//!
//! Authoritative session engine for a two-player real-time
//! tile-matching game: players queue, are paired FIFO, and play a timed
//! match on a shared 4x4 board. Moves are validated at receipt,
//! buffered, and applied in timestamp order at a fixed tick; the server
//! broadcasts every state change and decides when a session ends.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TILEMATCH SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Session logic (sync, clock-injected)      │
//! │  ├── board.rs    - 4x4 grid, item kinds, terminal scan       │
//! │  ├── moves.rs    - Legality check, merge/swap resolution     │
//! │  ├── queue.rs    - FIFO matchmaking queue                    │
//! │  ├── session.rs  - Match state, scores, winner rule          │
//! │  ├── registry.rs - Session / player-id indices               │
//! │  └── engine.rs   - Orchestrator: join, move, tick, teardown  │
//! │                                                              │
//! │  network/        - Transport (async)                         │
//! │  ├── protocol.rs - JSON wire messages                        │
//! │  └── server.rs   - WebSocket server and tick driver          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering Guarantee
//!
//! Moves are never applied at receipt time. All moves submitted between
//! two ticks are applied in timestamp order within the next tick, so
//! every session has a deterministic, serializable history even though
//! both players submit concurrently.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;

// Re-export commonly used types
pub use game::board::{Board, Cell, Item};
pub use game::engine::{EngineError, GameEngine};
pub use game::session::{EndReason, GameSession, PlayerId, PlayerState, SessionId};
pub use network::protocol::{ClientMessage, ServerMessage};
pub use network::server::{GameServer, ServerConfig};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Board edge length. The game is defined for a 4x4 grid only.
pub const BOARD_SIZE: usize = 4;

/// Points awarded for one merge.
pub const MERGE_POINTS: u32 = 10;

/// Session length in milliseconds.
pub const MATCH_DURATION_MS: u64 = 60_000;

/// Orchestrator tick period in milliseconds (~60 Hz).
pub const TICK_INTERVAL_MS: u64 = 16;
