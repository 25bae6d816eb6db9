//! Game Logic Module
//!
//! Transport-free session logic. Everything here is synchronous and
//! clock-injected; the network layer owns the sockets and the timer.
//!
//! ## Module Structure
//!
//! - `board`: Grid data model, random generation, terminal scan
//! - `moves`: Move legality and merge/swap resolution
//! - `queue`: FIFO matchmaking queue
//! - `session`: Per-match state, scores, deadlines, winner rule
//! - `registry`: Session and player-id indices
//! - `engine`: The orchestrator driven by inbound events and the tick

pub mod board;
pub mod engine;
pub mod moves;
pub mod queue;
pub mod registry;
pub mod session;

// Re-export key types
pub use board::{Board, Cell, Item};
pub use engine::{EngineError, GameEngine, Outbound};
pub use moves::{Move, MoveOutcome};
pub use queue::MatchQueue;
pub use registry::GameRegistry;
pub use session::{EndReason, GameSession, PlayerId, PlayerState, SessionId};
