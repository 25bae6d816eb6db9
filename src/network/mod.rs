//! Network Layer
//!
//! WebSocket transport and wire protocol. This layer is the only place
//! that touches sockets; all session logic runs through `game/`.

pub mod protocol;
pub mod server;

pub use protocol::{ClientMessage, PlayerPublic, ServerMessage};
pub use server::{GameServer, GameServerError, ServerConfig};
