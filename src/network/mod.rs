//! Network Layer
//!
//! WebSocket server for real-time multiplayer communication.
//! Holds no game rules of its own; everything routes through `game/`.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{
    ClientMessage, ServerMessage, GameStateUpdate, GameEvent, NameRejection, ErrorCode,
};
pub use session::{ClientRegistry, ConnectedClient, SessionError, SessionState};
pub use server::{GameServer, ServerConfig, GameServerError};
