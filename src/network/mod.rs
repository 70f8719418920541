//! Network Layer
//!
//! WebSocket server for real-time multiplayer communication.
//! This layer owns sockets and the wall clock; all rules run through `game/`.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, ProjectileInfo};
pub use session::{Session, SessionCommand, SessionHandle, SessionError};
pub use server::{GameServer, ServerConfig, GameServerError};
