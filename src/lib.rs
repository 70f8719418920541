//! # Hex Conquest Game Server
//!
//! Authoritative server for a many-player territorial combat game on an
//! unbounded hex grid.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HEX CONQUEST SERVER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── hex.rs      - Axial coordinates, distance, layout       │
//! │  ├── rng.rs      - Injectable randomness, Xorshift128+       │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - World rules (no I/O)                      │
//! │  ├── player.rs   - Player record                             │
//! │  ├── registry.rs - Insertion-ordered player store            │
//! │  ├── combat.rs   - Movement, melee, ranged volleys           │
//! │  ├── progression.rs - XP, levels, upgrades                   │
//! │  ├── state.rs    - World state and spawning                  │
//! │  └── tick.rs     - Serialized command dispatcher             │
//! │                                                              │
//! │  network/        - Networking                                │
//! │  ├── server.rs   - WebSocket server                          │
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Single task owning the world              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//!
//! Every state change goes through [`game::tick::dispatch`], called only from
//! the session task. Connection tasks never see the world; they send
//! commands and receive messages. Given the same seed and command log,
//! [`game::tick::replay`] reproduces the same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::hex::Hex;
pub use core::rng::{DeterministicRng, GameRng};
pub use game::state::GameState;
pub use game::player::{Player, PlayerId};
pub use game::input::GameCommand;
pub use network::server::{GameServer, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default ranged-combat period (ms)
pub const DEFAULT_TICK_MS: u64 = 1000;
