//! Game Logic Module
//!
//! All world rules. Nothing here touches sockets or the wall clock; time
//! arrives as a `now_ms` argument and randomness through [`crate::core::GameRng`].
//!
//! ## Module Structure
//!
//! - `config`: Tunable rules and the color palette
//! - `player`: Player record and stat helpers
//! - `registry`: Insertion-ordered player storage
//! - `progression`: XP, levels, upgrades
//! - `combat`: Movement, melee, ranged volleys
//! - `input`: Commands and name sanitizing
//! - `state`: World state and spawning
//! - `tick`: The serialized dispatcher
//! - `events`: Scoped deltas for clients

pub mod config;
pub mod player;
pub mod registry;
pub mod error;
pub mod progression;
pub mod combat;
pub mod input;
pub mod state;
pub mod tick;
pub mod events;

// Re-export key types
pub use config::{GameConfig, TargetPolicy, PALETTE};
pub use player::{Player, PlayerId, UpgradeKind};
pub use registry::PlayerRegistry;
pub use error::ActionError;
pub use input::GameCommand;
pub use state::GameState;
pub use tick::{dispatch, try_dispatch};
pub use events::{GameEvent, GameEventData, Recipient};
