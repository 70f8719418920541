//! Action Rejections
//!
//! Why a command changed nothing. These never reach the client; the
//! dispatcher logs them and emits no events.

use thiserror::Error;

use crate::core::hex::Hex;
use crate::game::player::PlayerId;

/// Reasons a command is dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    /// Sender is not (or no longer) registered.
    #[error("player {0:?} not registered")]
    UnknownPlayer(PlayerId),

    /// Id is already registered.
    #[error("player {0:?} already registered")]
    AlreadyRegistered(PlayerId),

    /// Move issued before the cooldown elapsed.
    #[error("move on cooldown for another {remaining_ms:.0}ms")]
    OnCooldown {
        /// Time left before a move is accepted.
        remaining_ms: f64,
    },

    /// Move target is not a neighbor.
    #[error("target {target} is {distance} steps from {from}")]
    NotAdjacent {
        /// Current cell.
        from: Hex,
        /// Requested cell.
        target: Hex,
        /// Distance between them.
        distance: u32,
    },

    /// Upgrade requested without an unspent level-up.
    #[error("no unspent upgrades")]
    NoUpgradeAvailable,

    /// No free cell found for a new player.
    #[error("no free spawn cell")]
    NoSpawnCell,
}
