//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}` with camelCase event names.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::hex::Hex;
use crate::game::events::GameEventData;
use crate::game::player::{Player, PlayerId, UpgradeKind};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
///
/// Joining and leaving are implied by the socket lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Move to (or attack) an adjacent cell.
    Move {
        /// Target column
        q: i32,
        /// Target row
        r: i32,
    },

    /// Spend a pending level-up.
    Upgrade(UpgradeKind),

    /// Ping for latency measurement.
    Ping {
        /// Client clock, echoed back
        timestamp: u64,
    },
}

impl ClientMessage {
    /// Target cell of a move request.
    pub fn move_target(&self) -> Option<Hex> {
        match self {
            ClientMessage::Move { q, r } => Some(Hex::new(*q, *r)),
            _ => None,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Ranged shot, for the client's visual effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileInfo {
    /// Shooter
    pub from: PlayerId,
    /// Target
    pub to: PlayerId,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Tells a new connection its own id.
    Welcome {
        /// The joiner's id
        id: PlayerId,
        /// Server version
        version: String,
    },

    /// Full registry, sent once to a joiner.
    CurrentPlayers(BTreeMap<PlayerId, Player>),

    /// Another player joined.
    NewPlayer(Player),

    /// A player changed cell.
    PlayerMoved(Player),

    /// A player's stats changed.
    PlayerUpdated(Player),

    /// A player was eliminated.
    PlayerDied(PlayerId),

    /// A player's connection closed.
    PlayerDisconnected(PlayerId),

    /// The receiving player leveled up.
    LevelUp(Player),

    /// A ranged shot was fired.
    Projectile(ProjectileInfo),

    /// Pong response.
    Pong {
        /// Echoed client timestamp
        timestamp: u64,
        /// Server clock in epoch milliseconds
        #[serde(rename = "serverTime")]
        server_time: u64,
    },

    /// Server is shutting down.
    Shutdown {
        /// Human-readable reason
        reason: String,
    },
}

impl ServerMessage {
    /// Convert a game event into its wire message.
    pub fn from_event(data: GameEventData) -> Self {
        match data {
            GameEventData::Welcome { id } => ServerMessage::Welcome {
                id,
                version: crate::VERSION.to_string(),
            },
            GameEventData::Snapshot { players } => {
                ServerMessage::CurrentPlayers(players.into_iter().map(|p| (p.id, p)).collect())
            }
            GameEventData::PlayerJoined(p) => ServerMessage::NewPlayer(p),
            GameEventData::PlayerMoved(p) => ServerMessage::PlayerMoved(p),
            GameEventData::PlayerUpdated(p) => ServerMessage::PlayerUpdated(p),
            GameEventData::PlayerDied { id } => ServerMessage::PlayerDied(id),
            GameEventData::PlayerDisconnected { id } => ServerMessage::PlayerDisconnected(id),
            GameEventData::LevelUp(p) => ServerMessage::LevelUp(p),
            GameEventData::Projectile { from, to } => {
                ServerMessage::Projectile(ProjectileInfo { from, to })
            }
        }
    }

    /// Wire event name, for log lines.
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "welcome",
            ServerMessage::CurrentPlayers(_) => "currentPlayers",
            ServerMessage::NewPlayer(_) => "newPlayer",
            ServerMessage::PlayerMoved(_) => "playerMoved",
            ServerMessage::PlayerUpdated(_) => "playerUpdated",
            ServerMessage::PlayerDied(_) => "playerDied",
            ServerMessage::PlayerDisconnected(_) => "playerDisconnected",
            ServerMessage::LevelUp(_) => "levelUp",
            ServerMessage::Projectile(_) => "projectile",
            ServerMessage::Pong { .. } => "pong",
            ServerMessage::Shutdown { .. } => "shutdown",
        }
    }
}

impl From<GameEventData> for ServerMessage {
    fn from(data: GameEventData) -> Self {
        Self::from_event(data)
    }
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
