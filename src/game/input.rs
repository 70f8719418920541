//! Commands
//!
//! Everything that can mutate the world, as one tagged union. The session
//! feeds these to [`crate::game::tick::dispatch`] one at a time.
//!
//! Client-supplied fields are normalized here before they reach the
//! data model.

use crate::core::hex::Hex;
use crate::game::player::{PlayerId, UpgradeKind};

/// A state-mutating command.
#[derive(Clone, Debug, PartialEq)]
pub enum GameCommand {
    /// A connection opened.
    Connect {
        /// Transport-assigned id
        id: PlayerId,
        /// Raw handshake name (sanitized on apply)
        username: String,
    },
    /// A connection closed.
    Disconnect {
        /// Departing id
        id: PlayerId,
    },
    /// Move to (or attack) an adjacent cell.
    Move {
        /// Mover
        id: PlayerId,
        /// Requested cell
        target: Hex,
    },
    /// Spend a level-up.
    Upgrade {
        /// Upgrading player
        id: PlayerId,
        /// Stat to improve
        kind: UpgradeKind,
    },
    /// Periodic ranged-combat pass.
    Tick,
}

impl GameCommand {
    /// Short name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            GameCommand::Connect { .. } => "connect",
            GameCommand::Disconnect { .. } => "disconnect",
            GameCommand::Move { .. } => "move",
            GameCommand::Upgrade { .. } => "upgrade",
            GameCommand::Tick => "tick",
        }
    }
}

/// Normalize an untrusted display name.
///
/// Drops control characters, collapses whitespace runs, trims, and caps the
/// length in characters. Empty results fall back to `default`.
pub fn sanitize_username(raw: &str, max_len: usize, default: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let truncated: String = cleaned.chars().take(max_len).collect();
    let truncated = truncated.trim_end();

    if truncated.is_empty() {
        default.to_string()
    } else {
        truncated.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_passthrough() {
        assert_eq!(sanitize_username("Alice", 16, "Anon"), "Alice");
    }

    #[test]
    fn test_sanitize_strips_control_and_whitespace() {
        assert_eq!(sanitize_username("  Bob\n\t the\u{7}  Great ", 16, "Anon"), "Bob the Great");
    }

    #[test]
    fn test_sanitize_truncates_by_chars() {
        assert_eq!(sanitize_username("ééééééééé", 4, "Anon"), "éééé");
        assert_eq!(sanitize_username("abc def", 4, "Anon"), "abc");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_username("", 16, "Anon"), "Anon");
        assert_eq!(sanitize_username(" \n ", 16, "Anon"), "Anon");
    }

    #[test]
    fn test_command_kind() {
        assert_eq!(GameCommand::Tick.kind(), "tick");
        let id = PlayerId::from_u128(1);
        assert_eq!(GameCommand::Disconnect { id }.kind(), "disconnect");
    }
}
