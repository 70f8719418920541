//! Player State
//!
//! One `Player` per live connection. The serialized form is the wire
//! record clients receive in snapshots and delta events.

use std::fmt;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::hex::Hex;
use crate::game::config::GameConfig;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Connection identity, minted by the transport layer when a socket is accepted.
///
/// Implements Ord so snapshots can use a sorted map.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Fresh random id.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id, handy for replays and tests.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.as_bytes()[..4])
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.short())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// UPGRADES
// =============================================================================

/// Stat a player may improve after leveling up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    /// +1 troop.
    Troops,
    /// Move cooldown x0.9.
    Cooldown,
}

// =============================================================================
// PLAYER
// =============================================================================

/// State of a single player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Connection id
    pub id: PlayerId,

    /// Current cell
    #[serde(flatten)]
    pub position: Hex,

    /// Offense strength and hit points
    pub troops: u32,

    /// Fine-grained health; `troops == ceil(hp)`
    pub hp: f64,

    /// XP towards the next level
    pub xp: u64,

    /// Current level (starts at 1)
    pub level: u32,

    /// XP threshold for the next level
    pub next_level_xp: u64,

    /// Server time of the last committed move (Unix ms)
    #[serde(rename = "lastMove")]
    pub last_move_ms: u64,

    /// Base move cooldown before the troop penalty (ms)
    pub move_cooldown_ms: f64,

    /// Sanitized display name
    pub username: String,

    /// Display color, fixed at spawn
    pub color: String,

    /// Level-ups not yet spent on an upgrade
    pub unspent_upgrades: u32,
}

impl Player {
    /// Create a new player with default stats.
    pub fn new(id: PlayerId, username: String, position: Hex, color: String, config: &GameConfig) -> Self {
        Self {
            id,
            position,
            troops: config.starting_troops,
            hp: f64::from(config.starting_troops),
            xp: 0,
            level: 1,
            next_level_xp: config.starting_next_level_xp,
            last_move_ms: 0,
            move_cooldown_ms: config.base_move_cooldown_ms,
            username,
            color,
            unspent_upgrades: 0,
        }
    }

    /// Effective cooldown: base plus a per-troop penalty.
    #[inline]
    pub fn effective_cooldown_ms(&self, per_troop_ms: f64) -> f64 {
        self.move_cooldown_ms + f64::from(self.troops) * per_troop_ms
    }

    /// Whether a move issued at `now_ms` has waited out the cooldown.
    pub fn cooldown_elapsed(&self, now_ms: u64, per_troop_ms: f64) -> bool {
        let elapsed = now_ms.saturating_sub(self.last_move_ms) as f64;
        elapsed >= self.effective_cooldown_ms(per_troop_ms)
    }

    /// Milliseconds until the next move is allowed.
    pub fn cooldown_remaining_ms(&self, now_ms: u64, per_troop_ms: f64) -> f64 {
        let elapsed = now_ms.saturating_sub(self.last_move_ms) as f64;
        (self.effective_cooldown_ms(per_troop_ms) - elapsed).max(0.0)
    }

    /// Still standing.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.troops > 0 && self.hp > 0.0
    }

    /// Absorb a beaten opponent's troops. Resets hp to the new troop count.
    pub fn gain_troops(&mut self, amount: u32) {
        self.troops = self.troops.saturating_add(amount);
        self.hp = f64::from(self.troops);
    }

    /// One extra troop on top of current hp. Fractional damage is kept.
    pub fn reinforce(&mut self) {
        self.hp += 1.0;
        self.troops = self.hp.ceil() as u32;
    }

    /// Apply ranged damage. Returns true if the player is still alive.
    pub fn take_damage(&mut self, damage: f64) -> bool {
        self.hp -= damage;
        self.troops = if self.hp > 0.0 { self.hp.ceil() as u32 } else { 0 };
        self.is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_player() -> Player {
        Player::new(
            PlayerId::from_u128(1),
            "alice".to_string(),
            Hex::ORIGIN,
            "#fff".to_string(),
            &GameConfig::default(),
        )
    }

    #[test]
    fn test_defaults() {
        let p = test_player();
        assert_eq!(p.troops, 5);
        assert_eq!(p.level, 1);
        assert_eq!(p.xp, 0);
        assert_eq!(p.next_level_xp, 100);
        assert!(p.is_alive());
    }

    #[test]
    fn test_cooldown_scales_with_troops() {
        let mut p = test_player();
        p.last_move_ms = 10_000;
        // 500 base + 5 * 100
        assert!(!p.cooldown_elapsed(10_999, 100.0));
        assert!(p.cooldown_elapsed(11_000, 100.0));

        p.gain_troops(5);
        assert!(!p.cooldown_elapsed(11_000, 100.0));
        assert!(p.cooldown_elapsed(11_500, 100.0));
        assert_eq!(p.cooldown_remaining_ms(11_250, 100.0), 250.0);
    }

    #[test]
    fn test_damage_tracks_ceil_of_hp() {
        let mut p = test_player();
        p.hp = 2.5;
        assert!(p.take_damage(1.0));
        assert_eq!(p.troops, 2);
        assert!(p.take_damage(1.0));
        assert_eq!(p.troops, 1);
        assert!(!p.take_damage(1.0));
        assert_eq!(p.troops, 0);
    }

    #[test]
    fn test_wire_shape() {
        let p = test_player();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["q"], 0);
        assert_eq!(json["r"], 0);
        assert_eq!(json["nextLevelXp"], 100);
        assert_eq!(json["lastMove"], 0);
        assert_eq!(json["moveCooldownMs"], 500.0);
        assert_eq!(json["id"], PlayerId::from_u128(1).to_string());
    }

    #[test]
    fn test_upgrade_kind_wire_names() {
        let kind: UpgradeKind = serde_json::from_str("\"cooldown\"").unwrap();
        assert_eq!(kind, UpgradeKind::Cooldown);
        assert_eq!(serde_json::to_string(&UpgradeKind::Troops).unwrap(), "\"troops\"");
    }
}
