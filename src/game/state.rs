//! World State
//!
//! The single authority: configuration, the player registry, and the
//! randomness source. Only the dispatcher mutates it.

use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::hex::Hex;
use crate::core::rng::{DeterministicRng, GameRng};
use crate::game::config::GameConfig;
use crate::game::error::ActionError;
use crate::game::input::sanitize_username;
use crate::game::player::{Player, PlayerId};
use crate::game::registry::PlayerRegistry;

/// Complete server-side game state.
pub struct GameState {
    /// Gameplay rules
    pub config: GameConfig,

    /// All live players
    players: PlayerRegistry,

    /// Randomness for spawns and tie-breaks
    rng: Box<dyn GameRng>,

    /// Next palette slot
    next_color: usize,
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("players", &self.players.len())
            .field("next_color", &self.next_color)
            .finish()
    }
}

impl GameState {
    /// Create a world with an injected randomness source.
    pub fn new(config: GameConfig, rng: Box<dyn GameRng>) -> Self {
        Self {
            config,
            players: PlayerRegistry::new(),
            rng,
            next_color: 0,
        }
    }

    /// Create a world seeded with the default PRNG.
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::new(config, Box::new(DeterministicRng::new(seed)))
    }

    /// Read access to the registry.
    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub(crate) fn players_mut(&mut self) -> &mut PlayerRegistry {
        &mut self.players
    }

    pub(crate) fn rng_mut(&mut self) -> &mut dyn GameRng {
        self.rng.as_mut()
    }

    /// Get a player by ID.
    pub fn get_player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Register a new player on a free cell.
    ///
    /// The name is sanitized; the color is the next palette entry.
    pub fn spawn_player(&mut self, id: PlayerId, raw_username: &str) -> Result<&Player, ActionError> {
        if self.players.contains(&id) {
            return Err(ActionError::AlreadyRegistered(id));
        }

        let position = self.pick_spawn_cell().ok_or(ActionError::NoSpawnCell)?;
        let username = sanitize_username(
            raw_username,
            self.config.max_username_len,
            &self.config.default_username,
        );
        let color = self.next_color();

        let player = Player::new(id, username, position, color, &self.config);
        Ok(self.players.insert(player))
    }

    /// Place a fully built player directly, for scenario setup and replays.
    ///
    /// Rejects duplicate ids and occupied cells.
    pub fn insert_player(&mut self, player: Player) -> Result<&Player, ActionError> {
        if self.players.contains(&player.id) {
            return Err(ActionError::AlreadyRegistered(player.id));
        }
        if self.players.find_at(player.position).is_some() {
            return Err(ActionError::NoSpawnCell);
        }
        Ok(self.players.insert(player))
    }

    /// Free cells a player could step into (the client's move highlight).
    pub fn reachable_cells(&self, id: &PlayerId) -> Vec<Hex> {
        let Some(player) = self.players.get(id) else {
            return Vec::new();
        };
        player
            .position
            .neighbors()
            .into_iter()
            .filter(|cell| self.players.find_at(*cell).is_none())
            .collect()
    }

    /// Hash of the registry, in insertion order.
    pub fn state_hash(&self) -> StateHash {
        compute_state_hash(self.players.len(), |hasher| {
            for p in self.players.iter() {
                hasher.update_uuid(p.id.as_bytes());
                hasher.update_hex(p.position);
                hasher.update_u32(p.troops);
                hasher.update_f64(p.hp);
                hasher.update_u64(p.xp);
                hasher.update_u32(p.level);
                hasher.update_u64(p.next_level_xp);
                hasher.update_u64(p.last_move_ms);
                hasher.update_f64(p.move_cooldown_ms);
                hasher.update_u32(p.unspent_upgrades);
                hasher.update_str(&p.username);
                hasher.update_str(&p.color);
            }
        })
    }

    /// Random free cell within the spawn radius, else the nearest free cell
    /// to the origin found by walking rings outward.
    fn pick_spawn_cell(&mut self) -> Option<Hex> {
        let radius = self.config.spawn_radius;
        for _ in 0..self.config.spawn_attempts {
            let cell = self.rng.cell_within(Hex::ORIGIN, radius);
            if self.players.find_at(cell).is_none() {
                return Some(cell);
            }
        }

        // Every player occupies one cell, so a free one exists within this many rings.
        let max_ring = radius + self.players.len() as u32 + 1;
        (0..=max_ring)
            .flat_map(|k| Hex::ORIGIN.ring(k))
            .find(|cell| self.players.find_at(*cell).is_none())
    }

    fn next_color(&mut self) -> String {
        let palette = &self.config.palette;
        if palette.is_empty() {
            return String::from("#ffffff");
        }
        let color = palette[self.next_color % palette.len()].clone();
        self.next_color = self.next_color.wrapping_add(1);
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::game::config::PALETTE;

    #[test]
    fn test_spawn_assigns_defaults() {
        let mut state = GameState::with_seed(GameConfig::default(), 42);
        let id = PlayerId::from_u128(1);
        let p = state.spawn_player(id, "  Alice ").unwrap();

        assert_eq!(p.username, "Alice");
        assert_eq!(p.color, PALETTE[0]);
        assert_eq!(p.level, 1);
        assert!(p.position.distance(Hex::ORIGIN) <= 10);
    }

    #[test]
    fn test_spawn_rejects_duplicate_id() {
        let mut state = GameState::with_seed(GameConfig::default(), 42);
        let id = PlayerId::from_u128(1);
        state.spawn_player(id, "a").unwrap();
        assert_eq!(state.spawn_player(id, "b").unwrap_err(), ActionError::AlreadyRegistered(id));
    }

    #[test]
    fn test_colors_round_robin() {
        let mut state = GameState::with_seed(GameConfig::default(), 1);
        let colors: Vec<String> = (0..(PALETTE.len() as u128 + 2))
            .map(|i| state.spawn_player(PlayerId::from_u128(i), "x").unwrap().color.clone())
            .collect();
        assert_eq!(colors[0], PALETTE[0]);
        assert_eq!(colors[PALETTE.len()], PALETTE[0]);
        assert_eq!(colors[PALETTE.len() + 1], PALETTE[1]);
    }

    #[test]
    fn test_spawns_never_overlap_when_crowded() {
        // Radius 1 has only 7 cells; later spawns must spill outward
        let config = GameConfig { spawn_radius: 1, spawn_attempts: 4, ..GameConfig::default() };
        let mut state = GameState::with_seed(config, 9);
        for i in 0..40 {
            state.spawn_player(PlayerId::from_u128(i), "x").unwrap();
        }
        let cells: HashSet<Hex> = state.players().iter().map(|p| p.position).collect();
        assert_eq!(cells.len(), 40);
    }

    #[test]
    fn test_reachable_cells_skip_occupied() {
        let config = GameConfig::default();
        let mut state = GameState::with_seed(config.clone(), 3);
        let a = PlayerId::from_u128(1);
        let b = PlayerId::from_u128(2);
        state.insert_player(Player::new(a, "a".into(), Hex::ORIGIN, "#0".into(), &config)).unwrap();
        state.insert_player(Player::new(b, "b".into(), Hex::new(1, 0), "#1".into(), &config)).unwrap();

        let cells = state.reachable_cells(&a);
        assert_eq!(cells.len(), 5);
        assert!(!cells.contains(&Hex::new(1, 0)));
        assert!(state.reachable_cells(&PlayerId::from_u128(99)).is_empty());
    }

    #[test]
    fn test_insert_rejects_occupied_cell() {
        let config = GameConfig::default();
        let mut state = GameState::with_seed(config.clone(), 3);
        state.insert_player(Player::new(PlayerId::from_u128(1), "a".into(), Hex::ORIGIN, "#0".into(), &config)).unwrap();
        let clash = Player::new(PlayerId::from_u128(2), "b".into(), Hex::ORIGIN, "#1".into(), &config);
        assert!(state.insert_player(clash).is_err());
    }

    #[test]
    fn test_state_hash_deterministic() {
        let build = || {
            let mut s = GameState::with_seed(GameConfig::default(), 77);
            for i in 0..5 {
                s.spawn_player(PlayerId::from_u128(i), "p").unwrap();
            }
            s.state_hash()
        };
        assert_eq!(build(), build());
    }
}
