//! Gameplay Configuration
//!
//! Rule constants for movement, combat, and progression.

/// Default player colors, assigned round-robin at spawn.
pub const PALETTE: [&str; 8] = [
    "#e6194b", // red
    "#3cb44b", // green
    "#4363d8", // blue
    "#f58231", // orange
    "#911eb4", // purple
    "#42d4f4", // cyan
    "#f032e6", // magenta
    "#bfef45", // lime
];

/// How a ranged attacker picks among several opponents in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetPolicy {
    /// First opponent in registry insertion order.
    #[default]
    FirstFound,
    /// Closest opponent; ties go to registry insertion order.
    Nearest,
}

/// Gameplay configuration.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Troops a new player spawns with.
    pub starting_troops: u32,
    /// XP needed for the first level-up.
    pub starting_next_level_xp: u64,
    /// Base move cooldown before troop penalty (ms).
    pub base_move_cooldown_ms: f64,
    /// Lower bound for the move cooldown after upgrades (ms).
    pub min_move_cooldown_ms: f64,
    /// Extra cooldown per troop (ms).
    pub cooldown_per_troop_ms: f64,
    /// Multiplier applied by a cooldown upgrade.
    pub cooldown_upgrade_factor: f64,
    /// Growth factor of the level-up threshold.
    pub level_xp_growth: f64,
    /// Base XP for a kill, scaled by `kill_xp_level_factor ^ victim level`.
    pub kill_xp_base: f64,
    /// Per-level scaling of kill XP.
    pub kill_xp_level_factor: f64,
    /// Ranged attack reach in hex steps.
    pub ranged_range: u32,
    /// Ranged target selection.
    pub target_policy: TargetPolicy,
    /// Spawn cells are drawn within this distance of the origin.
    pub spawn_radius: u32,
    /// Random spawn draws before falling back to a ring search.
    pub spawn_attempts: u32,
    /// Maximum username length in characters.
    pub max_username_len: usize,
    /// Name used when the client supplies none.
    pub default_username: String,
    /// Player color palette.
    pub palette: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_troops: 5,
            starting_next_level_xp: 100,
            base_move_cooldown_ms: 500.0,
            min_move_cooldown_ms: 50.0,
            cooldown_per_troop_ms: 100.0,
            cooldown_upgrade_factor: 0.9,
            level_xp_growth: 1.5,
            kill_xp_base: 10.0,
            kill_xp_level_factor: 1.1,
            ranged_range: 3,
            target_policy: TargetPolicy::FirstFound,
            spawn_radius: 10,
            spawn_attempts: 32,
            max_username_len: 16,
            default_username: "Anonymous".to_string(),
            palette: PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl GameConfig {
    /// XP granted for eliminating a player of the given level.
    ///
    /// `floor(10 * 1.1^level)` with the default constants.
    pub fn kill_xp(&self, victim_level: u32) -> u64 {
        let exponent = i32::try_from(victim_level).unwrap_or(i32::MAX);
        (self.kill_xp_base * self.kill_xp_level_factor.powi(exponent)).floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_xp_curve() {
        let config = GameConfig::default();
        assert_eq!(config.kill_xp(1), 11);
        assert_eq!(config.kill_xp(2), 12);
        assert_eq!(config.kill_xp(5), 16);
        assert_eq!(config.kill_xp(10), 25);
    }

    #[test]
    fn test_default_palette() {
        let config = GameConfig::default();
        assert_eq!(config.palette.len(), PALETTE.len());
        assert!(config.min_move_cooldown_ms > 0.0);
    }
}
