//! Progression
//!
//! XP accrual, level-ups, and stat upgrades.

use crate::game::config::GameConfig;
use crate::game::error::ActionError;
use crate::game::player::{Player, UpgradeKind};

/// Add XP and apply every level-up it pays for.
///
/// Loops so a single large gain can cross several thresholds. Each level
/// grants one unspent upgrade. Returns the number of levels gained.
pub fn add_xp(player: &mut Player, amount: u64, config: &GameConfig) -> u32 {
    player.xp = player.xp.saturating_add(amount);

    let mut levels = 0;
    while player.next_level_xp > 0 && player.xp >= player.next_level_xp {
        player.xp -= player.next_level_xp;
        player.level += 1;
        player.unspent_upgrades += 1;
        player.next_level_xp = next_threshold(player.next_level_xp, config.level_xp_growth);
        levels += 1;
    }

    levels
}

/// Threshold after `current`: `floor(current * growth)`, strictly increasing.
fn next_threshold(current: u64, growth: f64) -> u64 {
    let next = (current as f64 * growth).floor() as u64;
    next.max(current + 1)
}

/// Spend one unspent level-up on a stat.
pub fn apply_upgrade(player: &mut Player, kind: UpgradeKind, config: &GameConfig) -> Result<(), ActionError> {
    if player.unspent_upgrades == 0 {
        return Err(ActionError::NoUpgradeAvailable);
    }
    player.unspent_upgrades -= 1;

    match kind {
        UpgradeKind::Troops => player.reinforce(),
        UpgradeKind::Cooldown => {
            player.move_cooldown_ms = (player.move_cooldown_ms * config.cooldown_upgrade_factor)
                .max(config.min_move_cooldown_ms);
        }
    }

    Ok(())
}
