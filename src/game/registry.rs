//! Player Registry
//!
//! Owns every live `Player` by value, in insertion order. Insertion order is
//! load-bearing: it decides ranged target choice and which attacker fires
//! first in a tick.

use crate::core::hex::Hex;
use crate::game::player::{Player, PlayerId};

/// In-memory player store.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
}

impl PlayerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a player at the end of the iteration order.
    ///
    /// Callers must have checked that the id and cell are free.
    pub(crate) fn insert(&mut self, player: Player) -> &Player {
        debug_assert!(!self.contains(&player.id), "duplicate player id");
        debug_assert!(self.find_at(player.position).is_none(), "spawn on occupied cell");
        self.players.push(player);
        &self.players[self.players.len() - 1]
    }

    /// Remove a player, preserving the order of the rest.
    pub(crate) fn remove(&mut self, id: &PlayerId) -> Option<Player> {
        let index = self.index_of(id)?;
        Some(self.players.remove(index))
    }

    /// Get a player by ID.
    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// Get a player mutably by ID.
    pub(crate) fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == *id)
    }

    /// Whether the id is registered.
    pub fn contains(&self, id: &PlayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Player standing on a cell, if any.
    pub fn find_at(&self, cell: Hex) -> Option<&Player> {
        self.players.iter().find(|p| p.position == cell)
    }

    /// Players within `radius` steps of `center`, in registry order.
    ///
    /// `exclude` drops the searching player itself.
    pub fn find_in_range(&self, center: Hex, radius: u32, exclude: Option<&PlayerId>) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| Some(&p.id) != exclude)
            .filter(|p| p.position.distance(center) <= radius)
            .collect()
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Iterate players in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Number of registered players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no players are registered.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn index_of(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::GameConfig;

    fn player(n: u128, q: i32, r: i32) -> Player {
        Player::new(
            PlayerId::from_u128(n),
            format!("p{n}"),
            Hex::new(q, r),
            "#000".to_string(),
            &GameConfig::default(),
        )
    }

    #[test]
    fn test_insert_remove_keeps_order() {
        let mut reg = PlayerRegistry::new();
        reg.insert(player(3, 0, 0));
        reg.insert(player(1, 1, 0));
        reg.insert(player(2, 2, 0));

        assert_eq!(reg.ids(), vec![PlayerId::from_u128(3), PlayerId::from_u128(1), PlayerId::from_u128(2)]);

        let removed = reg.remove(&PlayerId::from_u128(1)).unwrap();
        assert_eq!(removed.position, Hex::new(1, 0));
        assert_eq!(reg.ids(), vec![PlayerId::from_u128(3), PlayerId::from_u128(2)]);
        assert!(reg.remove(&PlayerId::from_u128(1)).is_none());
    }

    #[test]
    fn test_find_at() {
        let mut reg = PlayerRegistry::new();
        reg.insert(player(1, 2, -1));
        assert_eq!(reg.find_at(Hex::new(2, -1)).map(|p| p.id), Some(PlayerId::from_u128(1)));
        assert!(reg.find_at(Hex::new(0, 0)).is_none());
    }

    #[test]
    fn test_find_in_range_excludes_self() {
        let mut reg = PlayerRegistry::new();
        reg.insert(player(1, 0, 0));
        reg.insert(player(2, 3, 0));
        reg.insert(player(3, 4, 0));
        reg.insert(player(4, -1, 1));

        let me = PlayerId::from_u128(1);
        let found: Vec<_> = reg.find_in_range(Hex::ORIGIN, 3, Some(&me)).iter().map(|p| p.id).collect();
        assert_eq!(found, vec![PlayerId::from_u128(2), PlayerId::from_u128(4)]);

        assert_eq!(reg.find_in_range(Hex::ORIGIN, 0, None).len(), 1);
    }
}
