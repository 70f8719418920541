//! Game Events
//!
//! Deltas produced by the dispatcher, each tagged with who should receive
//! it. The order of a step's events is the order clients must apply them.

use crate::game::player::{Player, PlayerId};

/// Who receives an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recipient {
    /// Every connected client.
    All,
    /// Every connected client but one (e.g. the joiner for `NewPlayer`).
    AllExcept(PlayerId),
    /// A single connection.
    Only(PlayerId),
}

impl Recipient {
    /// Whether a connection receives an event with this scope.
    #[inline]
    pub fn includes(self, connection: &PlayerId) -> bool {
        match self {
            Recipient::All => true,
            Recipient::AllExcept(id) => id != *connection,
            Recipient::Only(id) => id == *connection,
        }
    }
}

/// Game event data.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEventData {
    /// Tells a joiner its own id
    Welcome {
        /// The joiner's own id
        id: PlayerId,
    },

    /// Full registry, for a joiner
    Snapshot {
        /// Every registered player, in join order
        players: Vec<Player>,
    },

    /// A player joined
    PlayerJoined(Player),

    /// A player changed cell
    PlayerMoved(Player),

    /// A player's stats changed
    PlayerUpdated(Player),

    /// A player was eliminated
    PlayerDied {
        /// The fallen player
        id: PlayerId,
    },

    /// A player's connection closed
    PlayerDisconnected {
        /// The departed player
        id: PlayerId,
    },

    /// A player gained one or more levels
    LevelUp(Player),

    /// One ranged shot, for the client's visual effect
    Projectile {
        /// Shooter
        from: PlayerId,
        /// Target
        to: PlayerId,
    },
}

impl GameEventData {
    /// Player the event is about, if any.
    pub fn subject(&self) -> Option<PlayerId> {
        match self {
            GameEventData::Welcome { id } => Some(*id),
            GameEventData::Snapshot { .. } => None,
            GameEventData::PlayerJoined(p)
            | GameEventData::PlayerMoved(p)
            | GameEventData::PlayerUpdated(p)
            | GameEventData::LevelUp(p) => Some(p.id),
            GameEventData::PlayerDied { id } | GameEventData::PlayerDisconnected { id } => Some(*id),
            GameEventData::Projectile { to, .. } => Some(*to),
        }
    }
}

/// An event with its delivery scope.
#[derive(Clone, Debug, PartialEq)]
pub struct GameEvent {
    /// Delivery scope
    pub recipient: Recipient,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Event for every client.
    pub fn broadcast(data: GameEventData) -> Self {
        Self { recipient: Recipient::All, data }
    }

    /// Event for every client but one.
    pub fn broadcast_except(except: PlayerId, data: GameEventData) -> Self {
        Self { recipient: Recipient::AllExcept(except), data }
    }

    /// Event for one client.
    pub fn unicast(to: PlayerId, data: GameEventData) -> Self {
        Self { recipient: Recipient::Only(to), data }
    }

    /// Player moved.
    pub fn player_moved(player: &Player) -> Self {
        Self::broadcast(GameEventData::PlayerMoved(player.clone()))
    }

    /// Player stats changed.
    pub fn player_updated(player: &Player) -> Self {
        Self::broadcast(GameEventData::PlayerUpdated(player.clone()))
    }

    /// Player eliminated.
    pub fn player_died(id: PlayerId) -> Self {
        Self::broadcast(GameEventData::PlayerDied { id })
    }

    /// Private level-up notice.
    pub fn level_up(player: &Player) -> Self {
        Self::unicast(player.id, GameEventData::LevelUp(player.clone()))
    }

    /// Ranged shot.
    pub fn projectile(from: PlayerId, to: PlayerId) -> Self {
        Self::broadcast(GameEventData::Projectile { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_scopes() {
        let a = PlayerId::from_u128(1);
        let b = PlayerId::from_u128(2);

        assert!(Recipient::All.includes(&a));
        assert!(!Recipient::AllExcept(a).includes(&a));
        assert!(Recipient::AllExcept(a).includes(&b));
        assert!(Recipient::Only(a).includes(&a));
        assert!(!Recipient::Only(a).includes(&b));
    }

    #[test]
    fn test_subject() {
        let a = PlayerId::from_u128(1);
        let b = PlayerId::from_u128(2);
        assert_eq!(GameEvent::projectile(a, b).data.subject(), Some(b));
        assert_eq!(GameEvent::player_died(a).data.subject(), Some(a));
        assert_eq!(GameEventData::Snapshot { players: vec![] }.subject(), None);
    }
}
