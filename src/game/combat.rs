//! Movement & Combat
//!
//! Move validation, melee on occupied cells, and the autonomous ranged
//! volley pass. Each function runs to completion inside one dispatcher
//! step, so no other command can observe a half-resolved fight.

use tracing::debug;

use crate::core::hex::Hex;
use crate::game::config::TargetPolicy;
use crate::game::error::ActionError;
use crate::game::events::GameEvent;
use crate::game::player::{Player, PlayerId};
use crate::game::progression::add_xp;
use crate::game::state::GameState;

/// Outcome of a melee exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeleeOutcome {
    /// The mover won and took the cell.
    AttackerWon,
    /// The occupant held the cell.
    DefenderWon,
}

/// Validate and apply a move request.
///
/// Empty target: the player steps in. Occupied target: melee.
pub fn resolve_move(
    state: &mut GameState,
    id: PlayerId,
    target: Hex,
    now_ms: u64,
) -> Result<Vec<GameEvent>, ActionError> {
    let per_troop = state.config.cooldown_per_troop_ms;
    let player = state.players().get(&id).ok_or(ActionError::UnknownPlayer(id))?;

    if !player.cooldown_elapsed(now_ms, per_troop) {
        return Err(ActionError::OnCooldown {
            remaining_ms: player.cooldown_remaining_ms(now_ms, per_troop),
        });
    }

    if !player.position.is_adjacent(target) {
        let distance = player.position.distance(target);
        return Err(ActionError::NotAdjacent { from: player.position, target, distance });
    }

    let occupant = state.players().find_at(target).map(|p| p.id);
    match occupant {
        None => {
            let player = state.players_mut().get_mut(&id).ok_or(ActionError::UnknownPlayer(id))?;
            player.position = target;
            player.last_move_ms = now_ms;
            Ok(vec![GameEvent::player_moved(player)])
        }
        Some(defender) => resolve_melee(state, id, defender, now_ms).map(|(_, events)| events),
    }
}

/// Fight between a mover and the occupant of its target cell.
///
/// Strictly more troops wins; an exact tie is a coin flip. The winner
/// absorbs the loser's troops and earns kill XP. Only an attacking winner
/// moves. The loser's `PlayerDied` is emitted before it leaves the registry.
pub fn resolve_melee(
    state: &mut GameState,
    attacker: PlayerId,
    defender: PlayerId,
    now_ms: u64,
) -> Result<(MeleeOutcome, Vec<GameEvent>), ActionError> {
    let a = state.players().get(&attacker).ok_or(ActionError::UnknownPlayer(attacker))?;
    let d = state.players().get(&defender).ok_or(ActionError::UnknownPlayer(defender))?;
    let (a_troops, d_troops) = (a.troops, d.troops);
    let target = d.position;

    let outcome = if a_troops > d_troops {
        MeleeOutcome::AttackerWon
    } else if d_troops > a_troops {
        MeleeOutcome::DefenderWon
    } else if state.rng_mut().coin_flip() {
        MeleeOutcome::AttackerWon
    } else {
        MeleeOutcome::DefenderWon
    };

    let (winner, loser) = match outcome {
        MeleeOutcome::AttackerWon => (attacker, defender),
        MeleeOutcome::DefenderWon => (defender, attacker),
    };

    debug!(
        "Melee {} ({}) vs {} ({}): {} wins",
        attacker.short(), a_troops, defender.short(), d_troops, winner.short()
    );

    let mut events = vec![GameEvent::player_died(loser)];
    let loser = state.players_mut().remove(&loser).ok_or(ActionError::UnknownPlayer(loser))?;

    let config = state.config.clone();
    let winner = state.players_mut().get_mut(&winner).ok_or(ActionError::UnknownPlayer(winner))?;
    winner.gain_troops(loser.troops);
    let levels = add_xp(winner, config.kill_xp(loser.level), &config);

    match outcome {
        MeleeOutcome::AttackerWon => {
            winner.position = target;
            winner.last_move_ms = now_ms;
            events.push(GameEvent::player_moved(winner));
        }
        MeleeOutcome::DefenderWon => events.push(GameEvent::player_updated(winner)),
    }
    if levels > 0 {
        events.push(GameEvent::level_up(winner));
    }

    Ok((outcome, events))
}

/// One ranged-combat pass over the registry.
///
/// Attackers fire in insertion order, so when two players could finish
/// each other in the same pass the earlier-registered one shoots first and
/// the other never fires. Each troop is one projectile dealing 1 hp.
pub fn resolve_ranged_volleys(state: &mut GameState) -> Vec<GameEvent> {
    let mut events = Vec::new();

    for attacker in state.players().ids() {
        let Some(shooter) = state.players().get(&attacker) else {
            // Killed earlier in this pass
            continue;
        };
        let Some(target) = select_target(state, shooter) else {
            continue;
        };
        let shots = shooter.troops;
        fire_volley(state, attacker, target, shots, &mut events);
    }

    events
}

/// Pick the opponent a player shoots at, if any is in range.
pub fn select_target(state: &GameState, shooter: &Player) -> Option<PlayerId> {
    let in_range = state
        .players()
        .find_in_range(shooter.position, state.config.ranged_range, Some(&shooter.id));

    match state.config.target_policy {
        TargetPolicy::FirstFound => in_range.first().map(|p| p.id),
        // min_by_key keeps the first of equal keys, i.e. registry order
        TargetPolicy::Nearest => in_range
            .iter()
            .min_by_key(|p| p.position.distance(shooter.position))
            .map(|p| p.id),
    }
}

fn fire_volley(
    state: &mut GameState,
    attacker: PlayerId,
    target: PlayerId,
    shots: u32,
    events: &mut Vec<GameEvent>,
) {
    for _ in 0..shots {
        let Some(victim) = state.players_mut().get_mut(&target) else {
            return;
        };
        events.push(GameEvent::projectile(attacker, target));

        if victim.take_damage(1.0) {
            events.push(GameEvent::player_updated(victim));
            continue;
        }

        events.push(GameEvent::player_died(target));
        let Some(dead) = state.players_mut().remove(&target) else {
            return;
        };
        debug!("{} shot down {}", attacker.short(), target.short());

        let config = state.config.clone();
        if let Some(killer) = state.players_mut().get_mut(&attacker) {
            let levels = add_xp(killer, config.kill_xp(dead.level), &config);
            events.push(GameEvent::player_updated(killer));
            if levels > 0 {
                events.push(GameEvent::level_up(killer));
            }
        }
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::GameRng;
    use crate::game::config::GameConfig;
    use crate::game::events::GameEventData;

    /// Coin that always lands the same way.
    struct FixedCoin(bool);

    impl GameRng for FixedCoin {
        fn coin_flip(&mut self) -> bool {
            self.0
        }

        fn int_range(&mut self, min: i32, _max: i32) -> i32 {
            min
        }
    }

    fn world(coin: bool) -> GameState {
        GameState::new(GameConfig::default(), Box::new(FixedCoin(coin)))
    }

    fn place(state: &mut GameState, n: u128, q: i32, r: i32, troops: u32) -> PlayerId {
        let id = PlayerId::from_u128(n);
        let mut p = Player::new(id, format!("p{n}"), Hex::new(q, r), "#000".into(), &state.config);
        p.troops = troops;
        p.hp = f64::from(troops);
        state.insert_player(p).unwrap();
        id
    }

    #[test]
    fn test_simple_move() {
        let mut state = world(true);
        let a = place(&mut state, 1, 0, 0, 5);

        let events = resolve_move(&mut state, a, Hex::new(1, 0), 5_000).unwrap();
        assert_eq!(events.len(), 1);
        match &events[0].data {
            GameEventData::PlayerMoved(p) => {
                assert_eq!(p.position, Hex::new(1, 0));
                assert_eq!(p.last_move_ms, 5_000);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(state.get_player(&a).unwrap().position, Hex::new(1, 0));
    }

    #[test]
    fn test_move_rejections() {
        let mut state = world(true);
        let a = place(&mut state, 1, 0, 0, 5);

        assert_eq!(
            resolve_move(&mut state, PlayerId::from_u128(9), Hex::new(1, 0), 5_000),
            Err(ActionError::UnknownPlayer(PlayerId::from_u128(9)))
        );
        assert!(matches!(
            resolve_move(&mut state, a, Hex::new(2, 0), 5_000),
            Err(ActionError::NotAdjacent { distance: 2, .. })
        ));
        assert!(matches!(
            resolve_move(&mut state, a, Hex::new(0, 0), 5_000),
            Err(ActionError::NotAdjacent { distance: 0, .. })
        ));

        resolve_move(&mut state, a, Hex::new(1, 0), 5_000).unwrap();
        // Cooldown is 500 + 5 * 100 = 1000ms
        assert!(matches!(
            resolve_move(&mut state, a, Hex::new(2, 0), 5_999),
            Err(ActionError::OnCooldown { .. })
        ));
        assert!(resolve_move(&mut state, a, Hex::new(2, 0), 6_000).is_ok());
        assert_eq!(state.get_player(&a).unwrap().position, Hex::new(2, 0));
    }

    #[test]
    fn test_move_to_extreme_coordinates_rejected() {
        let mut state = world(true);
        let a = place(&mut state, 1, 1, 0, 5);

        for target in [Hex::new(i32::MIN, i32::MIN), Hex::new(i32::MAX, 0), Hex::new(i32::MAX, i32::MIN)] {
            assert!(matches!(
                resolve_move(&mut state, a, target, 10_000),
                Err(ActionError::NotAdjacent { .. })
            ));
            let player = state.get_player(&a).unwrap();
            assert_eq!(player.position, Hex::new(1, 0));
            assert_eq!(player.last_move_ms, 0);
        }
    }

    #[test]
    fn test_melee_attacker_wins() {
        let mut state = world(false);
        let a = place(&mut state, 1, 0, 0, 5);
        let d = place(&mut state, 2, 1, 0, 2);
        let expected_xp = state.config.kill_xp(1);

        let events = resolve_move(&mut state, a, Hex::new(1, 0), 5_000).unwrap();

        assert_eq!(events[0], GameEvent::player_died(d));
        assert!(matches!(&events[1].data, GameEventData::PlayerMoved(p) if p.id == a));
        assert!(state.get_player(&d).is_none());

        let winner = state.get_player(&a).unwrap();
        assert_eq!(winner.troops, 7);
        assert_eq!(winner.hp, 7.0);
        assert_eq!(winner.position, Hex::new(1, 0));
        assert_eq!(winner.last_move_ms, 5_000);
        assert_eq!(winner.xp, expected_xp);
    }

    #[test]
    fn test_melee_defender_wins() {
        let mut state = world(true);
        let a = place(&mut state, 1, 0, 0, 2);
        let d = place(&mut state, 2, 1, 0, 4);

        let events = resolve_move(&mut state, a, Hex::new(1, 0), 5_000).unwrap();

        assert_eq!(events[0], GameEvent::player_died(a));
        assert!(matches!(&events[1].data, GameEventData::PlayerUpdated(p) if p.id == d));
        assert!(state.get_player(&a).is_none());
        let holder = state.get_player(&d).unwrap();
        assert_eq!(holder.troops, 6);
        assert_eq!(holder.position, Hex::new(1, 0));
        assert_eq!(holder.last_move_ms, 0);
    }

    #[test]
    fn test_melee_tie_uses_coin() {
        for coin in [true, false] {
            let mut state = world(coin);
            let a = place(&mut state, 1, 0, 0, 3);
            let d = place(&mut state, 2, 0, 1, 3);
            let (outcome, _) = resolve_melee(&mut state, a, d, 1_000).unwrap();
            let expected = if coin { MeleeOutcome::AttackerWon } else { MeleeOutcome::DefenderWon };
            assert_eq!(outcome, expected);
            assert_eq!(state.players().len(), 1);
            assert_eq!(state.players().iter().next().unwrap().troops, 6);
        }
    }

    #[test]
    fn test_melee_tie_fairness() {
        let mut state = GameState::with_seed(GameConfig::default(), 31337);
        let mut attacker_wins = 0;
        let trials = 10_000;

        for i in 0..trials {
            let a = place(&mut state, 2 * i + 1, 0, 0, 4);
            let d = place(&mut state, 2 * i + 2, 1, 0, 4);
            let (outcome, _) = resolve_melee(&mut state, a, d, 0).unwrap();
            if outcome == MeleeOutcome::AttackerWon {
                attacker_wins += 1;
            }
            // Clear the survivor for the next round
            let survivor = state.players().ids()[0];
            state.players_mut().remove(&survivor);
        }

        let ratio = f64::from(attacker_wins) / trials as f64;
        assert!((0.47..=0.53).contains(&ratio), "attacker win ratio {ratio}");
    }

    #[test]
    fn test_melee_level_up_is_private_and_last() {
        let mut state = world(true);
        let a = place(&mut state, 1, 0, 0, 5);
        place(&mut state, 2, 1, 0, 1);
        state.players_mut().get_mut(&a).unwrap().xp = 95;

        let events = resolve_move(&mut state, a, Hex::new(1, 0), 5_000).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].recipient, crate::game::events::Recipient::Only(a));
        assert!(matches!(events[2].data, GameEventData::LevelUp(ref p) if p.level == 2));
    }

    #[test]
    fn test_ranged_tick_elimination() {
        let mut state = world(true);
        let attacker = place(&mut state, 1, 0, 0, 3);
        // In range of each other; the attacker fires first and the defender
        // dies before its turn
        let defender = place(&mut state, 2, 3, 0, 3);

        let events = resolve_ranged_volleys(&mut state);

        let projectiles = events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::Projectile { .. }))
            .count();
        assert_eq!(projectiles, 3);

        let died_at = events.iter().position(|e| *e == GameEvent::player_died(defender)).unwrap();
        let updates_after = events[died_at + 1..].iter().any(|e| {
            matches!(&e.data, GameEventData::PlayerUpdated(p) if p.id == defender)
        });
        assert!(!updates_after);
        assert!(state.get_player(&defender).is_none());

        // Attacker earned kill XP and was not hit
        let shooter = state.get_player(&attacker).unwrap();
        assert_eq!(shooter.troops, 3);
        assert_eq!(shooter.xp, state.config.kill_xp(1));
    }

    #[test]
    fn test_ranged_partial_damage_updates_each_shot() {
        let mut state = world(true);
        let a = place(&mut state, 1, 0, 0, 2);
        let d = place(&mut state, 2, 0, 2, 10);
        let events = resolve_ranged_volleys(&mut state);

        // a fires 2 at d, then d (now 8 troops) fires at a until it drops
        let expected_first = [
            GameEvent::projectile(a, d),
            GameEvent::projectile(a, d),
        ];
        let shots: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::Projectile { .. }))
            .cloned()
            .collect();
        assert_eq!(&shots[..2], &expected_first);
        // two shots kill a; the rest of d's volley is not fired
        assert_eq!(shots.len(), 4);
        assert!(state.get_player(&a).is_none());
        assert_eq!(state.get_player(&d).unwrap().troops, 8);
    }

    #[test]
    fn test_mutual_elimination_first_registered_fires_first() {
        // Both would kill the other; registry order decides
        let mut state = world(true);
        let first = place(&mut state, 1, 0, 0, 3);
        let second = place(&mut state, 2, 2, 0, 3);

        let events = resolve_ranged_volleys(&mut state);

        assert!(state.get_player(&first).is_some());
        assert!(state.get_player(&second).is_none());
        assert!(events.iter().all(|e| !matches!(e.data, GameEventData::Projectile { from, .. } if from == second)));
    }

    #[test]
    fn test_ranged_out_of_range_does_nothing() {
        let mut state = world(true);
        place(&mut state, 1, 0, 0, 3);
        place(&mut state, 2, 4, 0, 3);
        assert!(resolve_ranged_volleys(&mut state).is_empty());
        assert_eq!(state.players().len(), 2);
    }

    #[test]
    fn test_target_policies() {
        let mut state = world(true);
        let shooter = place(&mut state, 1, 0, 0, 1);
        let far = place(&mut state, 2, 3, 0, 9);
        let near = place(&mut state, 3, 0, 1, 9);

        let p = state.get_player(&shooter).unwrap().clone();
        assert_eq!(select_target(&state, &p), Some(far));

        state.config.target_policy = TargetPolicy::Nearest;
        assert_eq!(select_target(&state, &p), Some(near));
    }
}
