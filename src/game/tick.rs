//! Authoritative Dispatcher
//!
//! The one place world state changes. Commands are applied one at a time,
//! each producing an ordered list of scoped events. A rejected command
//! produces no events and leaves the state untouched.

use tracing::{debug, info};

use crate::game::combat::{resolve_move, resolve_ranged_volleys};
use crate::game::error::ActionError;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::GameCommand;
use crate::game::player::{PlayerId, UpgradeKind};
use crate::game::progression::apply_upgrade;
use crate::game::state::GameState;

/// Apply one command at server time `now_ms`.
///
/// Rejections are logged and swallowed; clients only ever see the absence
/// of the event they expected.
pub fn dispatch(state: &mut GameState, command: GameCommand, now_ms: u64) -> Vec<GameEvent> {
    let kind = command.kind();
    match try_dispatch(state, command, now_ms) {
        Ok(events) => events,
        Err(e) => {
            debug!("Dropped {} command: {}", kind, e);
            Vec::new()
        }
    }
}

/// Apply one command, surfacing the rejection reason.
pub fn try_dispatch(
    state: &mut GameState,
    command: GameCommand,
    now_ms: u64,
) -> Result<Vec<GameEvent>, ActionError> {
    match command {
        GameCommand::Connect { id, username } => connect(state, id, &username),
        GameCommand::Disconnect { id } => disconnect(state, id),
        GameCommand::Move { id, target } => resolve_move(state, id, target, now_ms),
        GameCommand::Upgrade { id, kind } => upgrade(state, id, kind),
        GameCommand::Tick => Ok(resolve_ranged_volleys(state)),
    }
}

/// Replay a command log from a fresh state; returns every event emitted.
pub fn replay(state: &mut GameState, commands: &[(u64, GameCommand)]) -> Vec<GameEvent> {
    commands
        .iter()
        .flat_map(|(now_ms, command)| dispatch(state, command.clone(), *now_ms))
        .collect()
}

fn connect(state: &mut GameState, id: PlayerId, username: &str) -> Result<Vec<GameEvent>, ActionError> {
    let player = state.spawn_player(id, username)?.clone();
    info!(
        "Player {} '{}' joined at {} ({} online)",
        id.short(), player.username, player.position, state.players().len()
    );

    let snapshot = state.players().iter().cloned().collect();
    Ok(vec![
        GameEvent::unicast(id, GameEventData::Welcome { id }),
        GameEvent::unicast(id, GameEventData::Snapshot { players: snapshot }),
        GameEvent::broadcast_except(id, GameEventData::PlayerJoined(player)),
    ])
}

fn disconnect(state: &mut GameState, id: PlayerId) -> Result<Vec<GameEvent>, ActionError> {
    // Announced before removal; a player already killed is gone and stays unannounced
    if !state.players().contains(&id) {
        return Err(ActionError::UnknownPlayer(id));
    }
    let events = vec![GameEvent::broadcast(GameEventData::PlayerDisconnected { id })];
    state.players_mut().remove(&id);
    info!("Player {} left ({} online)", id.short(), state.players().len());
    Ok(events)
}

fn upgrade(state: &mut GameState, id: PlayerId, kind: UpgradeKind) -> Result<Vec<GameEvent>, ActionError> {
    let config = state.config.clone();
    let player = state.players_mut().get_mut(&id).ok_or(ActionError::UnknownPlayer(id))?;
    apply_upgrade(player, kind, &config)?;
    debug!("Player {} upgraded {:?}", id.short(), kind);
    Ok(vec![GameEvent::player_updated(player)])
}
