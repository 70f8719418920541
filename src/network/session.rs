//! World Session
//!
//! One task owns the [`GameState`]. Connection tasks talk to it only through
//! a command channel and receive [`ServerMessage`]s on their own channel, so
//! every state change is serialized through [`dispatch`].

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::events::GameEvent;
use crate::game::input::GameCommand;
use crate::game::player::PlayerId;
use crate::game::state::GameState;
use crate::game::tick::dispatch;
use crate::network::protocol::{ClientMessage, ServerMessage};

/// Capacity of the session's inbound command queue.
pub const COMMAND_QUEUE_SIZE: usize = 1024;

/// Current server time in Unix milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Requests from connection tasks to the session.
#[derive(Debug)]
pub enum SessionCommand {
    /// A socket finished its handshake.
    Join {
        /// Id minted for the connection
        id: PlayerId,
        /// Raw handshake name
        username: String,
        /// Outbound channel for this connection
        sender: mpsc::Sender<ServerMessage>,
    },
    /// A parsed client frame.
    Client {
        /// Sending connection
        id: PlayerId,
        /// The message
        message: ClientMessage,
    },
    /// A socket closed.
    Leave {
        /// Closing connection
        id: PlayerId,
    },
}

/// Session errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The session task has stopped.
    #[error("Session closed")]
    Closed,
}

/// Cloneable sender side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Queue a command for the session.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }

    /// Announce a new connection.
    pub async fn join(
        &self,
        id: PlayerId,
        username: String,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<(), SessionError> {
        self.send(SessionCommand::Join { id, username, sender }).await
    }

    /// Forward a client frame.
    pub async fn client(&self, id: PlayerId, message: ClientMessage) -> Result<(), SessionError> {
        self.send(SessionCommand::Client { id, message }).await
    }

    /// Announce a closed connection.
    pub async fn leave(&self, id: PlayerId) -> Result<(), SessionError> {
        self.send(SessionCommand::Leave { id }).await
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// The world plus the outbound channel of every open connection.
pub struct Session {
    /// Authoritative world
    state: GameState,
    /// Open connections, including spectating dead players
    connections: BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>,
    /// Ranged-combat period
    tick_interval: Duration,
}

impl Session {
    /// Create a session around a world.
    pub fn new(state: GameState, tick_interval: Duration) -> Self {
        Self {
            state,
            connections: BTreeMap::new(),
            tick_interval,
        }
    }

    /// Read access to the world.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Start the session task.
    ///
    /// The task ends on shutdown or once every handle is dropped, and
    /// yields the final world.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> (SessionHandle, JoinHandle<GameState>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let task = tokio::spawn(self.run(rx, shutdown));
        (SessionHandle { tx }, task)
    }

    /// Main loop: commands and ticks, one at a time.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<SessionCommand>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> GameState {
        let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Session started (tick every {:?})", self.tick_interval);

        loop {
            tokio::select! {
                command = rx.recv() => {
                    match command {
                        Some(command) => self.handle(command, now_ms()),
                        None => {
                            info!("All session handles dropped");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.apply(GameCommand::Tick, now_ms());
                }
                _ = shutdown.recv() => {
                    info!("Session shutting down");
                    self.broadcast(ServerMessage::Shutdown {
                        reason: "Server shutting down".to_string(),
                    });
                    break;
                }
            }
        }

        self.state
    }

    /// Handle one command at server time `now_ms`.
    pub fn handle(&mut self, command: SessionCommand, now_ms: u64) {
        match command {
            SessionCommand::Join { id, username, sender } => {
                if self.connections.contains_key(&id) {
                    warn!("Duplicate join for {}", id.short());
                    return;
                }
                self.connections.insert(id, sender);
                if !self.apply(GameCommand::Connect { id, username }, now_ms) {
                    warn!("Could not place {}; closing connection", id.short());
                    self.connections.remove(&id);
                }
            }
            SessionCommand::Client { id, message } => match message {
                ClientMessage::Move { .. } => {
                    if let Some(target) = message.move_target() {
                        self.apply(GameCommand::Move { id, target }, now_ms);
                    }
                }
                ClientMessage::Upgrade(kind) => {
                    self.apply(GameCommand::Upgrade { id, kind }, now_ms);
                }
                ClientMessage::Ping { timestamp } => {
                    self.send_to(&id, ServerMessage::Pong { timestamp, server_time: now_ms });
                }
            },
            SessionCommand::Leave { id } => {
                self.connections.remove(&id);
                self.apply(GameCommand::Disconnect { id }, now_ms);
            }
        }
    }

    /// Dispatch and deliver. Returns whether any event was produced.
    fn apply(&mut self, command: GameCommand, now_ms: u64) -> bool {
        let events = dispatch(&mut self.state, command, now_ms);
        let produced = !events.is_empty();
        self.deliver(events);
        produced
    }

    /// Route events to connections in emission order.
    fn deliver(&mut self, events: Vec<GameEvent>) {
        let mut lagging = Vec::new();

        for event in events {
            let recipient = event.recipient;
            let message = ServerMessage::from(event.data);
            for (id, sender) in &self.connections {
                if !recipient.includes(id) {
                    continue;
                }
                if let Err(e) = sender.try_send(message.clone()) {
                    debug!("Dropping {} for {}: {}", message.event_name(), id.short(), e);
                    lagging.push(*id);
                }
            }
        }

        // A connection that cannot keep up would miss deltas; cut it loose so
        // its socket closes and it rejoins with a fresh snapshot.
        for id in lagging {
            if self.connections.remove(&id).is_some() {
                warn!("Connection {} fell behind; closing", id.short());
            }
        }
    }

    /// Send to one connection.
    fn send_to(&mut self, id: &PlayerId, message: ServerMessage) {
        let failed = self
            .connections
            .get(id)
            .is_some_and(|sender| sender.try_send(message).is_err());
        if failed {
            warn!("Connection {} fell behind; closing", id.short());
            self.connections.remove(id);
        }
    }

    /// Send a message to every open connection.
    pub fn broadcast(&self, message: ServerMessage) {
        for sender in self.connections.values() {
            let _ = sender.try_send(message.clone());
        }
    }
}
