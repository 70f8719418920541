//! WebSocket Game Server
//!
//! Accepts WebSocket connections, mints a [`PlayerId`] per socket, and
//! bridges frames to the single world [`Session`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};
use url::form_urlencoded;

use crate::game::config::GameConfig;
use crate::game::player::PlayerId;
use crate::game::state::GameState;
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::network::session::{Session, SessionHandle, SessionError};

/// Outbound queue depth per connection.
pub const CLIENT_QUEUE_SIZE: usize = 256;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Period of the ranged-combat pass.
    pub tick_interval: Duration,
    /// Server version string.
    pub version: String,
    /// Fixed world seed; random when unset.
    pub rng_seed: Option<u64>,
    /// Gameplay rules.
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_connections: 1000,
            tick_interval: Duration::from_millis(crate::DEFAULT_TICK_MS),
            version: env!("CARGO_PKG_VERSION").to_string(),
            rng_seed: None,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// `HEX_BIND_ADDR`, `PORT`, `HEX_MAX_CONNECTIONS`, `HEX_TICK_MS`, `HEX_RNG_SEED`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = parse_var(&lookup, "HEX_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(port) = parse_var::<u16>(&lookup, "PORT") {
            config.bind_addr.set_port(port);
        }
        if let Some(max) = parse_var(&lookup, "HEX_MAX_CONNECTIONS") {
            config.max_connections = max;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "HEX_TICK_MS") {
            if ms > 0 {
                config.tick_interval = Duration::from_millis(ms);
            } else {
                warn!("HEX_TICK_MS must be positive, keeping {:?}", config.tick_interval);
            }
        }
        config.rng_seed = parse_var(&lookup, "HEX_RNG_SEED");

        config
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection limit reached.
    #[error("Connection limit reached")]
    ConnectionLimitReached,

    /// Session error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Decrements the live connection count when a connection task ends.
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Open connections.
    connections: Arc<AtomicUsize>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
        }
    }

    /// Bind and run until shutdown. Returns the final world.
    pub async fn run(&self) -> Result<GameState, GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Run on an already bound listener until shutdown.
    #[instrument(skip(self, listener))]
    pub async fn serve(&self, listener: TcpListener) -> Result<GameState, GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);

        let seed = self.config.rng_seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });
        info!("World seed: {}", seed);

        let state = GameState::with_seed(self.config.game.clone(), seed);
        let session = Session::new(state, self.config.tick_interval);
        let (handle, session_task) = session.spawn(self.shutdown_tx.subscribe());

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let count = self.connections.load(Ordering::SeqCst);
                            if count >= self.config.max_connections {
                                warn!("{}, rejecting {}", GameServerError::ConnectionLimitReached, addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.connections.fetch_add(1, Ordering::SeqCst);
                            let guard = ConnectionGuard(self.connections.clone());
                            let handle = handle.clone();
                            let shutdown_rx = self.shutdown_tx.subscribe();
                            tokio::spawn(async move {
                                let _guard = guard;
                                if let Err(e) = handle_connection(stream, addr, handle, shutdown_rx).await {
                                    debug!("Connection {} ended with error: {}", addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(handle);
        session_task
            .await
            .map_err(|e| GameServerError::Internal(format!("session task failed: {e}")))
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Pull `username` out of a handshake query string such as `username=Alice&x=1`.
///
/// Keys and values are form-decoded; the first `username` wins.
pub fn username_from_query(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "username")
        .map(|(_, value)| value.into_owned())
}

/// Serve one socket from handshake to close.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    session: SessionHandle,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), GameServerError> {
    let mut username = None;
    let ws_stream = accept_hdr_async(stream, |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        username = username_from_query(req.uri().query());
        Ok(resp)
    })
    .await?;

    let id = PlayerId::new_v4();
    let username = username.unwrap_or_default();
    debug!("Client {} is {} ('{}')", addr, id.short(), username);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(CLIENT_QUEUE_SIZE);

    session.join(id, username, msg_tx).await?;

    // Outbound: ends when the session drops our sender
    let mut sender_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            let text = match msg.to_json() {
                Ok(t) => t,
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match ClientMessage::from_json(&text) {
                        Ok(client_msg) => session.client(id, client_msg).await?,
                        Err(e) => debug!("Invalid message from {}: {}", addr, e),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Client {} disconnected", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", addr, e);
                        break;
                    }
                    _ => {}
                }
            }
            _ = &mut sender_task => {
                debug!("Outbound stream for {} closed", addr);
                break;
            }
            _ = shutdown_rx.recv() => {
                // The session broadcasts the shutdown notice; let it flush
                let _ = tokio::time::timeout(Duration::from_millis(500), &mut sender_task).await;
                break;
            }
        }
    }

    sender_task.abort();
    // The session may already be gone during shutdown
    let _ = session.leave(id).await;

    info!("Client {} cleaned up", addr);
    Ok(())
}
