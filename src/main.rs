//! Hex Conquest Game Server
//!
//! Authoritative game server for Hex Conquest.
//! Configuration comes from the environment; see [`ServerConfig::from_env`].

use std::sync::Arc;
use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hex_conquest::{GameServer, ServerConfig, DEFAULT_TICK_MS, VERSION};

#[cfg(feature = "debug-tracing")]
const DEFAULT_LOG_FILTER: &str = "debug";
#[cfg(not(feature = "debug-tracing"))]
const DEFAULT_LOG_FILTER: &str = "info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = ServerConfig::from_env();
    info!("Hex Conquest Server v{}", VERSION);
    info!(
        "Tick every {} ms (default {} ms), max {} connections",
        config.tick_interval.as_millis(),
        DEFAULT_TICK_MS,
        config.max_connections
    );

    let server = Arc::new(GameServer::new(config.clone()));

    let signal_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received");
                signal_server.shutdown();
            }
            Err(e) => warn!("Could not listen for ctrl-c: {}", e),
        }
    });

    let state = server
        .run()
        .await
        .with_context(|| format!("server on {} failed", config.bind_addr))?;

    info!(
        "Stopped with {} players, state hash {}",
        state.players().len(),
        hex::encode(state.state_hash())
    );
    Ok(())
}
