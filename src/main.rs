//! Coin Grid Game Server
//!
//! Authoritative WebSocket server for the coin grid game.

use std::sync::Arc;
use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use coin_grid::{
    VERSION,
    game::{BoardConfig, GameCoordinator},
    network::{GameServer, ServerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Coin Grid Server v{}", VERSION);

    let board = BoardConfig::from_env().context("Invalid board configuration")?;
    let server_config = ServerConfig::from_env().context("Invalid server configuration")?;

    info!(
        "Board: {}x{}, {} coins per batch",
        board.width, board.height, board.num_coins
    );

    let coordinator = Arc::new(GameCoordinator::new(board));
    let server = Arc::new(GameServer::new(server_config, coordinator));

    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received");
            signal_server.shutdown();
        }
    });

    server.run().await.context("Server failed")?;

    info!("Server stopped");
    Ok(())
}
