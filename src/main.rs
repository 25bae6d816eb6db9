//! Tilematch Game Server
//!
//! Binary entry point: initializes logging and runs the WebSocket
//! server with the tick loop.

use tracing::info;
use tracing_subscriber::EnvFilter;

use tilematch::{GameServer, ServerConfig, MATCH_DURATION_MS, TICK_INTERVAL_MS, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = ServerConfig::default();
    if let Ok(addr) = std::env::var("TILEMATCH_ADDR") {
        config.bind_addr = addr.parse()?;
    }

    info!("Tilematch Server v{}", VERSION);
    info!("Tick period: {} ms", TICK_INTERVAL_MS);
    info!("Match duration: {} s", MATCH_DURATION_MS / 1000);

    GameServer::new(config).run().await?;
    Ok(())
}
