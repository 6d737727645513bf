use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tracing_subscriber::EnvFilter;
use vortex_server::assets::Assets;
use vortex_server::broadcast::{Gateway, Outbound};
use vortex_server::config::ServerConfig;
use vortex_server::game_loop::{run_game_loop, GameCommand};
use vortex_server::ws::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::load_or_default();

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        anyhow::bail!("invalid server configuration: {}", e);
    }

    tracing::info!(
        "Configuration loaded: assets={}, policy={:?}, max_connections={}",
        config.assets_dir.display(),
        config.launch_policy,
        config.max_connections
    );

    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(256);
    let (broadcast_tx, _) = broadcast::channel::<Outbound>(64);
    let gateway = Gateway::new(broadcast_tx);

    let app_state = AppState {
        game_tx,
        gateway: gateway.clone(),
        assets: Assets::new(config.assets_dir.clone()),
        connection_semaphore: Arc::new(Semaphore::new(config.max_connections)),
        max_message_bytes: config.max_message_bytes,
        max_parse_errors: config.max_parse_errors,
    };

    let listen_addr = config.listen_addr.clone();

    // Spawn game loop
    tokio::spawn(run_game_loop(game_rx, gateway, config));

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", listen_addr))?;
    tracing::info!("Vortex server listening on {}", listen_addr);

    axum::serve(listener, vortex_server::router(app_state))
        .await
        .context("server error")?;
    Ok(())
}
