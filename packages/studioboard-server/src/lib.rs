/// Studioboard server: config loading, storage init, HTTP server.
pub mod api;
pub mod config;
mod log_bridge;
pub mod preferences;
pub mod server;
pub mod state;

use crate::state::AppState;
use std::sync::Arc;
use studioboard_core::boards::seed_board;
use studioboard_core::SqliteStorage;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = log_bridge::init() {
        log_bridge::write_fallback_line(&format!("failed to initialize server logger: {}", e));
    }

    let config_path = config::default_config_path();
    let config = config::load_config(&config_path);
    if !config_path.exists() {
        if let Err(e) = config::save_config(&config_path, &config) {
            log::warn!(
                "Could not write default config to {}: {}",
                config_path.display(),
                e
            );
        }
    }

    let db_path = config.database_path();
    let storage = SqliteStorage::open(&db_path, &config.store_config())?;
    log::info!("Opened board database at {}", db_path.display());

    if let Some(name) = config.seed_board.as_deref() {
        match seed_board(&storage, name) {
            Ok(setup) => log::info!(
                "Seeded board {:?} ({} columns)",
                setup.board.name,
                setup.columns.len()
            ),
            Err(e) => log::error!("Failed to seed board {:?}: {}", name, e),
        }
    }

    let state = AppState::new(Arc::new(storage), config.port, config.bind_address.clone());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let (port, server) = server::spawn_server(state, shutdown_rx).await?;
    log::info!("Server started on port {}", port);

    tokio::signal::ctrl_c().await?;
    log::info!("Shutdown requested");
    let _ = shutdown_tx.send(true);
    server.await?;
    Ok(())
}
