mod api;
mod sorter;
mod state;

#[cfg(test)]
mod testing;

use pmoconfig::Config;
use pmoserver::{LoggingOptions, ServerBuilder};
use state::AppState;
use tracing::{error, info};
use utoipa::OpenApi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========== PHASE 1 : Configuration et logs ==========
    let config = Config::load_config("")?;

    let mut server = ServerBuilder::new_configured(&config).build();
    server.init_logging(LoggingOptions::from_config(&config));
    config.log_summary();

    // ========== PHASE 2 : Services ==========
    let state = AppState::from_config(&config).inspect_err(|e| {
        error!("Invalid configuration, not starting: {:#}", e);
    })?;

    server.add_router("/", api::create_router(state));
    server.add_openapi(api::ApiDoc::openapi(), "pmocheck");

    // ========== PHASE 3 : Démarrage du serveur ==========
    info!("Starting HTTP server...");
    server.start().await?;

    info!(port = server.info().http_port, "PMOCheck is ready");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
