mod config;
mod main_lib;

use config::Config;
use main_lib::{authenticate, build_state, init_tracing, spawn_event_logger, start_telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config)?;
    let logger = spawn_event_logger(&state);

    let session = authenticate(&state, &config).await?;
    tracing::info!("Monitoring readings for user {}", session.user_id());

    if let Err(e) = state.tracker.refresh().await {
        tracing::warn!("Initial refresh failed: {}", e);
    }

    // Kept alive for the lifetime of the process.
    let _link = match &config.mqtt {
        Some(mqtt) => Some(start_telemetry(&state, mqtt).await?),
        None => {
            tracing::info!("No MQTT broker configured; live samples disabled");
            None
        }
    };

    let poller = state.tracker.spawn_polling();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    poller.abort();
    logger.abort();
    Ok(())
}
