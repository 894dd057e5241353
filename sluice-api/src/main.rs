use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sluice_api::api::server;
use sluice_api::config::AppConfig;
use sluice_api::resolver::UnconfiguredResolver;
use sluice_tunnel::TempFileManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice_api=debug,sluice_tunnel=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env_or_default();
    let state = server::AppState::new(config, Arc::new(UnconfiguredResolver))?;

    let shutdown = CancellationToken::new();
    let sweeper = TempFileManager::spawn_sweeper(Arc::clone(&state.temp), shutdown.clone());

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            ctrl_c_shutdown.cancel();
        }
    });

    server::serve(state, shutdown.clone()).await?;

    shutdown.cancel();
    sweeper.await?;
    Ok(())
}
