//! Application state, router assembly and server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::{get, post};
use reqwest::Client;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use sluice_plan::PlanDefaults;
use sluice_tunnel::{OperationRegistry, ProcessRunner, TempFileManager};

use crate::api::routes;
use crate::config::AppConfig;
use crate::resolver::MediaResolver;
use crate::tunnel_store::TunnelStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub resolver: Arc<dyn MediaResolver>,
    pub runner: Arc<ProcessRunner>,
    pub store: Arc<TunnelStore>,
    pub temp: Arc<TempFileManager>,
    pub defaults: PlanDefaults,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        resolver: Arc<dyn MediaResolver>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("sluice/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let temp = Arc::new(TempFileManager::new(client.clone(), config.temp_config()));
        let registry = Arc::new(OperationRegistry::new());
        let runner = Arc::new(ProcessRunner::new(
            client,
            config.runner_config(),
            Arc::clone(&temp),
            registry,
        ));
        let store = Arc::new(TunnelStore::new(config.tunnel_ttl));
        let defaults = config.plan_defaults();

        Ok(Self {
            config: Arc::new(config),
            resolver,
            runner,
            store,
            temp,
            defaults,
            start_time: Instant::now(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", post(routes::resolve::resolve))
        .route("/tunnel", get(routes::tunnel::tunnel))
        .route("/health", get(routes::health::health))
        .layer(TraceLayer::new_for_http());

    if state.config.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}

/// Bind and serve until `shutdown` fires.
pub async fn serve(state: AppState, shutdown: CancellationToken) -> std::io::Result<()> {
    let addr = format!("{}:{}", state.config.bind_address, state.config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
}
