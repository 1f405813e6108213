mod config;
mod errors;
mod filter;
mod models;
mod routes;
mod state;
mod upload;
mod worker;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::upload::storage::{check_reference_data, DiskStore};
use crate::worker::invoker::WorkerInvoker;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobmatch API v{}", env!("CARGO_PKG_VERSION"));

    // Startup probe only; the request path re-checks before every worker
    // launch, so a file dropped in later is picked up without a restart.
    if let Err(e) = check_reference_data(&config.data_dir) {
        warn!(
            data_dir = %config.data_dir.display(),
            "{e}; uploads will fail until reference data is in place"
        );
    }

    let store = Arc::new(DiskStore::new(&config.upload_dir)?);
    info!(upload_dir = %config.upload_dir.display(), "upload store ready");

    let invoker = Arc::new(WorkerInvoker::from_config(&config));
    info!(
        worker = %config.worker_bin,
        script = %config.worker_script.display(),
        timeout = ?config.worker_timeout,
        "worker invoker ready"
    );

    let cors = cors_layer(&config)?;

    let state = AppState {
        config: config.clone(),
        store,
        invoker,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Exact-origin allow-list when configured; permissive otherwise (dev).
fn cors_layer(config: &Config) -> Result<CorsLayer> {
    if config.allowed_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid origin in ALLOWED_ORIGINS: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST]))
}
