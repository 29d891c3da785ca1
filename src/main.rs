//! BioQuartier server binary
//!
//! Installs the static asset snapshot, then serves the companion API and the
//! intercepted asset requests.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bioquartier::{create_router, spawn_repair_task, AppState, Config};

/// Main entry point for the BioQuartier server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the application state and install the asset snapshot
/// 4. Start the background image repair task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bioquartier=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting BioQuartier server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: version={}, origin={}, port={}, assets={}, repair_interval={}s",
        config.version,
        config.origin,
        config.server_port,
        config.asset_dir.display(),
        config.repair_interval
    );

    let state = AppState::from_config(&config)
        .await
        .context("failed to build application state")?;

    // No traffic is served until the snapshot is in place
    let report = state
        .worker
        .install()
        .await
        .context("asset cache install failed")?;
    if report.reused {
        info!("Asset cache {} already installed", report.version);
    } else {
        info!(
            "Asset cache {} installed: {} assets, purged {:?}",
            report.version, report.fetched, report.purged
        );
    }

    let repair_handle = spawn_repair_task(state.discoveries.clone(), config.repair_interval);
    info!("Background image repair task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(repair_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the repair task and allows graceful shutdown.
async fn shutdown_signal(repair_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    repair_handle.abort();
    warn!("Repair task aborted");
}
