//! prodguard - TTL cache and security heuristics for the production reporting portal
//!
//! Serves the cache and security engine over HTTP for the portal's route handlers.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prodguard::api::create_router;
use prodguard::{AppState, Config};

/// Main entry point for the prodguard server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and the security engine
/// 4. Start both background sweeps
/// 5. Start HTTP server on configured port
/// 6. Stop the sweeps on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prodguard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting prodguard");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_max_entries={}, cache_default_ttl={}ms, max_login_attempts={}, trust_forwarded_for={}, port={}",
        config.cache_max_entries,
        config.cache_default_ttl_ms,
        config.max_login_attempts,
        config.trust_forwarded_for,
        config.server_port
    );

    let state = AppState::from_config(&config);
    state.cache.start_sweep(config.cache_sweep_every());
    state.security.start_sweep(config.security_sweep_every());
    info!(
        cache_every_secs = config.cache_sweep_interval,
        security_every_secs = config.security_sweep_interval,
        "Background sweeps started"
    );

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Peer addresses back the client IP when no trusted proxy header is present
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sweeps.
async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
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

    state.cache.stop_sweep();
    state.security.stop_sweep();
    warn!("Background sweeps stopped");
}
