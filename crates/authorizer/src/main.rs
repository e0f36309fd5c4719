//! Authorizer service entry point.

use anyhow::Context;
use authorizer::adapter::Authorizer;
use authorizer::config::Config;
use authorizer::routes::{build_routes, AppState};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("authorizer=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!(
        target: "authorizer.startup",
        bind_address = %config.bind_address,
        jwks_url = %config.jwks_url,
        allowed_algorithms = ?config.allowed_algorithms,
        cache_ttl_seconds = config.jwks_cache_ttl.as_secs(),
        "Starting authorizer"
    );

    let state = AppState {
        authorizer: Arc::new(Authorizer::new(&config)),
    };
    let app = build_routes(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;

    tracing::info!(target: "authorizer.startup", "Listening for authorization requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!(target: "authorizer.shutdown", "Shutdown complete");
    Ok(())
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(target: "authorizer.shutdown", error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(target: "authorizer.shutdown", error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!(target: "authorizer.shutdown", "Received Ctrl+C"),
        () = terminate => tracing::info!(target: "authorizer.shutdown", "Received SIGTERM"),
    }
}
