//! SalesDesk identity server
//!
//! Main entry point that wires the crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use salesdesk_api::AppState;
use salesdesk_auth::LogNotifier;
use salesdesk_cache::provider::CacheManager;
use salesdesk_core::config::AppConfig;
use salesdesk_core::error::AppError;
use salesdesk_database::DatabasePool;
use salesdesk_database::repositories::Repositories;

#[tokio::main]
async fn main() {
    let env = std::env::var("SALESDESK_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting SalesDesk v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Initialize cache ─────────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache...");
    let cache = Arc::new(CacheManager::new(&config.cache).await?);

    // ── Step 2: Repositories ─────────────────────────────────────
    let (repos, db_pool) = if config.uses_postgres() {
        let db_pool = DatabasePool::open(&config.database).await?;
        (db_pool.repositories(), Some(db_pool))
    } else {
        tracing::warn!("Using in-memory repositories; data is lost on restart");
        (Repositories::in_memory(), None)
    };

    // ── Step 3: Auth services and application state ──────────────
    let cleanup_interval = config.session.cleanup_interval_minutes;
    let mut state = AppState::new(config, repos, cache, Arc::new(LogNotifier));
    if let Some(db_pool) = &db_pool {
        state = state.with_database(db_pool.clone());
    }

    // ── Step 4: Background session sweeper ───────────────────────
    let cleanup_handle = state.auth.session_cleanup(cleanup_interval).spawn();

    // ── Step 5: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("SalesDesk server listening on {}", addr);

    let audit = state.auth.audit.clone();
    let app = salesdesk_api::build_router(state);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
    })
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    cleanup_handle.abort();
    if let Err(e) = audit.flush().await {
        tracing::warn!(error = %e, "Audit trail was not flushed");
    }
    if let Some(db_pool) = db_pool {
        db_pool.close().await;
    }

    tracing::info!("SalesDesk server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
