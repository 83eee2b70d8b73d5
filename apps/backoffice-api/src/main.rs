//! # PDV Back-Office API server
//!
//! ```text
//! .env ─► ApiConfig::load ─► Database::new (migrations) ─► bootstrap_admin
//!                                                              │
//!          axum::serve(build_router + TraceLayer) ◄────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use pdv_backoffice_api::auth::bootstrap_admin;
use pdv_backoffice_api::{build_router, ApiConfig, AppState};
use pdv_db::{Database, DbConfig};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is normal outside development
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded .env");
    }

    info!("Starting PDV back-office API...");

    let config = ApiConfig::load().context("invalid configuration")?;
    info!(
        addr = %config.socket_addr(),
        database = %config.database_path.display(),
        till_id = %config.till_id,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("PDV_JWT_SECRET not set, signing tokens with the development secret");
    }

    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .context("failed to open database")?;

    match (&config.admin_username, &config.admin_password) {
        (Some(username), Some(password)) => {
            bootstrap_admin(&db, username, password)
                .await
                .context("failed to bootstrap admin operator")?;
        }
        _ => {
            if db.operators().count().await? == 0 {
                warn!("No operators exist; set PDV_ADMIN_USERNAME and PDV_ADMIN_PASSWORD to create one");
            }
        }
    }

    let addr = config.socket_addr();
    let state = Arc::new(AppState::new(db.clone(), config));
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
