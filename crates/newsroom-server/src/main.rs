mod config;

use std::sync::Arc;

use tracing::{info, warn};

use newsroom_api::auth::{AppState, AppStateInner, TokenSettings};
use newsroom_api::routes;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsroom=debug,newsroom_api=debug,newsroom_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_placeholder_secret() {
        warn!("NEWSROOM_JWT_SECRET is unset or a placeholder; tokens are forgeable");
    }
    if !config.category_writes_require_auth {
        warn!("Category writes are open to anonymous callers");
    }

    // Init database
    let db = newsroom_db::Database::open(&config.db_path)?;

    let mut inner = AppStateInner::new(
        db,
        TokenSettings {
            secret: config.jwt_secret.clone(),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        },
    );
    inner.category_writes_require_auth = config.category_writes_require_auth;
    let state: AppState = Arc::new(inner);

    let app = routes::router(state);

    info!("Newsroom listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
            },
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
