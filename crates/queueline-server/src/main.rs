//! Queueline server binary.
//!
//! # Startup Sequence
//!
//! 1. Load `.env` outside production
//! 2. Load configuration from `queueline.yaml` (or `QUEUELINE_CONFIG`)
//! 3. Initialize structured logging (tracing)
//! 4. Connect the store and run migrations
//! 5. Serve until `Ctrl-C` or `SIGTERM`
//! 6. Close the store

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use queueline_db::QueueBackend;
use queueline_server::startup::{build_backend, init_logging};
use queueline_server::{AppConfig, AppState, start_server};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "queueline.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("APP_ENV").as_deref() != Ok("production") {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
    }

    let config_path = std::env::var("QUEUELINE_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    init_logging(&config.logging);
    info!(
        config = %config_path.display(),
        backend = ?config.storage.backend,
        port = config.server.port,
        enforce_forward_transitions = config.queue.enforce_forward_transitions,
        require_done_before_remove = config.queue.require_done_before_remove,
        "queueline-server starting"
    );

    let backend = build_backend(&config.storage)
        .await
        .context("connecting queue store")?;
    let state = Arc::new(AppState::new(backend.clone()).with_policy(config.queue));

    let served = start_server(&config.server, state).await;

    if let QueueBackend::Postgres(pool) = &backend {
        pool.close().await;
    }

    served.context("serving HTTP")?;
    info!("queueline-server exited cleanly");
    Ok(())
}
