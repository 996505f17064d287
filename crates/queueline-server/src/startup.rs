//! Process startup helpers: logging and storage wiring.
//!
//! [`init_logging`] installs the global `tracing` subscriber, and
//! [`build_backend`] turns a [`StorageConfig`] into a ready
//! [`QueueBackend`], running migrations when asked to.

use std::time::Duration;

use queueline_db::{DbError, PostgresConfig, PostgresPool, QueueBackend};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{BackendKind, LoggingConfig, StorageConfig};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `logging.level` when set.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Connect the configured store.
///
/// # Errors
///
/// Returns [`DbError`] if `PostgreSQL` cannot be reached or a migration fails.
pub async fn build_backend(config: &StorageConfig) -> Result<QueueBackend, DbError> {
    match config.backend {
        BackendKind::Memory => {
            info!("Using in-memory queue store; state is lost on restart");
            Ok(QueueBackend::memory())
        }
        BackendKind::Postgres => {
            let pg_config = PostgresConfig::new(&config.database_url)
                .with_max_connections(config.max_connections)
                .with_connect_timeout(Duration::from_secs(config.connect_timeout_secs))
                .with_idle_timeout(Duration::from_secs(config.idle_timeout_secs));
            let pool = PostgresPool::connect(&pg_config).await?;
            if config.run_migrations {
                pool.run_migrations().await?;
            }
            Ok(QueueBackend::Postgres(pool))
        }
    }
}
