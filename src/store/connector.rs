//! Store connection management.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use url::Url;

use crate::config::DatabaseConfig;
use crate::resilience::RetryPolicy;
use crate::store::migrate::{self, Migration};

/// Errors produced by the store connector.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection descriptor is malformed. Fatal, never retried.
    #[error("invalid connection descriptor: {0}")]
    Config(String),

    /// The attempt ceiling was exhausted without a successful probe.
    #[error("could not establish a connection with the database after {attempts} attempts")]
    ConnectFailed { attempts: u32 },

    /// A schema migration failed to apply.
    #[error("migration {id} failed")]
    Migration {
        id: String,
        #[source]
        source: sqlx::Error,
    },

    /// The same migration id appears twice in the set.
    #[error("duplicate migration id {0}")]
    DuplicateMigration(String),

    /// Reading or writing the migration ledger failed.
    #[error("migration ledger error")]
    Ledger(#[source] sqlx::Error),
}

/// Connection pool to the backing store plus its startup retry policy.
///
/// Construction performs no network I/O; `connect` must succeed before the
/// pool is considered usable.
#[derive(Debug)]
pub struct Store {
    pool: PgPool,
    retry: RetryPolicy,
}

impl Store {
    /// Validate the connection descriptor and build a lazy pool.
    ///
    /// Fails fast on a malformed URL without touching the network. Must be
    /// called from within a Tokio runtime: the pool spawns its maintenance
    /// task at construction even though no connection is opened yet.
    pub fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = Url::parse(&config.url).map_err(|e| StoreError::Config(e.to_string()))?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(StoreError::Config(format!(
                "unsupported scheme {}",
                url.scheme()
            )));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&config.url)
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self {
            pool,
            retry: RetryPolicy::linear(
                config.connect_max_attempts,
                Duration::from_secs(config.connect_backoff_secs),
            ),
        })
    }

    /// Probe the store until it answers, bounded by the retry ceiling.
    pub async fn connect(&self) -> Result<(), StoreError> {
        let pool = self.pool.clone();
        self.retry
            .run(move || {
                let pool = pool.clone();
                async move {
                    sqlx::query("SELECT 1").execute(&pool).await?;
                    Ok::<_, sqlx::Error>(())
                }
            })
            .await
            .map_err(|_| StoreError::ConnectFailed {
                attempts: self.retry.max_attempts(),
            })
    }

    /// Apply all migrations not yet recorded in the ledger, in ascending
    /// id order. Returns the number applied.
    pub async fn migrate(&self, set: &[Migration]) -> Result<u64, StoreError> {
        migrate::run(&self.pool, set).await
    }

    /// The shared pool for request handlers. Internally synchronized.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Release all connections. Consumes the store, so it runs once.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("store closed");
    }
}
