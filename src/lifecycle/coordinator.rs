//! Service lifecycle coordination.
//!
//! Drives the process through `Init → Connecting → ReadyServing →
//! ShuttingDown → Stopped`, ordering three independent, fallible
//! subsystems: the store connection, the listener, and OS signals.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::config::AppConfig;
use crate::health::HealthState;
use crate::http::{ServeError, Server, ServerHandle};
use crate::lifecycle::signals::TermSignal;
use crate::store::{Migration, Store, StoreError};

/// Lifecycle phases, published on a watch channel for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Connecting,
    ReadyServing,
    ShuttingDown,
    Stopped,
}

/// What triggered the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    Signal(TermSignal),
    ServeFailure,
}

impl ShutdownCause {
    pub fn exit_code(self) -> i32 {
        match self {
            ShutdownCause::Signal(signal) => signal.exit_code(),
            ShutdownCause::ServeFailure => 1,
        }
    }
}

/// Fatal startup errors. The process must not serve after any of these.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Serve(#[from] ServeError),
}

/// Orchestrates startup order and signal-driven shutdown.
pub struct Coordinator {
    health: Arc<HealthState>,
    drain_timeout: Duration,
    phase: watch::Sender<Phase>,
}

impl Coordinator {
    pub fn new(health: Arc<HealthState>, drain_timeout: Duration) -> Self {
        let (phase, _) = watch::channel(Phase::Init);
        Self {
            health,
            drain_timeout,
            phase,
        }
    }

    /// Subscribe to phase transitions.
    pub fn phases(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    fn enter(&self, phase: Phase) {
        tracing::info!(?phase, "lifecycle phase");
        self.phase.send_replace(phase);
    }

    /// Bring the service up in dependency order: store (connect, migrate),
    /// then readiness, then the listener.
    ///
    /// Any error aborts startup before readiness ever flips; the caller
    /// exits non-zero without serving.
    pub async fn start<F>(
        &self,
        config: &AppConfig,
        migrations: &[Migration],
        make_router: F,
    ) -> Result<(Store, ServerHandle), StartupError>
    where
        F: FnOnce(&Store) -> axum::Router,
    {
        self.enter(Phase::Connecting);

        let store = Store::open(&config.database)?;
        store.connect().await?;
        let applied = store.migrate(migrations).await?;
        tracing::info!(applied, "migrations up to date");

        // Readiness flips before the listener starts; the health endpoint
        // answers 200 from the very first accepted connection.
        self.health.set_ready();

        let router = make_router(&store);
        let server = Server::bind(&config.http.bind_address).await?;
        let handle = server.serve(router);

        self.enter(Phase::ReadyServing);
        Ok((store, handle))
    }

    /// Block until a serve error or a termination signal, whichever comes
    /// first, then run the ordered shutdown sequence. Returns the exit code.
    pub async fn supervise(
        self,
        store: Store,
        mut handle: ServerHandle,
        mut signals: mpsc::Receiver<TermSignal>,
    ) -> i32 {
        let cause = tokio::select! {
            err = handle.serve_error() => {
                tracing::error!(error = %err, "server failed");
                ShutdownCause::ServeFailure
            }
            received = signals.recv() => match received {
                Some(signal) => {
                    tracing::info!(%signal, "captured termination signal, exiting");
                    ShutdownCause::Signal(signal)
                }
                None => {
                    tracing::warn!("signal channel closed, treating as terminate");
                    ShutdownCause::Signal(TermSignal::Terminate)
                }
            },
        };

        // Order matters: external health checks must observe not-ready
        // before the listener stops accepting, and the store must outlive
        // the last in-flight request.
        self.health.set_not_ready();
        self.enter(Phase::ShuttingDown);

        if let Err(e) = handle.shutdown(self.drain_timeout).await {
            tracing::warn!(error = %e, "server shutdown incomplete");
        }
        store.close().await;

        self.enter(Phase::Stopped);
        cause.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use axum::routing::get;
    use axum::Router;

    fn lazy_store() -> Store {
        // connect_lazy performs no I/O; good enough for shutdown-path tests.
        Store::open(&DatabaseConfig::default()).unwrap()
    }

    async fn running_handle() -> ServerHandle {
        let server = Server::bind("127.0.0.1:0").await.unwrap();
        server.serve(Router::new().route("/ping", get(|| async { "pong" })))
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(ShutdownCause::Signal(TermSignal::Interrupt).exit_code(), 130);
        assert_eq!(ShutdownCause::Signal(TermSignal::Terminate).exit_code(), 0);
        assert_eq!(ShutdownCause::ServeFailure.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_signal_drives_ordered_shutdown() {
        let health = Arc::new(HealthState::new());
        health.set_ready();
        let coordinator = Coordinator::new(health.clone(), Duration::from_secs(5));
        let mut phases = coordinator.phases();

        let handle = running_handle().await;
        let (sig_tx, sig_rx) = mpsc::channel(1);

        let supervise = tokio::spawn(coordinator.supervise(lazy_store(), handle, sig_rx));
        sig_tx.send(TermSignal::Interrupt).await.unwrap();

        assert_eq!(supervise.await.unwrap(), 130);
        assert!(!health.is_ready());
        assert_eq!(*phases.borrow_and_update(), Phase::Stopped);
    }

    #[tokio::test]
    async fn test_serve_failure_takes_same_shutdown_path() {
        let health = Arc::new(HealthState::new());
        health.set_ready();
        let coordinator = Coordinator::new(health.clone(), Duration::from_secs(5));
        let mut phases = coordinator.phases();

        let mut handle = running_handle().await;
        handle.fail();
        let (_sig_tx, sig_rx) = mpsc::channel(1);

        let code = coordinator.supervise(lazy_store(), handle, sig_rx).await;

        assert_eq!(code, 1);
        assert!(!health.is_ready());
        assert_eq!(*phases.borrow_and_update(), Phase::Stopped);
    }

    #[tokio::test]
    async fn test_closed_signal_channel_exits_zero() {
        let health = Arc::new(HealthState::new());
        let coordinator = Coordinator::new(health.clone(), Duration::from_secs(5));

        let handle = running_handle().await;
        let (sig_tx, sig_rx) = mpsc::channel::<TermSignal>(1);
        drop(sig_tx);

        assert_eq!(coordinator.supervise(lazy_store(), handle, sig_rx).await, 0);
    }
}
