//! HTTP server lifecycle wrapper.
//!
//! # Responsibilities
//! - Bind the listener synchronously so bind failures surface at startup
//! - Run the accept loop in a background task; deliver runtime errors on a
//!   single-slot channel the coordinator can multiplex against signals
//! - Stop deterministically: refuse new connections at the shutdown
//!   trigger, drain in-flight requests up to a deadline, force-close past it
//!
//! # Design Decisions
//! - The accept loop is owned here rather than delegated to `axum::serve`:
//!   every connection task lives in a `JoinSet` held by the serve task, so
//!   aborting the serve task past the drain deadline severs the remaining
//!   connections instead of letting detached tasks run to completion
//! - Drain uses hyper's graceful shutdown, which also closes idle
//!   keep-alive connections instead of waiting out their next request

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tower::ServiceExt;

/// Errors from binding, serving, or stopping the listener.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Serve(#[source] std::io::Error),

    #[error("server task stopped unexpectedly")]
    Stopped,

    #[error("shutdown deadline elapsed with requests still in flight")]
    ShutdownTimeout,
}

/// A bound, not yet serving, TCP listener.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind the address. Failing here is a startup error, before the
    /// process ever reports ready.
    pub async fn bind(addr: &str) -> Result<Self, ServeError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| ServeError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| ServeError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        tracing::info!(address = %local_addr, "listener bound");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Start serving the delegate router. Does not block; completion or
    /// failure of the accept loop is reported through the returned handle.
    pub fn serve(self, router: Router) -> ServerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let (err_tx, err_rx) = mpsc::channel::<std::io::Error>(1);
        let listener = self.listener;

        let task = tokio::spawn(async move {
            let builder = ConnectionBuilder::new(TokioExecutor::new());
            let graceful = GracefulShutdown::new();
            let mut connections = JoinSet::new();

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => {
                        let (stream, peer) = match accepted {
                            Ok(accepted) => accepted,
                            Err(e) => {
                                let _ = err_tx.try_send(e);
                                return;
                            }
                        };

                        let router = router.clone();
                        let service = service_fn(move |request: Request<Incoming>| {
                            router.clone().oneshot(request.map(Body::new))
                        });
                        let connection = builder
                            .serve_connection_with_upgrades(TokioIo::new(stream), service)
                            .into_owned();
                        let watched = graceful.watch(connection);
                        connections.spawn(async move {
                            if let Err(e) = watched.await {
                                tracing::debug!(peer = %peer, error = %e, "connection ended with error");
                            }
                        });
                    }
                }
            }

            // New connections are refused from here on.
            drop(listener);

            // Drain: idle keep-alive connections close immediately, in-flight
            // requests run on. If the drain deadline elapses first, the
            // handle aborts this task and the JoinSet severs what remains.
            graceful.shutdown().await;
            while connections.join_next().await.is_some() {}
        });

        tracing::info!(address = %self.local_addr, "http server started");
        ServerHandle {
            local_addr: self.local_addr,
            shutdown_tx: Some(shutdown_tx),
            err_rx,
            task,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Handle to a running server task.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    err_rx: mpsc::Receiver<std::io::Error>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolve when the accept loop fails or stops without being told to.
    ///
    /// Never resolves while the server is healthy, so the coordinator can
    /// park on it inside a select.
    pub async fn serve_error(&mut self) -> ServeError {
        match self.err_rx.recv().await {
            Some(e) => ServeError::Serve(e),
            None => ServeError::Stopped,
        }
    }

    /// Stop accepting new connections immediately and wait for in-flight
    /// requests to drain, up to `drain_timeout`. Past the deadline the
    /// serve task is aborted, which drops its connection set and severs
    /// whatever is still running.
    pub async fn shutdown(mut self, drain_timeout: Duration) -> Result<(), ServeError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        match tokio::time::timeout(drain_timeout, &mut self.task).await {
            Ok(Ok(())) => {
                // The task may have ended with a serve error before or
                // during the drain.
                match self.err_rx.try_recv() {
                    Ok(e) => Err(ServeError::Serve(e)),
                    Err(_) => {
                        tracing::info!("http server stopped");
                        Ok(())
                    }
                }
            }
            Ok(Err(_)) => Err(ServeError::Stopped),
            Err(_) => {
                self.task.abort();
                Err(ServeError::ShutdownTimeout)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn fail(&mut self) {
        // Simulate a fatal accept-loop error for coordinator tests.
        self.task.abort();
        self.shutdown_tx.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::time::Instant;

    fn app() -> Router {
        Router::new().route("/ping", get(|| async { "pong" }))
    }

    #[tokio::test]
    async fn test_bind_conflict_is_bind_error() {
        let first = Server::bind("127.0.0.1:0").await.unwrap();
        let addr = first.local_addr().to_string();

        let err = Server::bind(&addr).await.unwrap_err();
        assert!(matches!(err, ServeError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_serves_and_shuts_down_cleanly() {
        let server = Server::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr();
        let handle = server.serve(app());

        let body = reqwest::get(format!("http://{addr}/ping"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");

        handle.shutdown(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test]
    async fn test_refuses_new_connections_after_shutdown() {
        let server = Server::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr();
        let handle = server.serve(app());

        handle.shutdown(Duration::from_secs(5)).await.unwrap();

        assert!(reqwest::get(format!("http://{addr}/ping")).await.is_err());
    }

    #[tokio::test]
    async fn test_in_flight_request_completes_within_drain() {
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                "done"
            }),
        );
        let server = Server::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr();
        let handle = server.serve(router);

        let slow = tokio::spawn(reqwest::get(format!("http://{addr}/slow")));
        tokio::time::sleep(Duration::from_millis(100)).await;

        handle.shutdown(Duration::from_secs(5)).await.unwrap();

        let response = slow.await.unwrap().unwrap();
        assert_eq!(response.text().await.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_drain_deadline_forces_close() {
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "done"
            }),
        );
        let server = Server::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr();
        let handle = server.serve(router);

        let slow = tokio::spawn(reqwest::get(format!("http://{addr}/slow")));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let start = Instant::now();
        let err = handle.shutdown(Duration::from_millis(200)).await.unwrap_err();
        assert!(matches!(err, ServeError::ShutdownTimeout));

        // The in-flight request was severed, not served to completion.
        assert!(slow.await.unwrap().is_err());
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
