//! Shared helpers for lifecycle integration tests.
//!
//! Boots the real router and supervision loop against a lazy store pool,
//! so no database is required: only the readiness endpoint and injected
//! extra routes are exercised.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use article_api::api::{self, AppState};
use article_api::config::AppConfig;
use article_api::health::HealthState;
use article_api::lifecycle::{Coordinator, Phase, TermSignal};
use article_api::http::Server;
use article_api::store::Store;

#[allow(dead_code)]
pub struct TestService {
    pub health: Arc<HealthState>,
    pub addr: SocketAddr,
    pub sig_tx: mpsc::Sender<TermSignal>,
    pub phases: watch::Receiver<Phase>,
    pub supervise: JoinHandle<i32>,
}

/// Start a serving stack supervised by a real coordinator.
pub async fn boot(extra_routes: Option<Router>, drain_timeout: Duration) -> TestService {
    let config = AppConfig::default();
    let health = Arc::new(HealthState::new());

    // connect_lazy: no database I/O unless an article route is hit.
    let store = Store::open(&config.database).unwrap();
    let state = AppState {
        pool: store.pool().clone(),
        health: health.clone(),
    };

    let mut router = api::router(state, &config);
    if let Some(extra) = extra_routes {
        router = router.merge(extra);
    }

    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    let handle = server.serve(router);

    let coordinator = Coordinator::new(health.clone(), drain_timeout);
    let phases = coordinator.phases();
    let (sig_tx, sig_rx) = mpsc::channel(1);
    let supervise = tokio::spawn(coordinator.supervise(store, handle, sig_rx));

    TestService {
        health,
        addr,
        sig_tx,
        phases,
        supervise,
    }
}

#[allow(dead_code)]
pub async fn readiness_status(addr: SocketAddr) -> Option<u16> {
    reqwest::get(format!("http://{addr}/readiness"))
        .await
        .map(|r| r.status().as_u16())
        .ok()
}
