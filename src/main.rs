use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use article_api::api::{self, AppState};
use article_api::config::{load_config, validate_config, AppConfig};
use article_api::health::HealthState;
use article_api::lifecycle::{signals, Coordinator};
use article_api::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "article-api", version, about = "HTTP CRUD service for articles")]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP bind address, e.g. 127.0.0.1:5000.
    #[arg(long, env = "API_HTTP_ADDR")]
    bind_address: Option<String>,

    /// PostgreSQL connection URL.
    #[arg(long, env = "API_POSTGRES_URL")]
    database_url: Option<String>,

    /// Log level: debug, info, warn, error.
    #[arg(long, env = "API_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("could not load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };
    if let Some(bind_address) = cli.bind_address {
        config.http.bind_address = bind_address;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }
    if let Some(log_level) = cli.log_level {
        config.log.level = log_level;
    }
    if let Err(errors) = validate_config(&config) {
        for error in errors {
            eprintln!("invalid config: {}", error);
        }
        std::process::exit(1);
    }

    logging::init(&config.log);
    tracing::info!(
        bind_address = %config.http.bind_address,
        shutdown_timeout_secs = config.http.shutdown_timeout_secs,
        connect_max_attempts = config.database.connect_max_attempts,
        "article-api starting"
    );

    let health = Arc::new(HealthState::new());
    let coordinator = Coordinator::new(
        health.clone(),
        Duration::from_secs(config.http.shutdown_timeout_secs),
    );

    let migrations = api::articles::migrations();
    let (store, handle) = match coordinator
        .start(&config, &migrations, |store| {
            api::router(
                AppState {
                    pool: store.pool().clone(),
                    health: health.clone(),
                },
                &config,
            )
        })
        .await
    {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            std::process::exit(1);
        }
    };

    let signal_rx = match signals::listen() {
        Ok(rx) => rx,
        Err(e) => {
            tracing::error!(error = %e, "could not install signal handlers");
            std::process::exit(1);
        }
    };

    let code = coordinator.supervise(store, handle, signal_rx).await;
    tracing::info!(code, "shutdown complete");
    std::process::exit(code);
}
