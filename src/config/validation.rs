//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts > 0)
//! - Check the database URL is a well-formed postgres URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic violation found in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("http.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("http.shutdown_timeout_secs must be greater than zero")]
    ZeroShutdownTimeout,

    #[error("http.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("database.url is not a valid postgres URL: {0}")]
    BadDatabaseUrl(String),

    #[error("database.connect_max_attempts must be greater than zero")]
    ZeroConnectAttempts,

    #[error("database.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("log.level must be one of debug, info, warn, error: got {0}")]
    BadLogLevel(String),

    #[error("log.format must be text or json: got {0}")]
    BadLogFormat(String),
}

/// Validate the configuration, collecting every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http.bind_address.trim().is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }
    if config.http.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    match Url::parse(&config.database.url) {
        Ok(url) if matches!(url.scheme(), "postgres" | "postgresql") => {}
        Ok(url) => errors.push(ValidationError::BadDatabaseUrl(format!(
            "unsupported scheme {}",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError::BadDatabaseUrl(e.to_string())),
    }
    if config.database.connect_max_attempts == 0 {
        errors.push(ValidationError::ZeroConnectAttempts);
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    if !matches!(config.log.level.as_str(), "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::BadLogLevel(config.log.level.clone()));
    }
    if !matches!(config.log.format.as_str(), "text" | "json") {
        errors.push(ValidationError::BadLogFormat(config.log.format.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
