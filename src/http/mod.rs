//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! server.rs: bind (synchronous, fails before readiness flips)
//!     → serve (async task; runtime errors go to a channel)
//!     → shutdown (stop accepting, drain in-flight, bounded by deadline)
//!
//! request.rs: stamps x-request-id on inbound requests for tracing
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::{ServeError, Server, ServerHandle};
