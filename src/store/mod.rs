//! Backing store subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     connector.rs Store::open (validate descriptor, lazy pool, no I/O)
//!     → Store::connect (ping, retried with linear backoff, bounded)
//!     → migrate.rs (apply pending schema changes, ledger-tracked)
//!     → pool handed to request handlers
//!
//! Shutdown:
//!     Store::close (after the listener has stopped serving)
//! ```
//!
//! # Design Decisions
//! - Connect is retried because the database typically starts concurrently
//!   with this service; a fixed attempt ceiling turns "store never comes up"
//!   into an explicit fatal error instead of an infinite hang
//! - Each migration commits its statements and its ledger row in one
//!   transaction, so a crash mid-migration never advances the ledger

pub mod connector;
pub mod migrate;

pub use connector::{Store, StoreError};
pub use migrate::Migration;
