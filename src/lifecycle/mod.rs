//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs):
//!     Open store → Connect (retried) → Migrate → mark ready → start listener
//!
//! Supervision:
//!     Single blocking select over {serve error, termination signal};
//!     first event wins, the other is not awaited further
//!
//! Shutdown:
//!     mark not-ready → stop accepting, drain (bounded) → close store → exit
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → termination channel → exit code 130 / 0
//! ```
//!
//! # Design Decisions
//! - Readiness flips to not-ready strictly before the listener refuses
//!   connections, so external checks can observe the drain
//! - Shutdown-phase errors are logged, never fatal: the process always exits
//! - Store connect/migrate failures abort startup; the process never serves

pub mod coordinator;
pub mod signals;

pub use coordinator::{Coordinator, Phase, ShutdownCause, StartupError};
pub use signals::TermSignal;
