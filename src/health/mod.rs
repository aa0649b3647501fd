//! Readiness signalling subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle coordinator (sole writer)
//!     → state.rs (atomic readiness flag)
//!     → endpoint.rs (GET /readiness reads the flag on every check)
//!     → external load balancer routes or drains traffic
//! ```
//!
//! # Design Decisions
//! - The flag is an owned object shared via Arc, never a process global,
//!   so each test can instantiate its own without interference
//! - Once not-ready is set during shutdown it latches: the flag never
//!   returns to ready within the same process lifetime

pub mod endpoint;
pub mod state;

pub use endpoint::readiness;
pub use state::HealthState;
