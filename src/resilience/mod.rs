//! Resilience primitives shared by startup dependencies.
//!
//! # Design Decisions
//! - One parameterized retry policy (max attempts, backoff function)
//!   instead of ad hoc loops in each caller
//! - Attempts are bounded by count, not wall clock, so worst-case
//!   startup time is deterministic

pub mod retry;

pub use retry::{Backoff, RetryPolicy};
