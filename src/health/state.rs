//! Process readiness flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Two-state readiness flag: ready or not ready.
///
/// Written by the lifecycle coordinator, read by any number of concurrent
/// health-check requests. Starts ready. `set_not_ready` latches: once the
/// process begins shutting down, later `set_ready` calls are ignored.
#[derive(Debug)]
pub struct HealthState {
    ready: AtomicBool,
    latched: AtomicBool,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(true),
            latched: AtomicBool::new(false),
        }
    }

    /// Mark the process as accepting traffic. No-op after `set_not_ready`.
    pub fn set_ready(&self) {
        if !self.latched.load(Ordering::Acquire) {
            self.ready.store(true, Ordering::Release);
        }
    }

    /// Mark the process as draining. Irreversible for the process lifetime.
    pub fn set_not_ready(&self) {
        self.latched.store(true, Ordering::Release);
        self.ready.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
