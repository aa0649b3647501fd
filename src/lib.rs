//! Article CRUD HTTP service.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────┐
//!                 │                 ARTICLE API                    │
//!                 │                                                │
//!  Client ────────┼─▶ http (listener) ──▶ api (routes) ──▶ store  │
//!                 │                                                │
//!                 │  ┌──────────────────────────────────────────┐ │
//!                 │  │          Cross-Cutting Concerns          │ │
//!                 │  │  config   health   observability         │ │
//!                 │  │  resilience (retry)   lifecycle          │ │
//!                 │  └──────────────────────────────────────────┘ │
//!                 └───────────────────────────────────────────────┘
//! ```
//!
//! The lifecycle coordinator owns the hard part: ordered startup
//! (store with bounded retries → migrations → readiness → listener) and
//! deterministic shutdown (not-ready visible before the listener stops
//! accepting, bounded drain, store released last).

// Core subsystems
pub mod api;
pub mod config;
pub mod http;
pub mod store;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::AppConfig;
pub use health::HealthState;
pub use lifecycle::Coordinator;
