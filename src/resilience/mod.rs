//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (deadline fixed at dispatch)
//!     → upstream call bounded by the deadline
//!     → response body bounded by the same deadline
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - A single attempt per request: no retries, no failover, no circuit breaker

pub mod timeouts;

pub use timeouts::{Deadline, Elapsed};
