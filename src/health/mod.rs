//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Background mode (active.rs):
//!     One timer per backend
//!     → probe.rs (GET /health, bounded by timeout)
//!     → pool lock → set healthy flag
//!
//! On-request mode (active.rs::sweep):
//!     Inbound request
//!     → probe.rs fans out one probe per backend, gathers with a deadline
//!     → pool lock → set every flag
//!     → selection
//! ```
//!
//! # Design Decisions
//! - Exactly one mode runs; background polling is the default because it
//!   keeps probe latency off the request path
//! - Probe I/O never happens under the pool lock
//! - No thresholds: a single probe result sets the flag

pub mod active;
pub mod probe;

pub use active::{check_backend, sweep, HealthMonitor};
pub use probe::{ProbeError, Prober};
