//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse flags → Load config → Validate → Build pool → Start monitor + listener
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain connections → Stop health tasks → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - The core never waits on signals itself; it only honours the shutdown broadcast

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_handler, wait_for_termination};
