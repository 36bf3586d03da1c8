//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → args.rs (CLI flags override file values)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared by value/Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend pool is fixed for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::Args;
pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendConfig, ForwardingConfig, HealthCheckConfig, HealthMode, ListenerConfig,
    ObservabilityConfig, ProxyConfig, TimeoutConfig,
};
