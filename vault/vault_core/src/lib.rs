//! # Vault Core
//!
//! `vault_core` provides the building blocks shared by the Vault crates:
//! resource identifiers, the error taxonomy of the allocation pool, and
//! configuration and logging helpers.
//!
//! ## Crate Structure
//!
//! - **error**: Error types returned by pool operations and observers
//! - **id**: Strongly-typed resource identifiers
//! - **utils**: Configuration and logging utilities
//! - **macros**: Structured logging macro

pub mod error;
pub mod id;
pub mod macros;
pub mod utils;

#[doc(hidden)]
pub use log as __log;

// Re-export key types for convenience
pub use error::{CancelReason, ConfigError, ObserverError, PoolError, PoolEvent};
pub use id::ResourceId;
pub use utils::{LogLevel, PoolConfig, VaultConfig};
