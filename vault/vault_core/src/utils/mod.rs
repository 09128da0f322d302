//! Utility functions and types.
//!
//! This module provides the configuration and logging utilities used
//! throughout the system.

pub mod config;
pub mod logging;

pub use config::{PoolConfig, VaultConfig};
pub use logging::LogLevel;
