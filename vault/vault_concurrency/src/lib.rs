#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Vault Concurrency
//!
//! The bounded allocation pool at the heart of Vault: a fixed-capacity set
//! of interchangeable resources (safety deposit boxes) handed to at most
//! one holder at a time.
//!
//! - Acquire creates resources lazily up to the capacity, then blocks
//! - Release wakes every blocked acquirer; one of them wins the resource
//! - Waits are bounded by caller-supplied cancellation tokens
//! - Observers are told about acquire/release without affecting pool state
//!
//! ## Integration with Other Vault Crates
//!
//! - **vault_core**: identifiers, error taxonomy and pool configuration
//! - **vault_cli**: drives pools from the command line

/// Resource pooling, observers and leases
pub mod pool;

/// Cancellation of blocking waits
pub mod sync;

// Re-export key types for easier access
pub use pool::{Lease, PoolObserver, PoolSnapshot, ResourcePool};
pub use sync::CancellationToken;
