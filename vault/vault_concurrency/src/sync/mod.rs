//! Synchronization helpers used by the pool.

pub mod cancel;

pub use cancel::CancellationToken;
