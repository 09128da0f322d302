//! Resource pooling.
//!
//! - `resource`: the bounded pool with blocking acquire
//! - `observer`: callbacks notified when resources change hands
//! - `lease`: scoped guards that return a resource on drop

pub mod lease;
pub mod observer;
pub mod resource;

pub use lease::Lease;
pub use observer::{LoggingObserver, NoopObserver, PoolObserver, RecordedEvent, RecordingObserver};
pub use resource::{PoolSnapshot, ResourcePool, ResourceState};
