//! Error types for the Vault allocation pool.
//!
//! The errors are organized by concern. `PoolError` is what acquire and
//! release hand back to callers; `ObserverError` is what an observer
//! reports; `ConfigError` covers loading configuration.

use crate::id::ResourceId;
use std::fmt;
use thiserror::Error;

/// Why a blocked acquire gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller cancelled its token explicitly.
    Cancelled,

    /// The token's deadline passed before a resource became free.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// The pool operation an observer was notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolEvent {
    /// A resource was handed to a holder.
    Acquired,

    /// A resource was returned by its holder.
    Released,
}

impl fmt::Display for PoolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquired => write!(f, "acquire"),
            Self::Released => write!(f, "release"),
        }
    }
}

/// Errors returned by pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool can never satisfy a request at its current capacity.
    ///
    /// Retrying without changing the capacity will not help.
    #[error("no resource available (capacity {capacity})")]
    NoResourceAvailable {
        /// Capacity at the time of the request
        capacity: i64,
    },

    /// The caller's own wait ended before a resource became free.
    #[error("wait for resource {0}")]
    WaitCancelled(CancelReason),

    /// The pool operation completed but the observer failed.
    ///
    /// Pool state is not rolled back: for an acquire the caller holds
    /// `resource` and must release it.
    #[error("{event} of {resource} succeeded but observer failed: {source}")]
    ObserverFailure {
        /// Resource the operation applied to
        resource: ResourceId,

        /// Which operation was being reported
        event: PoolEvent,

        /// The observer's failure
        #[source]
        source: ObserverError,
    },
}

impl PoolError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WaitCancelled(_))
    }

    /// Whether the pool operation itself went through.
    pub fn is_advisory(&self) -> bool {
        matches!(self, Self::ObserverFailure { .. })
    }

    /// The resource the operation applied to, if it completed.
    pub fn resource(&self) -> Option<ResourceId> {
        match self {
            Self::ObserverFailure { resource, .. } => Some(*resource),
            _ => None,
        }
    }
}

/// Errors reported by a pool observer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    /// A downstream notification channel could not deliver
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// The observer refused the notification (e.g. missing recipient)
    #[error("notification rejected: {0}")]
    Rejected(String),

    /// The observer panicked
    #[error("observer panicked: {0}")]
    Panicked(String),
}

/// Errors related to loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be parsed
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but is not usable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
