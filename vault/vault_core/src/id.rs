//! Strongly-typed identifiers for pooled resources.
//!
//! Resources are numbered in creation order starting at one. The
//! identifier is a thin wrapper around a `u64` so that a box number can
//! never be confused with a count or a capacity.
//!
//! # Examples
//!
//! ```
//! use vault_core::id::ResourceId;
//! use std::str::FromStr;
//!
//! let first = ResourceId::FIRST;
//! assert_eq!(first.get(), 1);
//! assert_eq!(first.next(), ResourceId::new(2));
//!
//! // Both the display form and the bare number parse
//! assert_eq!(ResourceId::from_str("box-7").unwrap(), ResourceId::new(7));
//! assert_eq!(ResourceId::from_str("7").unwrap(), ResourceId::new(7));
//! assert_eq!(first.to_string(), "box-1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix used when displaying a resource identifier.
const DISPLAY_PREFIX: &str = "box-";

/// Identifier of a single pooled resource.
///
/// Identifiers are assigned once, when the resource is created, and never
/// change afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(u64);

impl ResourceId {
    /// The identifier given to the first resource a pool creates.
    pub const FIRST: ResourceId = ResourceId(1);

    /// Wrap a raw resource number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw resource number.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one in creation order.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", DISPLAY_PREFIX, self.0)
    }
}

impl From<u64> for ResourceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Error returned when a string is not a valid resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resource id: {0:?}")]
pub struct ParseResourceIdError(String);

impl FromStr for ResourceId {
    type Err = ParseResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(DISPLAY_PREFIX).unwrap_or(trimmed);
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseResourceIdError(s.to_string()))
    }
}
