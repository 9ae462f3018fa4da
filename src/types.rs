//! Core newtypes for type-safe index operations.
//!
//! These types provide compile-time guarantees that prevent mixing up
//! related but semantically different values (e.g., record IDs vs labels).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a record in a store.
///
/// Assigned by the store at insertion as a monotonic sequence number.
/// Lower IDs were inserted earlier and win distance ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct VectorId(pub u64);

impl VectorId {
    /// Create a new VectorId.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The ID following this one.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VectorId({})", self.0)
    }
}

impl From<u64> for VectorId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<VectorId> for u64 {
    #[inline]
    fn from(id: VectorId) -> Self {
        id.0
    }
}

/// The class label attached to a record at ingestion.
///
/// Digit class 0-9 for MNIST, but any non-negative integer is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Label(pub u32);

impl Label {
    /// Create a new Label.
    #[inline]
    pub const fn new(label: u32) -> Self {
        Self(label)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Label {
    #[inline]
    fn from(label: u32) -> Self {
        Self(label)
    }
}

impl From<Label> for u32 {
    #[inline]
    fn from(label: Label) -> Self {
        label.0
    }
}
