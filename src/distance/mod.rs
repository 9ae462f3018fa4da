//! Distance computation module providing both scalar and SIMD implementations.
//!
//! The public API automatically selects the fastest available implementation
//! based on CPU feature detection at runtime.

pub mod scalar;
pub mod simd;

// Re-export the auto-dispatching kernel as the primary API
pub use simd::euclidean_distance_squared;

use crate::error::{ForgeKnnError, Result};
use serde::{Deserialize, Serialize};

/// Supported distance metrics for similarity search.
///
/// An index is built with exactly one metric and keeps it for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Squared Euclidean distance: sum((a[i] - b[i])^2)
    /// Ranks identically to L2 but skips the sqrt.
    #[default]
    #[serde(alias = "l2")]
    EuclideanSquared,
}

impl DistanceMetric {
    /// Compute the distance between two vectors using this metric.
    ///
    /// This is the unchecked hot-path entry used by index scans after the
    /// query has been validated.
    ///
    /// # Panics
    /// Panics if the vectors have different dimensions.
    #[inline]
    pub fn compute(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::EuclideanSquared => euclidean_distance_squared(a, b),
        }
    }

    /// Compute the distance between two vectors, checking their dimensions.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if `a` and `b` differ in length.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(ForgeKnnError::dimension_mismatch(a.len(), b.len()));
        }
        Ok(self.compute(a, b))
    }

    /// Convert a distance produced by this metric to a true Euclidean distance.
    ///
    /// Needed only when comparing absolute magnitudes; rankings never need it.
    #[inline]
    pub fn to_euclidean(&self, distance: f32) -> f32 {
        match self {
            DistanceMetric::EuclideanSquared => distance.sqrt(),
        }
    }

    /// Short name used in logs and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::EuclideanSquared => "euclidean_squared",
        }
    }
}
