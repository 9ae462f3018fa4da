//! Index configuration.
//!
//! An [`IndexConfig`] is fixed when an index is built and cannot change
//! afterwards; rebuilding with other settings needs a fresh store and index.
//!
//! ```
//! use forge_knn::IndexConfig;
//!
//! let config = IndexConfig::new(784)
//!     .with_capacity_hint(60_000)
//!     .with_parallel_threshold(Some(20_000));
//! assert!(config.validate().is_ok());
//! ```

use crate::constants::{mnist, scan};
use crate::distance::DistanceMetric;
use crate::error::{ForgeKnnError, Result};
use serde::{Deserialize, Serialize};

/// Settings for building an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Length every stored and query vector must have.
    pub dimension: usize,

    /// Distance metric used for ranking.
    #[serde(default)]
    pub metric: DistanceMetric,

    /// Initial allocation hint for stores. Not a limit.
    #[serde(default = "default_capacity_hint")]
    pub capacity_hint: usize,

    /// Corpus size from which scans are split across worker threads.
    /// `None` keeps every scan on the calling thread.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: Option<usize>,
}

fn default_capacity_hint() -> usize {
    scan::DEFAULT_CAPACITY_HINT
}

fn default_parallel_threshold() -> Option<usize> {
    Some(scan::DEFAULT_PARALLEL_THRESHOLD)
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(mnist::DIMENSION)
    }
}

impl IndexConfig {
    /// Create a configuration for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            metric: DistanceMetric::default(),
            capacity_hint: default_capacity_hint(),
            parallel_threshold: default_parallel_threshold(),
        }
    }

    /// Set the distance metric.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the initial capacity hint.
    pub fn with_capacity_hint(mut self, capacity_hint: usize) -> Self {
        self.capacity_hint = capacity_hint;
        self
    }

    /// Set or clear the parallel scan threshold.
    pub fn with_parallel_threshold(mut self, threshold: Option<usize>) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the dimension is zero.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(ForgeKnnError::invalid_argument(
                "dimension must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Whether a corpus of `len` records should be scanned in parallel.
    pub fn scan_in_parallel(&self, len: usize) -> bool {
        match self.parallel_threshold {
            Some(threshold) if threshold > 0 => len >= threshold,
            _ => false,
        }
    }
}
