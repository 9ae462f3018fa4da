//! Common traits for vector index implementations.
//!
//! Ingestion and evaluation are written against [`VectorIndex`], so an
//! approximate strategy can replace the exact scan without touching them.

use crate::config::IndexConfig;
use crate::error::{ForgeKnnError, Result};
use crate::store::VectorStore;
use crate::types::{Label, VectorId};

/// One neighbor returned by a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryResult {
    /// ID of the matched record.
    pub neighbor_id: VectorId,
    /// Label of the matched record.
    pub neighbor_label: Label,
    /// Distance from the query under the index metric.
    pub distance: f32,
    /// 1 for the closest neighbor, 2 for the next, and so on.
    pub rank: usize,
}

/// Common interface for vector indices.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. `search` takes `&self` and may be
/// called from many threads at once; `insert` takes `&mut self`, so ingestion
/// and querying can never overlap on one index.
pub trait VectorIndex: Send + Sync {
    /// Backing store type.
    type Store: VectorStore;

    /// Build an index over `store` with a fixed configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unusable configuration, and
    /// `DimensionMismatch` if the store or any record in it has a dimension
    /// other than `config.dimension`.
    fn build(store: Self::Store, config: IndexConfig) -> Result<Self>
    where
        Self: Sized;

    /// Store a new record through the index.
    fn insert(&mut self, label: Label, embedding: &[f32]) -> Result<VectorId>;

    /// Search for the k nearest records to the query vector.
    ///
    /// Returns `min(k, len())` results sorted closest first; equal distances
    /// are ordered by ascending ID.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `k == 0`, `DimensionMismatch` if the query has
    /// the wrong length, `EmptyIndex` if nothing is stored, and any backend
    /// error raised while reading the store.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>>;

    /// Return the number of records in the index.
    fn len(&self) -> usize;

    /// Return true if the index contains no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the dimensionality of records in this index.
    fn dimension(&self) -> usize {
        self.config().dimension
    }

    /// Return the configuration the index was built with.
    fn config(&self) -> &IndexConfig;
}

/// Argument checks shared by every search strategy, in reporting order.
pub(crate) fn check_search_args(
    query: &[f32],
    k: usize,
    dimension: usize,
    len: usize,
) -> Result<()> {
    if k == 0 {
        return Err(ForgeKnnError::invalid_argument("k must be at least 1"));
    }
    if query.len() != dimension {
        return Err(ForgeKnnError::dimension_mismatch(dimension, query.len()));
    }
    check_finite(query)?;
    if len == 0 {
        return Err(ForgeKnnError::EmptyIndex);
    }
    Ok(())
}

/// Reject NaN and infinite components.
pub(crate) fn check_finite(vector: &[f32]) -> Result<()> {
    match vector.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ForgeKnnError::invalid_argument(format!(
            "non-finite value {} at index {}",
            vector[i], i
        ))),
        None => Ok(()),
    }
}
