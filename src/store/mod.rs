//! Vector stores: the append-only corpus an index searches.
//!
//! A store is a capability, not a database client. The index only needs
//! [`VectorStore::insert`], [`VectorStore::scan`] and [`VectorStore::count`],
//! so records can live in memory ([`MemoryStore`]) or in an append-only file
//! ([`FileStore`]) without the index knowing which.
//!
//! Stores never retry. A backend failure is returned to the caller as-is,
//! and retry policy stays with whoever orchestrates the run.

mod file;
mod format;
mod memory;

pub use file::FileStore;
pub use format::{FileHeader, FORMAT_VERSION, MAGIC};
pub use memory::MemoryStore;

use crate::error::{ForgeKnnError, Result};
use crate::types::{Label, VectorId};
use crate::vector::VectorRecord;

/// A lazy pass over every record of a store, in insertion order.
///
/// Finite, and restartable by calling [`VectorStore::scan`] again.
pub type Scan<'a> = Box<dyn Iterator<Item = Result<VectorRecord>> + Send + 'a>;

/// Append-only storage for fixed-dimension labelled vectors.
pub trait VectorStore: Send + Sync {
    /// Length every embedding in this store has.
    fn dimension(&self) -> usize;

    /// Append a record and return the ID assigned to it.
    ///
    /// IDs are assigned in insertion order starting at 0.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the embedding has the wrong length,
    /// or a backend error (I/O, capacity) if the record could not be stored.
    fn insert(&mut self, label: Label, embedding: &[f32]) -> Result<VectorId>;

    /// Iterate over every stored record in insertion order.
    fn scan(&self) -> Result<Scan<'_>>;

    /// Number of stored records.
    fn count(&self) -> usize;

    /// Contiguous view of all records, if the backend keeps one.
    ///
    /// Enables partitioned parallel scans. Defaults to `None`.
    fn as_slice(&self) -> Option<&[VectorRecord]> {
        None
    }
}

/// Reject embeddings whose length differs from the store's dimension.
pub(crate) fn check_dimension(expected: usize, embedding: &[f32]) -> Result<()> {
    if embedding.len() != expected {
        return Err(ForgeKnnError::dimension_mismatch(expected, embedding.len()));
    }
    Ok(())
}
