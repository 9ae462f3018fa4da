//! Flat index for exact nearest neighbor search.
//!
//! Every query is compared against every stored record. A bounded max-heap
//! keeps the k best candidates seen so far, so a search is one pass over the
//! store with O(k) extra memory.

use super::traits::{check_finite, check_search_args, QueryResult, VectorIndex};
use crate::config::IndexConfig;
use crate::constants::scan::PARALLEL_CHUNK_SIZE;
use crate::error::{ForgeKnnError, Result};
use crate::metrics::SearchStatistics;
use crate::store::{MemoryStore, VectorStore};
use crate::types::{Label, VectorId};
use crate::vector::VectorRecord;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

/// A candidate neighbor, ordered by (distance, id).
#[derive(Clone, Copy, Debug)]
struct Candidate {
    distance: f32,
    id: VectorId,
    label: Label,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so peek() gives the current worst:
        // largest distance, then largest (latest inserted) id.
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// The k best candidates seen so far.
struct TopK {
    k: usize,
    heap: BinaryHeap<Candidate>,
}

impl TopK {
    fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k),
        }
    }

    #[inline]
    fn offer(&mut self, candidate: Candidate) {
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }

    fn merge(mut self, other: TopK) -> Self {
        for candidate in other.heap {
            self.offer(candidate);
        }
        self
    }

    fn into_results(self) -> Vec<QueryResult> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .enumerate()
            .map(|(i, c)| QueryResult {
                neighbor_id: c.id,
                neighbor_label: c.label,
                distance: c.distance,
                rank: i + 1,
            })
            .collect()
    }
}

/// Exact index that scans the whole store for every query.
///
/// Results are deterministic for a fixed corpus: distance ties go to the
/// record inserted first.
pub struct FlatIndex<S = MemoryStore> {
    store: S,
    config: IndexConfig,
}

impl FlatIndex<MemoryStore> {
    /// Create an empty index over a fresh in-memory store.
    pub fn in_memory(config: IndexConfig) -> Result<Self> {
        let store = MemoryStore::with_capacity(config.dimension, config.capacity_hint);
        Self::build(store, config)
    }
}

impl<S: VectorStore> FlatIndex<S> {
    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the index and return its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Search and report how the scan went.
    pub fn search_with_stats(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<(Vec<QueryResult>, SearchStatistics)> {
        let start = Instant::now();
        check_search_args(query, k, self.config.dimension, self.store.count())?;

        let (top, partitions) = self.scan_top_k(query, k)?;
        let stats = SearchStatistics {
            query_time: start.elapsed(),
            vectors_scanned: self.store.count(),
            partitions_scanned: partitions,
        };
        Ok((top.into_results(), stats))
    }

    /// Search many queries concurrently.
    ///
    /// Results come back in query order. The first failing query fails the
    /// whole batch.
    pub fn batch_search(
        &self,
        queries: &[Vec<f32>],
        k: usize,
    ) -> Result<Vec<Vec<QueryResult>>> {
        queries
            .par_iter()
            .map(|query| self.search(query, k))
            .collect()
    }

    /// Run the scan, choosing the sequential or partitioned path.
    /// Returns the candidates and the number of partitions used.
    fn scan_top_k(&self, query: &[f32], k: usize) -> Result<(TopK, usize)> {
        match self.store.as_slice() {
            Some(records) if self.config.scan_in_parallel(records.len()) => {
                Ok(self.scan_parallel(records, query, k))
            }
            Some(records) => Ok((self.scan_slice(records, query, k), 1)),
            None => Ok((self.scan_store(query, k)?, 1)),
        }
    }

    fn scan_slice(&self, records: &[VectorRecord], query: &[f32], k: usize) -> TopK {
        let mut top = TopK::new(k);
        for record in records {
            top.offer(self.score(query, record));
        }
        top
    }

    /// Partition the corpus into fixed chunks, take a local top-k per chunk
    /// and merge. The (distance, id) order makes the merge exact, so the
    /// result equals the sequential scan.
    fn scan_parallel(
        &self,
        records: &[VectorRecord],
        query: &[f32],
        k: usize,
    ) -> (TopK, usize) {
        let partitions = records.len().div_ceil(PARALLEL_CHUNK_SIZE);
        let top = records
            .par_chunks(PARALLEL_CHUNK_SIZE)
            .map(|chunk| self.scan_slice(chunk, query, k))
            .reduce(|| TopK::new(k), TopK::merge);
        (top, partitions)
    }

    fn scan_store(&self, query: &[f32], k: usize) -> Result<TopK> {
        let mut top = TopK::new(k);
        for record in self.store.scan()? {
            let record = record?;
            top.offer(self.score(query, &record));
        }
        Ok(top)
    }

    #[inline]
    fn score(&self, query: &[f32], record: &VectorRecord) -> Candidate {
        Candidate {
            distance: self.config.metric.compute(query, &record.embedding),
            id: record.id,
            label: record.label,
        }
    }
}

impl<S: VectorStore> VectorIndex for FlatIndex<S> {
    type Store = S;

    fn build(store: S, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        if store.dimension() != config.dimension {
            return Err(ForgeKnnError::dimension_mismatch(
                config.dimension,
                store.dimension(),
            ));
        }

        for record in store.scan()? {
            let record = record?;
            if record.dim() != config.dimension {
                return Err(ForgeKnnError::dimension_mismatch(
                    config.dimension,
                    record.dim(),
                ));
            }
            check_finite(&record.embedding)?;
        }

        tracing::info!(
            dimension = config.dimension,
            metric = config.metric.name(),
            records = store.count(),
            "built flat index"
        );

        Ok(Self { store, config })
    }

    fn insert(&mut self, label: Label, embedding: &[f32]) -> Result<VectorId> {
        if embedding.len() != self.config.dimension {
            return Err(ForgeKnnError::dimension_mismatch(
                self.config.dimension,
                embedding.len(),
            ));
        }
        check_finite(embedding)?;
        self.store.insert(label, embedding)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>> {
        check_search_args(query, k, self.config.dimension, self.store.count())?;
        let (top, _) = self.scan_top_k(query, k)?;
        Ok(top.into_results())
    }

    fn len(&self) -> usize {
        self.store.count()
    }

    fn config(&self) -> &IndexConfig {
        &self.config
    }
}
