//! forge-knn: exact nearest-neighbor classification in Rust.
//!
//! This crate stores labelled, fixed-dimension embeddings and answers top-k
//! queries by scanning every stored record under squared Euclidean distance.
//! A query's predicted class is the label of its nearest neighbor.
//!
//! # Features
//!
//! - **SIMD Distance Functions**: AVX2/FMA and NEON squared L2 with scalar fallback
//! - **Exact Flat Index**: Full scan, deterministic ties (lowest id wins)
//! - **Parallel Search**: Chunked scan with Rayon for large corpora
//! - **Pluggable Storage**: In-memory or checksummed append-only file store
//! - **Ingestion and Evaluation**: CSV rows in, accuracy and latency out
//!
//! # Example
//!
//! ```
//! use forge_knn::{FlatIndex, IndexConfig, Label, VectorIndex};
//!
//! let mut index = FlatIndex::in_memory(IndexConfig::new(2)).unwrap();
//! index.insert(Label(0), &[0.0, 0.0]).unwrap();
//! index.insert(Label(1), &[10.0, 10.0]).unwrap();
//!
//! let results = index.search(&[9.0, 9.0], 1).unwrap();
//! assert_eq!(results[0].neighbor_label, Label(1));
//! assert_eq!(results[0].distance, 2.0);
//! ```

pub mod config;
pub mod constants;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod eval;
pub mod index;
pub mod ingest;
pub mod metrics;
pub mod store;
pub mod types;
pub mod vector;

// Re-export commonly used types at crate root
pub use config::IndexConfig;
pub use dataset::{CsvRows, Dataset};
pub use distance::DistanceMetric;
pub use error::{ErrorKind, ForgeKnnError, Result};
pub use eval::{EvalReport, Evaluator, QueryOutcome};
pub use index::{FlatIndex, QueryResult, VectorIndex};
pub use ingest::{normalize, IngestSummary, Ingestor, RawRow};
pub use metrics::{LatencyStats, SearchStatistics};
pub use store::{FileStore, MemoryStore, VectorStore};
pub use types::{Label, VectorId};
pub use vector::VectorRecord;
