//! Named constants for configuration values.
//!
//! This module centralizes magic numbers and default values used throughout
//! the codebase, making them easier to find, document, and tune.

/// Constants describing the MNIST reference dataset.
pub mod mnist {
    /// Pixels per image (28 x 28).
    pub const DIMENSION: usize = 784;

    /// Number of digit classes.
    pub const NUM_CLASSES: usize = 10;

    /// Rows in the MNIST training split.
    pub const TRAIN_ROWS: usize = 60_000;
}

/// Constants for input normalization.
pub mod ingest {
    /// Largest raw intensity value; raw values are divided by this.
    pub const MAX_INTENSITY: u8 = 255;

    /// Rows between progress log lines during ingestion.
    pub const PROGRESS_INTERVAL: usize = 10_000;
}

/// Constants for the flat index scan.
pub mod scan {
    /// Chunk size for parallel scans.
    /// Each chunk is scanned by a single worker.
    pub const PARALLEL_CHUNK_SIZE: usize = 1000;

    /// Corpus size at which a scan is split across worker threads by default.
    pub const DEFAULT_PARALLEL_THRESHOLD: usize = 20_000;

    /// Default initial capacity hint for stores.
    pub const DEFAULT_CAPACITY_HINT: usize = 1024;
}

/// Constants for the on-disk store format.
pub mod file_store {
    /// Bytes per frame prefix (length u32 + crc32 u32).
    pub const FRAME_PREFIX_SIZE: usize = 8;

    /// Upper bound on a single encoded frame, guards against corrupt lengths.
    pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mnist_constants() {
        assert_eq!(mnist::DIMENSION, 28 * 28);
        assert_eq!(mnist::TRAIN_ROWS % mnist::NUM_CLASSES, 0);
    }

    #[test]
    fn test_parallel_threshold_exceeds_chunk() {
        assert!(scan::DEFAULT_PARALLEL_THRESHOLD > scan::PARALLEL_CHUNK_SIZE);
    }
}
