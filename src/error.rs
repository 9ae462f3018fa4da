//! Error types for forge-knn operations.
//!
//! Every fallible operation in the crate returns [`ForgeKnnError`]. The
//! variants are fine-grained so callers can report precise causes, while
//! [`ForgeKnnError::kind`] folds them into the four classes callers usually
//! branch on (see [`ErrorKind`]).

use std::io;
use thiserror::Error;

/// Result type alias using [`ForgeKnnError`].
pub type Result<T> = std::result::Result<T, ForgeKnnError>;

/// Coarse classification of a [`ForgeKnnError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A query or record did not have the configured dimension.
    DimensionMismatch,
    /// A caller-supplied argument or input row was invalid.
    InvalidArgument,
    /// A search was issued against a corpus with zero records.
    EmptyIndex,
    /// The backing store failed (I/O, corruption, capacity).
    BackendFailure,
}

/// Errors that can occur during forge-knn operations.
#[derive(Error, Debug)]
pub enum ForgeKnnError {
    /// Vector dimensions do not match the expected dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected vector dimension.
        expected: usize,
        /// Actual vector dimension provided.
        actual: usize,
    },

    /// Invalid argument value provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An input row could not be turned into a record.
    #[error("malformed row {row}: {reason}")]
    MalformedRow {
        /// Zero-based position of the row in its input.
        row: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Search against a corpus with no records.
    #[error("empty index: search requires at least one stored record")]
    EmptyIndex,

    /// I/O error from a persistent backend or input file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV decoding failed below the row level (encoding, framing).
    #[error("CSV error: {0}")]
    Csv(String),

    /// Error during serialization or deserialization of stored records.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Checksum verification failed while reading a stored record.
    #[error("checksum mismatch at byte offset {offset}: store may be corrupted")]
    ChecksumMismatch {
        /// File offset of the corrupt frame.
        offset: u64,
    },

    /// Store file has an invalid or unrecognized format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// The store refused an insert because it is full.
    #[error("capacity exceeded: store is limited to {limit} records")]
    CapacityExceeded {
        /// Maximum number of records the store accepts.
        limit: usize,
    },
}

impl ForgeKnnError {
    /// Creates a new `DimensionMismatch` error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates a new `InvalidArgument` error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a new `MalformedRow` error.
    pub fn malformed_row(row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            row,
            reason: reason.into(),
        }
    }

    /// Creates a new `SerializationError`.
    pub fn serialization_error(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Creates a new `InvalidFormat` error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::InvalidArgument(_) | Self::MalformedRow { .. } => ErrorKind::InvalidArgument,
            Self::EmptyIndex => ErrorKind::EmptyIndex,
            Self::Io(_)
            | Self::Csv(_)
            | Self::SerializationError(_)
            | Self::ChecksumMismatch { .. }
            | Self::InvalidFormat(_)
            | Self::CapacityExceeded { .. } => ErrorKind::BackendFailure,
        }
    }
}

impl From<bincode::Error> for ForgeKnnError {
    fn from(err: bincode::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for ForgeKnnError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io_err) => Self::Io(io_err),
                other => Self::Csv(format!("{:?}", other)),
            }
        } else {
            Self::Csv(err.to_string())
        }
    }
}
