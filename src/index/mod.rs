//! Index implementations for vector search.

pub mod flat;
pub mod traits;

pub use flat::FlatIndex;
pub use traits::{QueryResult, VectorIndex};
