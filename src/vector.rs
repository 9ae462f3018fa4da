use crate::types::{Label, VectorId};
use rand::Rng;
use std::sync::Arc;

/// A stored record: an embedding, its label and the ID its store assigned.
/// The embedding is stored in an Arc for cheap cloning out of a scan.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorRecord {
    pub id: VectorId,
    pub label: Label,
    pub embedding: Arc<[f32]>,
}

impl VectorRecord {
    /// Create a new record with the given ID, label and embedding.
    pub fn new(id: VectorId, label: Label, embedding: impl Into<Arc<[f32]>>) -> Self {
        Self {
            id,
            label,
            embedding: embedding.into(),
        }
    }

    /// Create a record with values uniformly distributed in [0.0, 1.0).
    pub fn random(id: u64, label: u32, dim: usize) -> Self {
        let mut rng = rand::thread_rng();
        let data: Vec<f32> = (0..dim).map(|_| rng.gen_range(0.0..1.0)).collect();
        Self::new(VectorId(id), Label(label), data)
    }

    /// Return the dimensionality of this record's embedding.
    pub fn dim(&self) -> usize {
        self.embedding.len()
    }
}
