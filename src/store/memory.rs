use super::{check_dimension, Scan, VectorStore};
use crate::error::{ForgeKnnError, Result};
use crate::types::{Label, VectorId};
use crate::vector::VectorRecord;

/// In-memory store backed by a contiguous `Vec`.
///
/// Record `i` has ID `i`, so the slice doubles as an ID-addressed table.
#[derive(Debug)]
pub struct MemoryStore {
    records: Vec<VectorRecord>,
    dimension: usize,
    max_records: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store for vectors of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self::with_capacity(dimension, 0)
    }

    /// Create an empty store with room for `capacity` records.
    pub fn with_capacity(dimension: usize, capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            dimension,
            max_records: None,
        }
    }

    /// Refuse inserts beyond `limit` records.
    pub fn with_max_records(mut self, limit: usize) -> Self {
        self.max_records = Some(limit);
        self
    }

    /// Look up a record by ID.
    pub fn get(&self, id: VectorId) -> Option<&VectorRecord> {
        usize::try_from(id.as_u64())
            .ok()
            .and_then(|i| self.records.get(i))
    }
}

impl VectorStore for MemoryStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn insert(&mut self, label: Label, embedding: &[f32]) -> Result<VectorId> {
        check_dimension(self.dimension, embedding)?;

        if let Some(limit) = self.max_records {
            if self.records.len() >= limit {
                return Err(ForgeKnnError::CapacityExceeded { limit });
            }
        }

        let id = VectorId(self.records.len() as u64);
        self.records
            .push(VectorRecord::new(id, label, embedding.to_vec()));
        Ok(id)
    }

    fn scan(&self) -> Result<Scan<'_>> {
        Ok(Box::new(self.records.iter().cloned().map(Ok)))
    }

    fn count(&self) -> usize {
        self.records.len()
    }

    fn as_slice(&self) -> Option<&[VectorRecord]> {
        Some(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut store = MemoryStore::new(2);
        assert_eq!(store.insert(Label(0), &[0.0, 0.0]).unwrap(), VectorId(0));
        assert_eq!(store.insert(Label(1), &[1.0, 1.0]).unwrap(), VectorId(1));
        assert_eq!(store.count(), 2);
        assert_eq!(store.get(VectorId(1)).unwrap().label, Label(1));
        assert!(store.get(VectorId(2)).is_none());
    }

    #[test]
    fn test_insert_rejects_wrong_dimension() {
        let mut store = MemoryStore::new(3);
        let err = store.insert(Label(0), &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            ForgeKnnError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_capacity_limit() {
        let mut store = MemoryStore::new(1).with_max_records(2);
        store.insert(Label(0), &[0.0]).unwrap();
        store.insert(Label(0), &[1.0]).unwrap();
        let err = store.insert(Label(0), &[2.0]).unwrap_err();
        assert!(matches!(err, ForgeKnnError::CapacityExceeded { limit: 2 }));
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_scan_is_ordered_and_restartable() {
        let mut store = MemoryStore::new(1);
        for i in 0..5 {
            store.insert(Label(i), &[i as f32]).unwrap();
        }

        for _ in 0..2 {
            let ids: Vec<u64> = store
                .scan()
                .unwrap()
                .map(|r| r.unwrap().id.as_u64())
                .collect();
            assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        }
        assert_eq!(store.as_slice().unwrap().len(), 5);
    }
}
