//! Persistence tests for the file-backed store.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};

use forge_knn::store::FileHeader;
use forge_knn::{
    Dataset, ErrorKind, FileStore, FlatIndex, ForgeKnnError, IndexConfig, Ingestor, Label,
    MemoryStore, VectorId, VectorIndex, VectorRecord, VectorStore,
};

fn write_store(path: &std::path::Path, records: &[(u32, [f32; 2])]) {
    let mut store = FileStore::create(path, 2).unwrap();
    for (label, embedding) in records {
        store.insert(Label(*label), embedding).unwrap();
    }
    store.sync().unwrap();
}

#[test]
fn test_reopen_recovers_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.fknn");
    write_store(&path, &[(0, [0.0, 0.0]), (1, [10.0, 10.0]), (0, [0.1, 0.1])]);

    let mut store = FileStore::open(&path).unwrap();
    assert_eq!(store.dimension(), 2);
    assert_eq!(store.count(), 3);

    let records: Vec<VectorRecord> = store.scan().unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(records[1].id, VectorId(1));
    assert_eq!(records[1].label, Label(1));
    assert_eq!(&records[2].embedding[..], &[0.1, 0.1]);

    // Appends continue the id sequence.
    assert_eq!(store.insert(Label(1), &[5.0, 5.0]).unwrap(), VectorId(3));
    drop(store);

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.count(), 4);
}

#[test]
fn test_scan_sees_unsynced_inserts() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::create(dir.path().join("corpus.fknn"), 2).unwrap();
    store.insert(Label(4), &[1.0, 2.0]).unwrap();

    let records: Vec<VectorRecord> = store.scan().unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].label, Label(4));
}

#[test]
fn test_detects_flipped_byte() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.fknn");
    write_store(&path, &[(0, [0.0, 0.0]), (1, [10.0, 10.0])]);

    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    let len = file.metadata().unwrap().len();
    file.seek(SeekFrom::Start(len - 1)).unwrap();
    file.write_all(&[0xFF]).unwrap();
    drop(file);

    let err = FileStore::open(&path).unwrap_err();
    assert!(matches!(err, ForgeKnnError::ChecksumMismatch { .. }), "{}", err);
    assert_eq!(err.kind(), ErrorKind::BackendFailure);
}

#[test]
fn test_detects_truncation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.fknn");
    write_store(&path, &[(0, [0.0, 0.0]), (1, [10.0, 10.0])]);

    let file = OpenOptions::new().write(true).open(&path).unwrap();
    let len = file.metadata().unwrap().len();
    file.set_len(len - 3).unwrap();
    drop(file);

    let err = FileStore::open(&path).unwrap_err();
    assert!(matches!(err, ForgeKnnError::InvalidFormat(_)), "{}", err);
}

#[test]
fn test_rejects_foreign_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-a-store.bin");
    std::fs::write(&path, vec![0u8; FileHeader::SIZE]).unwrap();

    let err = FileStore::open(&path).unwrap_err();
    assert!(matches!(err, ForgeKnnError::InvalidFormat(_)), "{}", err);
}

#[test]
fn test_file_index_matches_memory_index() {
    let dataset = Dataset::synthetic(300, 20, 32, 10, 11);
    let config = IndexConfig::new(32).with_parallel_threshold(None);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.fknn");

    let mut file_index = FlatIndex::build(FileStore::create(&path, 32).unwrap(), config.clone())
        .unwrap();
    let mut memory_index = FlatIndex::build(MemoryStore::new(32), config.clone()).unwrap();

    let ingestor = Ingestor::new();
    ingestor
        .ingest(&mut file_index, dataset.train.iter().cloned().map(Ok))
        .unwrap();
    ingestor
        .ingest(&mut memory_index, dataset.train.iter().cloned().map(Ok))
        .unwrap();

    for query in &dataset.test {
        let embedding = query.embedding();
        assert_eq!(
            file_index.search(&embedding, 5).unwrap(),
            memory_index.search(&embedding, 5).unwrap()
        );
    }

    // A rebuilt index over the reopened file answers the same way.
    drop(file_index);
    let reopened = FlatIndex::build(FileStore::open(&path).unwrap(), config).unwrap();
    assert_eq!(reopened.len(), 300);
    let embedding = dataset.test[0].embedding();
    assert_eq!(
        reopened.search(&embedding, 3).unwrap(),
        memory_index.search(&embedding, 3).unwrap()
    );
}

#[test]
fn test_frames_larger_than_write_buffer() {
    // 4096 floats is 16 KiB per frame, past the default 8 KiB buffer.
    let dim = 4096;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.fknn");

    let mut store = FileStore::create(&path, dim).unwrap();
    let records: Vec<VectorRecord> = (0..3)
        .map(|i| VectorRecord::random(i, i as u32, dim))
        .collect();
    for record in &records {
        store.insert(record.label, &record.embedding).unwrap();
    }
    drop(store);

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.count(), 3);
    let reread: Vec<VectorRecord> = store.scan().unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(reread, records);
}

#[test]
fn test_reopened_non_finite_record_blocks_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.fknn");

    let mut store = FileStore::create(&path, 2).unwrap();
    store.insert(Label(0), &[0.0, 0.0]).unwrap();
    store.insert(Label(9), &[-f32::NAN, 0.0]).unwrap();
    drop(store);

    let result = FlatIndex::build(FileStore::open(&path).unwrap(), IndexConfig::new(2));
    let err = result.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
