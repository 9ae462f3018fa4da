//! Dataset utilities: CSV row loading and synthetic labelled data.

use crate::error::Result;
use crate::ingest::RawRow;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Streaming reader over `label,p_1,...,p_D` CSV rows.
///
/// Yields one `Result<RawRow>` per data row. Row positions in errors are
/// zero-based and do not count a header line.
pub struct CsvRows<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    dimension: usize,
    row: usize,
}

impl CsvRows<File> {
    /// Open a CSV file.
    pub fn from_path(path: impl AsRef<Path>, dimension: usize, has_headers: bool) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .flexible(true)
            .from_path(path)?;
        Ok(Self::new(reader, dimension))
    }
}

impl<R: Read> CsvRows<R> {
    /// Read rows from any byte source.
    pub fn from_reader(reader: R, dimension: usize, has_headers: bool) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .flexible(true)
            .from_reader(reader);
        Self::new(reader, dimension)
    }

    fn new(reader: csv::Reader<R>, dimension: usize) -> Self {
        Self {
            records: reader.into_records(),
            dimension,
            row: 0,
        }
    }
}

impl<R: Read> Iterator for CsvRows<R> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        let row = self.row;
        self.row += 1;
        Some(
            record
                .map_err(Into::into)
                .and_then(|record| RawRow::parse(row, record.iter(), self.dimension)),
        )
    }
}

/// A labelled train/test split.
pub struct Dataset {
    pub train: Vec<RawRow>,
    pub test: Vec<RawRow>,
}

impl Dataset {
    /// Generate a synthetic, class-structured dataset.
    ///
    /// Each class gets a random prototype image; rows are the prototype with
    /// bounded per-pixel noise. Labels cycle `0, 1, ..., num_classes - 1`,
    /// so with `n_train` a multiple of `num_classes` every class appears
    /// equally often. The same seed always produces the same data.
    pub fn synthetic(
        n_train: usize,
        n_test: usize,
        dimension: usize,
        num_classes: usize,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let num_classes = num_classes.max(1);
        let prototypes: Vec<Vec<u8>> = (0..num_classes)
            .map(|_| (0..dimension).map(|_| rng.gen()).collect())
            .collect();

        let mut sample = |i: usize| {
            let class = i % num_classes;
            let pixels = prototypes[class]
                .iter()
                .map(|&p| {
                    let noise: i16 = rng.gen_range(-40..=40);
                    (p as i16 + noise).clamp(0, 255) as u8
                })
                .collect();
            RawRow::new(class as u32, pixels)
        };

        let train = (0..n_train).map(&mut sample).collect();
        let test = (0..n_test).map(&mut sample).collect();
        Self { train, test }
    }

    /// Uniformly random rows with no class structure.
    pub fn random_rows(n: usize, dimension: usize, num_classes: usize, seed: u64) -> Vec<RawRow> {
        let mut rng = StdRng::seed_from_u64(seed);
        let num_classes = num_classes.max(1);
        (0..n)
            .map(|i| {
                let pixels = (0..dimension).map(|_| rng.gen()).collect();
                RawRow::new((i % num_classes) as u32, pixels)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ForgeKnnError};
    use crate::types::Label;

    #[test]
    fn test_csv_rows() {
        let data = "5,0,0,255\n0,12,34,56\n";
        let rows: Vec<RawRow> = CsvRows::from_reader(data.as_bytes(), 3, false)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, Label(5));
        assert_eq!(rows[1].pixels, vec![12, 34, 56]);
    }

    #[test]
    fn test_csv_header_skipped() {
        let data = "label,1x1,1x2\n3,1,2\n";
        let rows: Vec<RawRow> = CsvRows::from_reader(data.as_bytes(), 2, true)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows, vec![RawRow::new(3u32, vec![1, 2])]);
    }

    #[test]
    fn test_csv_reports_bad_row_index() {
        let data = "1,1,1\n2,2\n3,3,3\n";
        let mut rows = CsvRows::from_reader(data.as_bytes(), 2, false);
        assert!(rows.next().unwrap().is_ok());
        let err = rows.next().unwrap().unwrap_err();
        assert!(matches!(err, ForgeKnnError::MalformedRow { row: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_synthetic_is_deterministic_and_balanced() {
        let a = Dataset::synthetic(100, 20, 16, 10, 7);
        let b = Dataset::synthetic(100, 20, 16, 10, 7);
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);

        for class in 0..10u32 {
            let count = a.train.iter().filter(|r| r.label == Label(class)).count();
            assert_eq!(count, 10);
        }
        assert!(a.train.iter().all(|r| r.pixels.len() == 16));
    }
}
