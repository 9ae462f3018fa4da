//! Ingestion: raw labelled rows in, normalized records stored.
//!
//! A raw row is a label followed by `dimension` integer intensities in
//! `0..=255`. Normalization divides each intensity by 255, so the stored
//! embedding lies in `[0, 1]` and a zero intensity is exactly `0.0`.
//!
//! Ingestion is all-or-nothing from the caller's point of view: the first
//! bad row aborts the run and is reported with its position, rather than
//! being skipped and leaving a silently smaller corpus.

use crate::constants::ingest::{MAX_INTENSITY, PROGRESS_INTERVAL};
use crate::error::{ForgeKnnError, Result};
use crate::index::VectorIndex;
use crate::types::Label;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// One unnormalized input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub label: Label,
    pub pixels: Vec<u8>,
}

impl RawRow {
    pub fn new(label: impl Into<Label>, pixels: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            pixels,
        }
    }

    /// Parse `label, p_1, ..., p_D` from already-split fields.
    ///
    /// `row` is only used to label errors.
    ///
    /// # Errors
    ///
    /// `MalformedRow` if the field count is not `dimension + 1`, or any field
    /// is not a non-negative integer, or an intensity exceeds 255.
    pub fn parse<'a, I>(row: usize, fields: I, dimension: usize) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields = fields.into_iter();

        let label_field = fields
            .next()
            .ok_or_else(|| ForgeKnnError::malformed_row(row, "empty row"))?;
        let label = label_field.trim().parse::<u32>().map_err(|_| {
            ForgeKnnError::malformed_row(
                row,
                format!("label {:?} is not a non-negative integer", label_field),
            )
        })?;

        let mut pixels = Vec::with_capacity(dimension);
        for (i, field) in fields.enumerate() {
            if i >= dimension {
                return Err(ForgeKnnError::malformed_row(
                    row,
                    format!("expected {} intensity fields, found more", dimension),
                ));
            }
            pixels.push(parse_intensity(row, i, field)?);
        }

        if pixels.len() != dimension {
            return Err(ForgeKnnError::malformed_row(
                row,
                format!(
                    "expected {} intensity fields, found {}",
                    dimension,
                    pixels.len()
                ),
            ));
        }

        Ok(Self::new(label, pixels))
    }

    /// Normalized embedding for this row.
    pub fn embedding(&self) -> Vec<f32> {
        normalize(&self.pixels)
    }
}

fn parse_intensity(row: usize, column: usize, field: &str) -> Result<u8> {
    let value = field.trim().parse::<u32>().map_err(|_| {
        ForgeKnnError::malformed_row(
            row,
            format!("intensity {} ({:?}) is not a non-negative integer", column, field),
        )
    })?;
    u8::try_from(value).map_err(|_| {
        ForgeKnnError::malformed_row(
            row,
            format!("intensity {} is {}, above {}", column, value, MAX_INTENSITY),
        )
    })
}

/// Scale raw intensities into `[0, 1]`.
#[inline]
pub fn normalize(pixels: &[u8]) -> Vec<f32> {
    let max = MAX_INTENSITY as f32;
    pixels.iter().map(|&p| p as f32 / max).collect()
}

/// Outcome of a completed ingestion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestSummary {
    /// Rows stored.
    pub rows: usize,
    /// Rows stored per label.
    pub label_counts: BTreeMap<Label, usize>,
    /// Wall time spent ingesting.
    pub elapsed: Duration,
}

impl IngestSummary {
    /// Rows per second over the whole run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.rows as f64 / secs
    }
}

/// Normalizes rows and loads them through an index's insert path.
#[derive(Debug, Clone)]
pub struct Ingestor {
    progress_interval: usize,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self {
            progress_interval: PROGRESS_INTERVAL,
        }
    }
}

impl Ingestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log progress every `interval` rows (0 disables progress logging).
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Insert every row into `index`, stopping at the first error.
    ///
    /// Rows inserted before a failure stay in the store; the error tells the
    /// caller the corpus is incomplete and must not be queried.
    pub fn ingest<I, R>(&self, index: &mut I, rows: R) -> Result<IngestSummary>
    where
        I: VectorIndex + ?Sized,
        R: IntoIterator<Item = Result<RawRow>>,
    {
        let start = Instant::now();
        let mut summary = IngestSummary::default();

        for (n, row) in rows.into_iter().enumerate() {
            let row = row?;
            if row.pixels.len() != index.dimension() {
                return Err(ForgeKnnError::malformed_row(
                    n,
                    format!(
                        "expected {} intensity fields, found {}",
                        index.dimension(),
                        row.pixels.len()
                    ),
                ));
            }

            index.insert(row.label, &row.embedding())?;
            *summary.label_counts.entry(row.label).or_insert(0) += 1;
            summary.rows += 1;

            if self.progress_interval > 0 && summary.rows % self.progress_interval == 0 {
                tracing::debug!(rows = summary.rows, "ingest progress");
            }
        }

        summary.elapsed = start.elapsed();
        tracing::info!(
            rows = summary.rows,
            labels = summary.label_counts.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "ingestion complete"
        );
        Ok(summary)
    }
}
