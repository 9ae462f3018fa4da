//! Query/evaluation harness.
//!
//! Runs labelled queries through an index with `k = 1`, checks the predicted
//! label against the expected one and accumulates accuracy and latency.
//! Only the `search` call is timed; normalizing the query is not.
//!
//! A failed search aborts the run. Counting it as a wrong guess would mix
//! "search failed" into the accuracy figure.

use crate::error::{ForgeKnnError, Result};
use crate::index::VectorIndex;
use crate::ingest::RawRow;
use crate::metrics::LatencyStats;
use crate::types::Label;
use std::time::{Duration, Instant};

/// What happened to one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOutcome {
    /// Zero-based position of the query in its input.
    pub index: usize,
    /// Ground-truth label.
    pub expected: Label,
    /// Label of the nearest stored record.
    pub predicted: Label,
    /// Wall time of the search call.
    pub latency: Duration,
}

impl QueryOutcome {
    pub fn is_correct(&self) -> bool {
        self.expected == self.predicted
    }
}

/// Aggregate result of an evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalReport {
    pub correct: u64,
    pub wrong: u64,
    pub latency: LatencyStats,
}

impl EvalReport {
    /// Fold one outcome into the report.
    pub fn record(&mut self, outcome: &QueryOutcome) {
        if outcome.is_correct() {
            self.correct += 1;
        } else {
            self.wrong += 1;
        }
        self.latency.record(outcome.latency);
    }

    /// Number of queries evaluated.
    pub fn total(&self) -> u64 {
        self.correct + self.wrong
    }

    /// Accuracy as an integer percentage, truncated toward zero.
    ///
    /// Zero when no queries were evaluated.
    pub fn accuracy_percent(&self) -> u64 {
        match self.total() {
            0 => 0,
            total => 100 * self.correct / total,
        }
    }

    /// Human-readable summary in whole milliseconds.
    pub fn summary(&self) -> String {
        format!(
            "Number of Correct guess = {}\n\
             Number of Wrong guess = {}\n\
             Accuracy = {}%\n\
             Vector Search Min Duration = {}ms\n\
             Vector Search Max Duration = {}ms\n\
             Vector Search Average Duration = {}ms",
            self.correct,
            self.wrong,
            self.accuracy_percent(),
            self.latency.min_ms(),
            self.latency.max_ms(),
            self.latency.avg_ms()
        )
    }
}

/// Drives evaluation queries through an index.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every query, calling `observer` after each one.
    ///
    /// # Errors
    ///
    /// Returns the first error from the query source or from `search`,
    /// including `EmptyIndex` when the corpus was never loaded.
    pub fn run<I, Q, F>(&self, index: &I, queries: Q, mut observer: F) -> Result<EvalReport>
    where
        I: VectorIndex + ?Sized,
        Q: IntoIterator<Item = Result<RawRow>>,
        F: FnMut(&QueryOutcome),
    {
        let mut report = EvalReport::default();

        for (i, query) in queries.into_iter().enumerate() {
            let query = query?;
            let embedding = query.embedding();

            let start = Instant::now();
            let results = index.search(&embedding, 1)?;
            let latency = start.elapsed();

            let nearest = results.first().ok_or(ForgeKnnError::EmptyIndex)?;

            let outcome = QueryOutcome {
                index: i,
                expected: query.label,
                predicted: nearest.neighbor_label,
                latency,
            };
            tracing::debug!(
                query = i,
                expected = %outcome.expected,
                predicted = %outcome.predicted,
                latency_us = latency.as_micros() as u64,
                "query evaluated"
            );

            report.record(&outcome);
            observer(&outcome);
        }

        tracing::info!(
            queries = report.total(),
            correct = report.correct,
            accuracy = report.accuracy_percent(),
            "evaluation complete"
        );
        Ok(report)
    }
}
