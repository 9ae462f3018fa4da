//! forge-knn command-line front end.
//!
//! Loads a labelled training CSV into a flat index, then classifies every row
//! of a test CSV by its nearest neighbor and prints the report.
//!
//! ```bash
//! forge-knn --train mnist_train.csv --test mnist_test.csv
//!
//! # Persist the corpus, then reuse it without re-ingesting
//! forge-knn --store file --store-path mnist.fknn --train mnist_train.csv --test mnist_test.csv
//! forge-knn --store file --store-path mnist.fknn --test mnist_test.csv
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use forge_knn::constants::mnist::DIMENSION;
use forge_knn::{
    CsvRows, Evaluator, FileStore, FlatIndex, IndexConfig, Ingestor, VectorIndex, VectorStore,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// Keep the corpus in memory.
    Memory,
    /// Persist the corpus to `--store-path`.
    File,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Exact nearest-neighbor classifier", long_about = None)]
struct Args {
    /// Training CSV (`label,p1,...,pD`). Optional when reopening a file store.
    #[arg(long, env = "FORGE_KNN_TRAIN", value_name = "FILE")]
    train: Option<PathBuf>,

    /// Test CSV to classify.
    #[arg(long, env = "FORGE_KNN_TEST", value_name = "FILE")]
    test: PathBuf,

    /// Embedding dimension (number of intensity columns).
    #[arg(long, env = "FORGE_KNN_DIMENSION", default_value_t = DIMENSION)]
    dimension: usize,

    /// Storage backend.
    #[arg(long, env = "FORGE_KNN_STORE", value_enum, default_value_t = StoreKind::Memory)]
    store: StoreKind,

    /// Store file for `--store file`.
    #[arg(long, env = "FORGE_KNN_STORE_PATH", value_name = "FILE")]
    store_path: Option<PathBuf>,

    /// Input files start with a header row.
    #[arg(long, env = "FORGE_KNN_HAS_HEADERS")]
    has_headers: bool,

    /// Scan in parallel once the corpus holds this many records (0 = never).
    #[arg(long, env = "FORGE_KNN_PARALLEL_THRESHOLD")]
    parallel_threshold: Option<usize>,

    /// Only evaluate the first N test rows.
    #[arg(long, env = "FORGE_KNN_LIMIT")]
    limit: Option<usize>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, env = "FORGE_KNN_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .compact()
        .init();

    let mut config = IndexConfig::new(args.dimension);
    if let Some(threshold) = args.parallel_threshold {
        config = config.with_parallel_threshold(Some(threshold));
    }

    match args.store {
        StoreKind::Memory => {
            let Some(train) = &args.train else {
                bail!("--train is required with the memory store");
            };
            let mut index = FlatIndex::in_memory(config).context("failed to create index")?;
            ingest(&mut index, train, &args)?;
            evaluate(&index, &args)
        }
        StoreKind::File => {
            let Some(path) = &args.store_path else {
                bail!("--store-path is required with the file store");
            };
            match &args.train {
                Some(train) => {
                    let store = FileStore::create(path, args.dimension).with_context(|| {
                        format!("failed to create store at {}", path.display())
                    })?;
                    let mut index = FlatIndex::build(store, config)?;
                    ingest(&mut index, train, &args)?;
                    index.store().sync().context("failed to sync store")?;
                    evaluate(&index, &args)
                }
                None => {
                    let store = FileStore::open(path)
                        .with_context(|| format!("failed to open store at {}", path.display()))?;
                    if store.dimension() != args.dimension {
                        bail!(
                            "store at {} has dimension {}, expected {}",
                            path.display(),
                            store.dimension(),
                            args.dimension
                        );
                    }
                    let index = FlatIndex::build(store, config)?;
                    evaluate(&index, &args)
                }
            }
        }
    }
}

fn ingest<I: VectorIndex>(index: &mut I, train: &Path, args: &Args) -> Result<()> {
    let rows = CsvRows::from_path(train, args.dimension, args.has_headers)
        .with_context(|| format!("failed to open {}", train.display()))?;
    let summary = Ingestor::new()
        .ingest(index, rows)
        .with_context(|| format!("failed to ingest {}", train.display()))?;

    tracing::info!(
        rows = summary.rows,
        rows_per_sec = summary.throughput() as u64,
        "training set loaded"
    );
    Ok(())
}

fn evaluate<I: VectorIndex>(index: &I, args: &Args) -> Result<()> {
    let rows = CsvRows::from_path(&args.test, args.dimension, args.has_headers)
        .with_context(|| format!("failed to open {}", args.test.display()))?;
    let queries = rows.take(args.limit.unwrap_or(usize::MAX));

    let report = Evaluator::new()
        .run(index, queries, |outcome| {
            println!(
                "Test image {}: expected = {}, found = {} in {}ms",
                outcome.index,
                outcome.expected,
                outcome.predicted,
                outcome.latency.as_millis()
            );
        })
        .with_context(|| format!("evaluation of {} failed", args.test.display()))?;

    println!("{}", report.summary());
    Ok(())
}
