//! Concurrent multi-file word counting with bounded parallelism.

use std::path::Path;
use std::time::Instant;

use log::{info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::cancel::CancelToken;
use crate::config::CountConfig;
use crate::error::{Result, TallyError};
use crate::metrics::RunMetrics;
use crate::processor::{count_file, WordCounts};
use crate::tokenizer::{StreamingTokenizer, WordTokenizer};

/// Factory signature used by [`WordCounter::new`].
pub type DefaultFactory = fn() -> Result<StreamingTokenizer>;

fn default_tokenizer() -> Result<StreamingTokenizer> {
    Ok(StreamingTokenizer::new())
}

/// High-level façade counting words across files.
///
/// Every file gets its own tokenizer from the factory; files are processed on a dedicated
/// thread pool sized by [`CountConfig::resolve_parallelism`].
#[derive(Debug, Clone)]
pub struct WordCounter<F = DefaultFactory> {
    cfg: CountConfig,
    make_tokenizer: F,
}

/// Final frequency table and per-file failures of a counting run.
///
/// Built once after every file has settled and never mutated afterwards.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct CountResult {
    counts: WordCounts,
    errors: Vec<String>,
    metrics: RunMetrics,
}

impl CountResult {
    /// Wraps an already merged table and error list.
    pub fn new(counts: WordCounts, errors: Vec<String>) -> Self {
        Self {
            counts,
            errors,
            metrics: RunMetrics::default(),
        }
    }

    /// Occurrences per lowercase word.
    #[must_use]
    pub fn counts(&self) -> &WordCounts {
        &self.counts
    }

    /// Occurrences of `word`, zero when absent.
    #[must_use]
    pub fn count_of(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Per-file failure descriptions in input order.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Returns `true` when at least one file could not be processed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of distinct words.
    #[must_use]
    pub fn unique_words(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all word occurrences.
    #[must_use]
    pub fn total_occurrences(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Batch statistics.
    #[must_use]
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }
}

/// Partial result produced per file and merged pairwise.
#[derive(Default)]
struct Batch {
    counts: WordCounts,
    errors: Vec<String>,
    metrics: RunMetrics,
}

impl Batch {
    fn merge(mut self, mut other: Self) -> Self {
        if self.counts.len() < other.counts.len() {
            std::mem::swap(&mut self.counts, &mut other.counts);
        }
        for (word, count) in other.counts {
            *self.counts.entry(word).or_insert(0) += count;
        }
        self.errors.append(&mut other.errors);
        self.metrics.merge(&other.metrics);
        self
    }
}

impl WordCounter {
    /// Creates a counter using [`StreamingTokenizer`] for every file.
    #[must_use]
    pub fn new(cfg: CountConfig) -> Self {
        Self {
            cfg,
            make_tokenizer: default_tokenizer,
        }
    }
}

impl<F, T> WordCounter<F>
where
    F: Fn() -> Result<T> + Sync,
    T: WordTokenizer,
{
    /// Replaces the tokenizer factory. It is invoked exactly once per processed file.
    #[must_use]
    pub fn with_tokenizer_factory<G, U>(self, make_tokenizer: G) -> WordCounter<G>
    where
        G: Fn() -> Result<U> + Sync,
        U: WordTokenizer,
    {
        WordCounter {
            cfg: self.cfg,
            make_tokenizer,
        }
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &CountConfig {
        &self.cfg
    }

    /// Counts words across `paths`, recording per-file failures in the result.
    pub fn count_files<P>(&self, paths: &[P]) -> Result<CountResult>
    where
        P: AsRef<Path> + Sync,
    {
        self.count_files_with_cancel(paths, &CancelToken::new())
    }

    /// Like [`WordCounter::count_files`], aborting with [`TallyError::Cancelled`] once `cancel`
    /// fires.
    ///
    /// Paths are assumed to name existing files; failures to open, read, or decode one file are
    /// recorded and never affect the others.
    pub fn count_files_with_cancel<P>(
        &self,
        paths: &[P],
        cancel: &CancelToken,
    ) -> Result<CountResult>
    where
        P: AsRef<Path> + Sync,
    {
        self.cfg.validate()?;
        let parallelism = self.cfg.resolve_parallelism(paths.len());
        let pool = ThreadPoolBuilder::new()
            .num_threads(parallelism)
            .thread_name(|index| format!("wordtally-{index}"))
            .build()
            .map_err(|err| TallyError::Internal(format!("unable to build thread pool: {err}")))?;

        let start = Instant::now();
        let batch = pool.install(|| {
            paths
                .par_iter()
                .map(|path| self.count_one(path.as_ref(), cancel))
                .try_reduce(Batch::default, |acc, local| Ok(acc.merge(local)))
        })?;

        let mut metrics = batch.metrics;
        metrics.elapsed = start.elapsed();
        info!(
            "counted {} files ({} failed) with {} workers: \
             {} words, {} unique, {:.2?}, {:.2} MiB/s",
            metrics.files,
            metrics.failed,
            parallelism,
            metrics.words,
            batch.counts.len(),
            metrics.elapsed,
            metrics.throughput_mib_s()
        );
        Ok(CountResult {
            counts: batch.counts,
            errors: batch.errors,
            metrics,
        })
    }

    fn count_one(&self, path: &Path, cancel: &CancelToken) -> Result<Batch> {
        let mut batch = Batch::default();
        match count_file(path, &self.cfg, &self.make_tokenizer, cancel) {
            Ok(tally) => {
                batch.metrics.record_file(&tally.metrics);
                batch.counts = tally.counts;
            }
            Err(TallyError::Cancelled) => return Err(TallyError::Cancelled),
            Err(err) => {
                let message = format!("Error processing file {}: {}", path.display(), cause(&err));
                warn!("{message}");
                batch.errors.push(message);
                batch.metrics.record_failure();
            }
        }
        Ok(batch)
    }
}

fn cause(err: &TallyError) -> String {
    match err {
        TallyError::Io { source, .. } => source.to_string(),
        TallyError::Decode {
            offset, encoding, ..
        } => format!("invalid {encoding} data at byte offset {offset}"),
        other => other.to_string(),
    }
}
