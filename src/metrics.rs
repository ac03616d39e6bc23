//! Counters describing how much input a run consumed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Statistics gathered while streaming a single file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMetrics {
    /// Raw bytes read from disk, byte order mark included.
    pub bytes_read: u64,
    /// Decoded characters handed to the tokenizer.
    pub chars_read: u64,
    /// Number of chunks the file was split into.
    pub chunks: u64,
    /// Words emitted by the tokenizer.
    pub words: u64,
}

/// Aggregate statistics for a batch of files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunMetrics {
    /// Files attempted, failures included.
    pub files: usize,
    /// Files whose processing was recorded as an error.
    pub failed: usize,
    /// Raw bytes read across all successfully processed files.
    pub bytes_read: u64,
    /// Words counted across all successfully processed files.
    pub words: u64,
    /// Wall-clock duration of the batch.
    pub elapsed: Duration,
}

impl RunMetrics {
    /// Folds the statistics of one successfully processed file into the batch.
    pub fn record_file(&mut self, file: &FileMetrics) {
        self.files += 1;
        self.bytes_read += file.bytes_read;
        self.words += file.words;
    }

    /// Records a file whose processing failed.
    pub fn record_failure(&mut self) {
        self.files += 1;
        self.failed += 1;
    }

    /// Combines two partial batches.
    pub fn merge(&mut self, other: &Self) {
        self.files += other.files;
        self.failed += other.failed;
        self.bytes_read += other.bytes_read;
        self.words += other.words;
    }

    /// Input throughput in MiB/s, or zero when no time elapsed.
    #[must_use]
    pub fn throughput_mib_s(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            bytes_to_mebibytes(self.bytes_read) / secs
        } else {
            0.0
        }
    }
}

/// Converts a byte count to mebibytes.
#[must_use]
pub fn bytes_to_mebibytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
