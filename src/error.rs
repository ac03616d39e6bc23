//! Error handling utilities shared across the crate.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::TextEncoding;

/// Convenient result type used throughout the crate.
pub type Result<T, E = TallyError> = std::result::Result<T, E>;

/// Domain-specific error describing failures during configuration, IO, decoding, or counting.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Counting configuration or inputs failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Filesystem IO error with optional context path.
    #[error("io error{}: {source}", location(.path))]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// The byte stream could not be decoded as text.
    #[error("invalid {encoding} data{} at byte offset {offset}", location(.path))]
    Decode {
        /// File being decoded when available.
        path: Option<PathBuf>,
        /// Absolute byte offset of the first undecodable byte.
        offset: u64,
        /// Encoding in effect when the failure occurred.
        encoding: TextEncoding,
    },
    /// A per-file tokenizer instance could not be created.
    #[error("tokenizer construction failed: {0}")]
    Tokenizer(String),
    /// Processing was aborted through a [`CancelToken`](crate::CancelToken).
    #[error("operation cancelled")]
    Cancelled,
    /// Catch-all variant for invariants that should not occur.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TallyError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }

    /// Returns `true` when the error signals external cancellation rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Attaches `path` to IO and decoding errors that were raised without one.
    #[must_use]
    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            Self::Io { source, path: None } => Self::Io {
                source,
                path: Some(path.to_path_buf()),
            },
            Self::Decode {
                path: None,
                offset,
                encoding,
            } => Self::Decode {
                path: Some(path.to_path_buf()),
                offset,
                encoding,
            },
            other => other,
        }
    }
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_deref()
        .map(|path| format!(" in {}", path.display()))
        .unwrap_or_default()
}
