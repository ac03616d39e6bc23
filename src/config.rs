//! Configuration builders controlling how files are read and counted.

use std::env;
use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};

/// Default number of characters decoded per read.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
/// Largest accepted chunk size; read buffers are sized from it.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;
/// Initial capacity reserved for the pending word buffer of a tokenizer.
pub const INITIAL_WORD_CAPACITY: usize = 64;
/// Environment variable overriding [`CountConfig::chunk_size`].
pub const CHUNK_SIZE_ENV: &str = "WORDTALLY_CHUNK_SIZE";
/// Environment variable overriding [`CountConfig::max_parallelism`].
pub const MAX_PARALLELISM_ENV: &str = "WORDTALLY_MAX_PARALLELISM";

/// Text encodings understood by the file reader.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// Sniff a byte order mark and fall back to UTF-8.
    #[default]
    Auto,
    /// UTF-8, with an optional leading byte order mark.
    Utf8,
    /// Little-endian UTF-16.
    Utf16Le,
    /// Big-endian UTF-16.
    Utf16Be,
    /// Little-endian UTF-32.
    Utf32Le,
    /// Big-endian UTF-32.
    Utf32Be,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Utf32Le => "utf-32le",
            Self::Utf32Be => "utf-32be",
        };
        f.write_str(name)
    }
}

/// Configuration for a counting run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountConfig {
    /// Maximum number of characters handed to the tokenizer per read.
    pub chunk_size: usize,
    /// Upper bound on concurrently processed files; `None` derives it from the host.
    pub max_parallelism: Option<usize>,
    /// Encoding used to decode input files.
    pub encoding: TextEncoding,
    /// Fail a file on malformed input instead of substituting U+FFFD.
    #[serde(default)]
    pub strict_decoding: bool,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_parallelism: None,
            encoding: TextEncoding::Auto,
            strict_decoding: false,
        }
    }
}

impl CountConfig {
    /// Returns a builder initialised with [`CountConfig::default`].
    #[must_use]
    pub fn builder() -> CountBuilder {
        CountBuilder::default()
    }

    /// Builds a configuration from [`CHUNK_SIZE_ENV`] and [`MAX_PARALLELISM_ENV`].
    ///
    /// Unset, blank, unparsable, non-positive, and oversized values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let positive = |name: &str| {
            lookup(name)
                .and_then(|value| value.trim().parse::<usize>().ok())
                .filter(|&value| value > 0)
        };
        Self {
            chunk_size: positive(CHUNK_SIZE_ENV)
                .filter(|&value| value <= MAX_CHUNK_SIZE)
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            max_parallelism: positive(MAX_PARALLELISM_ENV),
            ..Self::default()
        }
    }

    /// Validates the invariants required for counting.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(TallyError::InvalidConfig(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(TallyError::InvalidConfig(format!(
                "chunk_size {} exceeds the maximum of {MAX_CHUNK_SIZE}",
                self.chunk_size
            )));
        }
        if self.max_parallelism == Some(0) {
            return Err(TallyError::InvalidConfig(
                "max_parallelism must be greater than zero when set".into(),
            ));
        }
        Ok(())
    }

    /// Returns the number of files processed concurrently for a batch of `file_count` files.
    ///
    /// An explicit [`CountConfig::max_parallelism`] is capped by the file count; otherwise the
    /// bound is twice the available parallelism of the host. A batch of zero files resolves to 1.
    #[must_use]
    pub fn resolve_parallelism(&self, file_count: usize) -> usize {
        if file_count == 0 {
            return 1;
        }
        match self.max_parallelism.filter(|&value| value > 0) {
            Some(limit) => file_count.min(limit),
            None => {
                let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
                file_count.min(cores.saturating_mul(2).max(1))
            }
        }
    }
}

/// Builder for [`CountConfig`].
#[derive(Debug, Default, Clone)]
pub struct CountBuilder {
    cfg: CountConfig,
}

impl CountBuilder {
    /// Creates a builder with [`CountConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one read with [`CountConfig::from_env`].
    #[must_use]
    pub fn from_config(cfg: CountConfig) -> Self {
        Self { cfg }
    }

    /// Sets the chunk size in characters; `0` restores [`DEFAULT_CHUNK_SIZE`].
    ///
    /// Values above [`MAX_CHUNK_SIZE`] make [`CountBuilder::build`] fail.
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.cfg.chunk_size = size;
        self
    }

    /// Overrides the parallelism bound; `None` or `Some(0)` uses the host-derived default.
    #[must_use]
    pub fn max_parallelism(mut self, value: Option<usize>) -> Self {
        self.cfg.max_parallelism = value;
        self
    }

    /// Selects the input text encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.cfg.encoding = encoding;
        self
    }

    /// Rejects malformed input instead of replacing it with U+FFFD.
    #[must_use]
    pub fn strict_decoding(mut self, strict: bool) -> Self {
        self.cfg.strict_decoding = strict;
        self
    }

    /// Finalises the builder, returning a validated [`CountConfig`].
    pub fn build(mut self) -> Result<CountConfig> {
        if self.cfg.chunk_size == 0 {
            self.cfg.chunk_size = DEFAULT_CHUNK_SIZE;
        }
        self.cfg.max_parallelism = self.cfg.max_parallelism.filter(|&value| value > 0);
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
