//! Streaming, concurrent word frequency counting for text files.
//!
//! The crate exposes both a library API and a `wordtally` command line interface. Each file is
//! decoded in fixed-size chunks and fed through its own stateful [`StreamingTokenizer`], so words
//! that straddle a chunk boundary are reassembled and memory use stays independent of file size.
//! Files are processed concurrently with a bounded number of workers and their tables are summed
//! into a single [`CountResult`].
//!
//! ```no_run
//! use wordtally::{CountConfig, Report, WordCounter, DEFAULT_TOP_N};
//!
//! # fn main() -> wordtally::Result<()> {
//! let cfg = CountConfig::builder()
//!     .chunk_size(16 * 1024)
//!     .max_parallelism(Some(4))
//!     .build()?;
//! let result = WordCounter::new(cfg).count_files(&["a.txt", "b.txt"])?;
//! for error in result.errors() {
//!     eprintln!("{error}");
//! }
//! if let Report::Ranked(report) = Report::from_result(&result, DEFAULT_TOP_N) {
//!     for entry in &report.entries {
//!         println!("{} {}", entry.word, entry.count);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature. Users targeting the library portion
//! only can disable default features to avoid the CLI dependencies.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

pub mod cancel;
pub mod config;
pub mod counter;
pub mod error;
pub mod inputs;
pub mod metrics;
pub mod processor;
pub mod reader;
pub mod report;
pub mod tokenizer;

pub use cancel::CancelToken;
pub use config::{CountBuilder, CountConfig, TextEncoding};
pub use counter::{CountResult, WordCounter};
pub use error::{Result, TallyError};
pub use inputs::{resolve_inputs, InputOptions, ResolvedInputs};
pub use metrics::{FileMetrics, RunMetrics};
pub use processor::WordCounts;
pub use report::{RankedReport, Report, WordEntry, DEFAULT_TOP_N};
pub use tokenizer::{StreamingTokenizer, WordTokenizer};
