//! Streams a single file through its own tokenizer into a word frequency table.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use rustc_hash::FxHashMap;

use crate::cancel::CancelToken;
use crate::config::CountConfig;
use crate::error::{Result, TallyError};
use crate::metrics::FileMetrics;
use crate::reader::ChunkReader;
use crate::tokenizer::WordTokenizer;

/// Word frequency table keyed by lowercase word.
pub type WordCounts = FxHashMap<String, u64>;

/// Words counted in one file together with its read statistics.
#[derive(Debug, Clone, Default)]
pub struct FileTally {
    /// Occurrences per word within the file.
    pub counts: WordCounts,
    /// Read and tokenization statistics.
    pub metrics: FileMetrics,
}

/// Adds one occurrence of `word`, allocating the key only on first sight.
pub fn increment(counts: &mut WordCounts, word: &str) {
    match counts.get_mut(word) {
        Some(count) => *count += 1,
        None => {
            counts.insert(word.to_owned(), 1);
        }
    }
}

/// Opens `path`, builds a fresh tokenizer with `make_tokenizer`, and counts the file's words.
///
/// IO and decoding errors carry `path`. Cancellation is observed before opening the file and
/// between chunk reads.
pub fn count_file<F, T>(
    path: &Path,
    cfg: &CountConfig,
    make_tokenizer: &F,
    cancel: &CancelToken,
) -> Result<FileTally>
where
    F: Fn() -> Result<T>,
    T: WordTokenizer,
{
    cancel.check()?;
    let file = File::open(path).map_err(|err| TallyError::io(err, Some(path.to_path_buf())))?;
    let tokenizer = make_tokenizer()?;
    let tally = count_reader(file, tokenizer, cfg, cancel).map_err(|err| err.with_path(path))?;
    debug!(
        "counted {} words ({} unique) in {} from {} bytes over {} chunks",
        tally.metrics.words,
        tally.counts.len(),
        path.display(),
        tally.metrics.bytes_read,
        tally.metrics.chunks
    );
    Ok(tally)
}

/// Counts the words of an arbitrary byte stream decoded according to `cfg`.
///
/// Fails with [`TallyError::InvalidConfig`] before reading when `cfg` does not validate.
pub fn count_reader<R, T>(
    source: R,
    mut tokenizer: T,
    cfg: &CountConfig,
    cancel: &CancelToken,
) -> Result<FileTally>
where
    R: Read,
    T: WordTokenizer,
{
    cfg.validate()?;
    let mut reader =
        ChunkReader::new(source, cfg.encoding, cfg.chunk_size).strict(cfg.strict_decoding);
    let mut counts = WordCounts::default();
    let mut words = 0u64;
    let mut chunks = 0u64;
    let mut record = |word: &str| {
        words += 1;
        increment(&mut counts, word);
    };

    loop {
        cancel.check()?;
        let Some(chunk) = reader.next_chunk()? else {
            break;
        };
        chunks += 1;
        tokenizer.process_chunk(chunk, &mut record);
    }
    tokenizer.complete(&mut record);

    let metrics = FileMetrics {
        bytes_read: reader.bytes_read(),
        chars_read: reader.chars_read(),
        chunks,
        words,
    };
    Ok(FileTally { counts, metrics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::StreamingTokenizer;
    use std::cell::Cell;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn small_chunks() -> CountConfig {
        CountConfig::builder().chunk_size(8).build().unwrap()
    }

    #[test]
    fn counts_words_in_single_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("single.txt");
        fs::write(&path, "Hello hello hello_world 123").expect("write file");

        let tally = count_file(
            &path,
            &small_chunks(),
            &|| Ok(StreamingTokenizer::new()),
            &CancelToken::new(),
        )
        .expect("count file");
        assert_eq!(tally.counts.len(), 3);
        assert_eq!(tally.counts["hello"], 2);
        assert_eq!(tally.counts["hello_world"], 1);
        assert_eq!(tally.counts["123"], 1);
        assert_eq!(tally.metrics.words, 4);
        assert_eq!(tally.metrics.chars_read, 27);
        assert_eq!(tally.metrics.chunks, 4);
    }

    #[test]
    fn chunk_size_does_not_change_counts() {
        let text = "alpha beta, gamma-delta alpha\nbeta_gamma 77 alpha".repeat(40);
        let expected = count_reader(
            Cursor::new(text.as_bytes()),
            StreamingTokenizer::new(),
            &CountConfig::default(),
            &CancelToken::new(),
        )
        .unwrap()
        .counts;
        for chunk_size in [1, 2, 3, 5, 7, 64] {
            let cfg = CountConfig::builder().chunk_size(chunk_size).build().unwrap();
            let tally = count_reader(
                Cursor::new(text.as_bytes()),
                StreamingTokenizer::new(),
                &cfg,
                &CancelToken::new(),
            )
            .unwrap();
            assert_eq!(tally.counts, expected, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn missing_file_error_names_path() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("absent.txt");
        let err = count_file(
            &path,
            &CountConfig::default(),
            &|| Ok(StreamingTokenizer::new()),
            &CancelToken::new(),
        )
        .expect_err("missing file must fail");
        assert!(matches!(err, TallyError::Io { path: Some(ref p), .. } if p == &path));
    }

    /// Fires `cancel` on the second read and counts every read call.
    struct CancelOnSecondRead<'a> {
        inner: Cursor<&'a str>,
        cancel: CancelToken,
        reads: &'a Cell<usize>,
    }

    impl Read for CancelOnSecondRead<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads.set(self.reads.get() + 1);
            if self.reads.get() == 2 {
                self.cancel.cancel();
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn malformed_bytes_are_replaced_and_counting_continues() {
        let tally = count_reader(
            Cursor::new(&b"caf\xE9 au lait and many more words"[..]),
            StreamingTokenizer::new(),
            &CountConfig::default(),
            &CancelToken::new(),
        )
        .expect("lossy decoding keeps the file");
        assert_eq!(tally.metrics.words, 7);
        assert_eq!(tally.counts["caf"], 1);
        assert_eq!(tally.counts["lait"], 1);
    }

    #[test]
    fn oversized_chunk_size_is_rejected_before_reading() {
        let cfg = CountConfig {
            chunk_size: usize::MAX,
            ..CountConfig::default()
        };
        let err = count_reader(
            Cursor::new("alpha"),
            StreamingTokenizer::new(),
            &cfg,
            &CancelToken::new(),
        )
        .expect_err("oversized chunk must fail");
        assert!(matches!(err, TallyError::InvalidConfig(_)));
    }

    #[test]
    fn strict_decode_error_is_attributed_to_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("binary.txt");
        fs::write(&path, b"ok \xC3\x28 rest").expect("write file");
        let err = count_file(
            &path,
            &CountConfig::builder().strict_decoding(true).build().unwrap(),
            &|| Ok(StreamingTokenizer::new()),
            &CancelToken::new(),
        )
        .expect_err("invalid utf-8 must fail");
        assert!(matches!(
            err,
            TallyError::Decode { path: Some(ref p), offset: 3, .. } if p == &path
        ));
    }

    #[test]
    fn tokenizer_factory_failure_is_reported() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("words.txt");
        fs::write(&path, "alpha").expect("write file");
        let err = count_file(
            &path,
            &CountConfig::default(),
            &|| -> Result<StreamingTokenizer> { Err(TallyError::Tokenizer("unavailable".into())) },
            &CancelToken::new(),
        )
        .expect_err("factory failure must fail the file");
        assert!(matches!(err, TallyError::Tokenizer(_)));
    }

    #[test]
    fn cancelled_token_stops_before_reading() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = count_reader(
            Cursor::new("alpha beta"),
            StreamingTokenizer::new(),
            &CountConfig::default(),
            &cancel,
        )
        .expect_err("cancelled");
        assert!(err.is_cancelled());
    }

    #[test]
    fn cancellation_between_chunks_stops_reading() {
        let cancel = CancelToken::new();
        let reads = Cell::new(0);
        let source = CancelOnSecondRead {
            inner: Cursor::new("alpha beta gamma delta epsilon"),
            cancel: cancel.clone(),
            reads: &reads,
        };
        let cfg = CountConfig::builder().chunk_size(4).build().unwrap();
        let err = count_reader(source, StreamingTokenizer::new(), &cfg, &cancel)
            .expect_err("cancelled mid-stream");
        assert!(err.is_cancelled());
        assert_eq!(reads.get(), 2);
    }
}
