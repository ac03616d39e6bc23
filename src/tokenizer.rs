//! Streaming word splitter that carries partial words across chunk boundaries.

use unicode_general_category::{get_general_category, GeneralCategory};

use crate::config::INITIAL_WORD_CAPACITY;

/// Splits a stream of text chunks into lowercase words.
///
/// Implementations are stateful sessions: create one per input stream and never share it
/// between threads. [`WordTokenizer::complete`] consumes the session so that no chunk can be
/// fed after the final flush.
pub trait WordTokenizer {
    /// Scans `chunk` and invokes `emit` for every word completed inside it.
    ///
    /// A word still open at the end of the chunk is kept pending until a later separator or
    /// [`WordTokenizer::complete`].
    fn process_chunk<F>(&mut self, chunk: &str, emit: F)
    where
        F: FnMut(&str);

    /// Flushes the pending word, if any, and ends the session.
    fn complete<F>(self, emit: F)
    where
        F: FnMut(&str);
}

/// Returns `true` for letters (general category `L*`), decimal digits (`Nd`), and underscore.
///
/// Other numerics such as `²` or `Ⅻ` and combining marks are separators.
#[inline]
#[must_use]
pub fn is_word_char(ch: char) -> bool {
    if ch.is_ascii() {
        return ch == '_' || ch.is_ascii_alphanumeric();
    }
    matches!(
        get_general_category(ch),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::DecimalNumber
    )
}

/// Default [`WordTokenizer`] backed by a single growable pending buffer.
#[derive(Debug, Clone)]
pub struct StreamingTokenizer {
    pending: String,
}

impl Default for StreamingTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingTokenizer {
    /// Creates a tokenizer with [`INITIAL_WORD_CAPACITY`] bytes reserved for the pending word.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_WORD_CAPACITY)
    }

    /// Creates a tokenizer reserving `capacity` bytes for the pending word.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: String::with_capacity(capacity),
        }
    }

    /// Returns the characters accumulated since the last flush.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    fn flush<F>(&mut self, emit: &mut F)
    where
        F: FnMut(&str),
    {
        if self.pending.is_empty() {
            return;
        }
        emit(&self.pending);
        self.pending.clear();
    }
}

impl WordTokenizer for StreamingTokenizer {
    fn process_chunk<F>(&mut self, chunk: &str, mut emit: F)
    where
        F: FnMut(&str),
    {
        for ch in chunk.chars() {
            if is_word_char(ch) {
                if ch.is_ascii() {
                    self.pending.push(ch.to_ascii_lowercase());
                } else {
                    self.pending.extend(ch.to_lowercase());
                }
            } else {
                self.flush(&mut emit);
            }
        }
    }

    fn complete<F>(mut self, mut emit: F)
    where
        F: FnMut(&str),
    {
        self.flush(&mut emit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_chunks(chunks: &[&str]) -> Vec<String> {
        let mut tokenizer = StreamingTokenizer::new();
        let mut words = Vec::new();
        for chunk in chunks {
            tokenizer.process_chunk(chunk, |word| words.push(word.to_owned()));
        }
        tokenizer.complete(|word| words.push(word.to_owned()));
        words
    }

    #[test]
    fn preserves_word_across_chunk_boundaries() {
        let words = tokenize_chunks(&["inter", "national test"]);
        assert_eq!(words, vec!["international", "test"]);
    }

    #[test]
    fn splits_words_by_non_word_characters() {
        let words = tokenize_chunks(&["Hello,world!foo_bar 123"]);
        assert_eq!(words, vec!["hello", "world", "foo_bar", "123"]);
    }

    #[test]
    fn only_letters_and_decimal_digits_form_words() {
        let words = tokenize_chunks(&["x\u{B2} \u{BD} \u{216B} \u{928}\u{93F}"]);
        assert_eq!(words, vec!["x", "\u{928}"]);

        let words = tokenize_chunks(&["\u{663}\u{664} \u{1C5}ab"]);
        assert_eq!(words, vec!["\u{663}\u{664}", "\u{1C6}ab"]);
    }

    #[test]
    fn every_split_point_yields_same_words() {
        let text = "The quick-brown fox, jumped_over 42 lazy dogs. Ünïcode ÉCOLE!";
        let expected = tokenize_chunks(&[text]);
        for (split, _) in text.char_indices().skip(1) {
            let (left, right) = text.split_at(split);
            assert_eq!(tokenize_chunks(&[left, right]), expected, "split at {split}");
        }
        let single_chars: Vec<String> = text.chars().map(String::from).collect();
        let refs: Vec<&str> = single_chars.iter().map(String::as_str).collect();
        assert_eq!(tokenize_chunks(&refs), expected);
    }

    #[test]
    fn lowercases_non_ascii_letters() {
        let words = tokenize_chunks(&["ÉCOLE Straße ΣΟΦΙΑ"]);
        assert_eq!(words, vec!["école", "straße", "σοφια"]);
    }

    #[test]
    fn keeps_arbitrarily_long_tokens_whole() {
        let long_word = "A".repeat(70_000);
        let text = format!("{long_word} {long_word}");
        let (left, right) = text.split_at(12_345);
        let words = tokenize_chunks(&[left, right]);
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|word| word.len() == 70_000));
        assert!(words[0].bytes().all(|b| b == b'a'));
    }

    #[test]
    fn completing_without_words_emits_nothing() {
        assert!(tokenize_chunks(&[]).is_empty());
        assert!(tokenize_chunks(&["  ,.;!", "\n\t--"]).is_empty());
    }

    #[test]
    fn separator_runs_do_not_emit_empty_words() {
        let words = tokenize_chunks(&["a,,,b", "   ", "c"]);
        assert_eq!(words, vec!["a", "b", "c"]);
    }

    #[test]
    fn pending_holds_open_word() {
        let mut tokenizer = StreamingTokenizer::with_capacity(4);
        let mut words = Vec::new();
        tokenizer.process_chunk("alpha be", |word| words.push(word.to_owned()));
        assert_eq!(tokenizer.pending(), "be");
        assert_eq!(words, vec!["alpha"]);
    }
}
