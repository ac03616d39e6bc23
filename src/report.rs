//! Ranking and rendering of counting results.

use std::cmp::Ordering;
use std::io::{self, Write};

use serde::Serialize;
use serde_json::json;

use crate::counter::CountResult;
use crate::processor::WordCounts;

/// Number of ranked entries shown by default.
pub const DEFAULT_TOP_N: usize = 50;

const RULE_WIDTH: usize = 50;

/// One ranked word.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WordEntry {
    /// Lowercase word.
    pub word: String,
    /// Occurrences across all files.
    pub count: u64,
}

/// Ranked view over a non-empty frequency table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedReport {
    /// Highest-count entries, at most the requested limit.
    pub entries: Vec<WordEntry>,
    /// Distinct words in the full table.
    pub unique_words: usize,
    /// Sum of occurrences in the full table.
    pub total_occurrences: u64,
    /// Ranked entries left out by the limit.
    pub remaining: usize,
}

/// Displayable outcome of a counting run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// No file contained a single word.
    Empty,
    /// At least one word was counted.
    Ranked(RankedReport),
}

impl Report {
    /// Ranks `result` and keeps the top `limit` entries.
    #[must_use]
    pub fn from_result(result: &CountResult, limit: usize) -> Self {
        Self::from_counts(result.counts(), limit)
    }

    /// Ranks a raw frequency table and keeps the top `limit` entries.
    #[must_use]
    pub fn from_counts(counts: &WordCounts, limit: usize) -> Self {
        if counts.is_empty() {
            return Self::Empty;
        }
        let mut entries = rank(counts);
        let remaining = entries.len().saturating_sub(limit);
        entries.truncate(limit);
        Self::Ranked(RankedReport {
            entries,
            unique_words: counts.len(),
            total_occurrences: counts.values().sum(),
            remaining,
        })
    }
}

/// Sorts a table by count descending, then word ascending.
#[must_use]
pub fn rank(counts: &WordCounts) -> Vec<WordEntry> {
    let mut entries: Vec<WordEntry> = counts
        .iter()
        .map(|(word, &count)| WordEntry {
            word: word.clone(),
            count,
        })
        .collect();
    entries.sort_unstable_by(compare_entries);
    entries
}

fn compare_entries(a: &WordEntry, b: &WordEntry) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word))
}

/// Writes the console table: recorded errors first, then the ranked words.
pub fn render_table<W: Write>(result: &CountResult, limit: usize, out: &mut W) -> io::Result<()> {
    for error in result.errors() {
        writeln!(out, "{error}")?;
    }

    let report = match Report::from_result(result, limit) {
        Report::Empty => {
            writeln!(out, "No words found in the provided files.")?;
            return Ok(());
        }
        Report::Ranked(report) => report,
    };

    let rule = "-".repeat(RULE_WIDTH);
    writeln!(out, "Total unique words: {}", report.unique_words)?;
    writeln!(out, "Total word occurrences: {}", report.total_occurrences)?;
    writeln!(out)?;
    writeln!(out, "Word Counts (Top {limit} by frequency):")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "{:<30} {:>15}", "Word", "Count")?;
    writeln!(out, "{rule}")?;
    for entry in &report.entries {
        writeln!(out, "{:<30} {:>15}", entry.word, group_thousands(entry.count))?;
    }
    if report.remaining > 0 {
        writeln!(out)?;
        writeln!(out, "... and {} more unique words", report.remaining)?;
    }
    Ok(())
}

/// Builds the machine-readable summary of `result`.
#[must_use]
pub fn to_json(result: &CountResult, limit: usize) -> serde_json::Value {
    let top = match Report::from_result(result, limit) {
        Report::Empty => Vec::new(),
        Report::Ranked(report) => report.entries,
    };
    json!({
        "unique_words": result.unique_words(),
        "total_occurrences": result.total_occurrences(),
        "top": top,
        "errors": result.errors(),
        "metrics": result.metrics(),
    })
}

/// Formats `value` with comma thousands separators.
#[must_use]
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
