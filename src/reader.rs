//! Incremental text decoding over fixed-size, reused read buffers.

use std::io::{ErrorKind, Read};

use crate::config::{TextEncoding, MAX_CHUNK_SIZE};
use crate::error::{Result, TallyError};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];
const UTF32LE_BOM: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
const UTF32BE_BOM: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];
/// Longest byte sequence that may be held back between reads, plus one spare byte.
const CARRY_SLACK: usize = 4;

/// Reads a byte stream and yields decoded text chunks of at most `chunk_size` characters.
///
/// The byte and text buffers are allocated once and reused for every chunk, so memory use is
/// bounded by the chunk size regardless of the input length. Multi-byte sequences that straddle
/// a read are carried into the next chunk rather than split.
///
/// Malformed input is replaced with U+FFFD unless [`ChunkReader::strict`] is enabled, in which
/// case the first malformed sequence fails with [`TallyError::Decode`].
#[derive(Debug)]
pub struct ChunkReader<R> {
    inner: R,
    requested: TextEncoding,
    encoding: TextEncoding,
    chunk_size: usize,
    strict: bool,
    bytes: Vec<u8>,
    len: usize,
    offset: u64,
    text: String,
    sniffed: bool,
    eof: bool,
    bytes_read: u64,
    chars_read: u64,
}

impl<R: Read> ChunkReader<R> {
    /// Wraps `inner`, decoding with `encoding` into chunks of at most `chunk_size` characters.
    ///
    /// `chunk_size` is clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn new(inner: R, encoding: TextEncoding, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        Self {
            inner,
            requested: encoding,
            encoding,
            chunk_size,
            strict: false,
            bytes: vec![0; CARRY_SLACK],
            len: 0,
            offset: 0,
            text: String::with_capacity(chunk_size),
            sniffed: false,
            eof: false,
            bytes_read: 0,
            chars_read: 0,
        }
    }

    /// Fails on malformed input instead of substituting U+FFFD.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Encoding in use; resolves [`TextEncoding::Auto`] once the first chunk has been read.
    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Total bytes pulled from the underlying reader, byte order mark included.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Total characters handed out through [`ChunkReader::next_chunk`].
    #[must_use]
    pub fn chars_read(&self) -> u64 {
        self.chars_read
    }

    /// Returns the next decoded chunk, or `None` once the stream is exhausted.
    ///
    /// The returned slice borrows the reader's internal buffer and is overwritten by the next call.
    pub fn next_chunk(&mut self) -> Result<Option<&str>> {
        if !self.sniffed {
            self.sniff()?;
        }
        loop {
            if !self.eof && self.len < self.bytes.len() {
                self.fill()?;
            }
            self.text.clear();
            let used = self.decode()?;
            self.bytes.copy_within(used..self.len, 0);
            self.len -= used;
            self.offset += used as u64;

            if !self.text.is_empty() {
                self.chars_read += self.text.chars().count() as u64;
                return Ok(Some(&self.text));
            }
            if self.eof {
                return Ok(None);
            }
        }
    }

    fn sniff(&mut self) -> Result<()> {
        while !self.eof && self.len < UTF32LE_BOM.len() {
            self.fill()?;
        }
        let head = &self.bytes[..self.len];
        let (encoding, bom) = match self.requested {
            TextEncoding::Auto => detect_bom(head),
            TextEncoding::Utf8 => (TextEncoding::Utf8, bom_len(head, UTF8_BOM)),
            TextEncoding::Utf16Le => (TextEncoding::Utf16Le, bom_len(head, UTF16LE_BOM)),
            TextEncoding::Utf16Be => (TextEncoding::Utf16Be, bom_len(head, UTF16BE_BOM)),
            TextEncoding::Utf32Le => (TextEncoding::Utf32Le, bom_len(head, UTF32LE_BOM)),
            TextEncoding::Utf32Be => (TextEncoding::Utf32Be, bom_len(head, UTF32BE_BOM)),
        };
        self.bytes.copy_within(bom..self.len, 0);
        self.len -= bom;
        self.offset += bom as u64;
        self.encoding = encoding;

        let capacity = self.chunk_size * unit_width(encoding) + CARRY_SLACK;
        self.bytes.resize(capacity, 0);
        self.sniffed = true;
        Ok(())
    }

    fn fill(&mut self) -> Result<()> {
        loop {
            match self.inner.read(&mut self.bytes[self.len..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(read) => {
                    self.len += read;
                    self.bytes_read += read as u64;
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TallyError::io(err, None)),
            }
        }
    }

    fn decode(&mut self) -> Result<usize> {
        let cursor = DecodeCursor {
            offset: self.offset,
            encoding: self.encoding,
            budget: self.chunk_size,
            eof: self.eof,
            strict: self.strict,
        };
        let input = &self.bytes[..self.len];
        let out = &mut self.text;
        match self.encoding {
            TextEncoding::Utf16Le => decode_utf16(input, u16::from_le_bytes, &cursor, out),
            TextEncoding::Utf16Be => decode_utf16(input, u16::from_be_bytes, &cursor, out),
            TextEncoding::Utf32Le => decode_utf32(input, u32::from_le_bytes, &cursor, out),
            TextEncoding::Utf32Be => decode_utf32(input, u32::from_be_bytes, &cursor, out),
            TextEncoding::Utf8 | TextEncoding::Auto => decode_utf8(input, &cursor, out),
        }
    }
}

/// Position and limits of a single decode pass.
struct DecodeCursor {
    offset: u64,
    encoding: TextEncoding,
    budget: usize,
    eof: bool,
    strict: bool,
}

impl DecodeCursor {
    fn error(&self, position: usize) -> TallyError {
        TallyError::Decode {
            path: None,
            offset: self.offset + position as u64,
            encoding: self.encoding,
        }
    }

    /// Handles a malformed sequence starting at `position`.
    fn replace(&self, position: usize, out: &mut String) -> Result<()> {
        if self.strict {
            return Err(self.error(position));
        }
        out.push(char::REPLACEMENT_CHARACTER);
        Ok(())
    }
}

/// Appends up to `cursor.budget` characters to `out`, returning the number of bytes consumed.
fn decode_utf8(input: &[u8], cursor: &DecodeCursor, out: &mut String) -> Result<usize> {
    let mut used = 0usize;
    let mut chars = 0usize;
    while used < input.len() && chars < cursor.budget {
        let rest = &input[used..];
        let (valid, fault) = match std::str::from_utf8(rest) {
            Ok(valid) => (valid, None),
            Err(err) => {
                let valid = std::str::from_utf8(&rest[..err.valid_up_to()])
                    .map_err(|inner| TallyError::Internal(inner.to_string()))?;
                (valid, Some(err.error_len()))
            }
        };
        if let Some((end, _)) = valid.char_indices().nth(cursor.budget - chars) {
            out.push_str(&valid[..end]);
            return Ok(used + end);
        }
        out.push_str(valid);
        chars += valid.chars().count();
        used += valid.len();
        if chars == cursor.budget {
            break;
        }
        match fault {
            None => break,
            Some(Some(invalid)) => {
                cursor.replace(used, out)?;
                used += invalid;
            }
            // Incomplete sequence at the end of the buffer.
            Some(None) => {
                if !cursor.eof {
                    break;
                }
                cursor.replace(used, out)?;
                used = input.len();
            }
        }
        chars += 1;
    }
    Ok(used)
}

fn decode_utf16(
    input: &[u8],
    unit: fn([u8; 2]) -> u16,
    cursor: &DecodeCursor,
    out: &mut String,
) -> Result<usize> {
    let read_unit = |index: usize| unit([input[index * 2], input[index * 2 + 1]]);
    let units = input.len() / 2;
    let mut index = 0usize;
    let mut chars = 0usize;
    while index < units && chars < cursor.budget {
        let first = read_unit(index);
        let (decoded, width) = match first {
            0xD800..=0xDBFF if index + 1 < units => {
                let second = read_unit(index + 1);
                if (0xDC00..=0xDFFF).contains(&second) {
                    let high = u32::from(first - 0xD800);
                    let low = u32::from(second - 0xDC00);
                    (char::from_u32(0x10000 + (high << 10) + low), 2)
                } else {
                    (None, 1)
                }
            }
            0xD800..=0xDBFF if !cursor.eof => break,
            0xD800..=0xDFFF => (None, 1),
            other => (char::from_u32(u32::from(other)), 1),
        };
        match decoded {
            Some(ch) => out.push(ch),
            None => cursor.replace(index * 2, out)?,
        }
        index += width;
        chars += 1;
    }
    let used = index * 2;
    if cursor.eof && chars < cursor.budget && used < input.len() {
        cursor.replace(used, out)?;
        return Ok(input.len());
    }
    Ok(used)
}

fn decode_utf32(
    input: &[u8],
    unit: fn([u8; 4]) -> u32,
    cursor: &DecodeCursor,
    out: &mut String,
) -> Result<usize> {
    let units = input.len() / 4;
    let mut index = 0usize;
    while index < units && index < cursor.budget {
        let at = index * 4;
        let value = unit([input[at], input[at + 1], input[at + 2], input[at + 3]]);
        match char::from_u32(value) {
            Some(ch) => out.push(ch),
            None => cursor.replace(at, out)?,
        }
        index += 1;
    }
    let used = index * 4;
    if cursor.eof && index < cursor.budget && used < input.len() {
        cursor.replace(used, out)?;
        return Ok(input.len());
    }
    Ok(used)
}

fn detect_bom(head: &[u8]) -> (TextEncoding, usize) {
    // UTF-32LE shares its first two bytes with the UTF-16LE mark.
    let candidates = [
        (UTF32LE_BOM, TextEncoding::Utf32Le),
        (UTF32BE_BOM, TextEncoding::Utf32Be),
        (UTF8_BOM, TextEncoding::Utf8),
        (UTF16LE_BOM, TextEncoding::Utf16Le),
        (UTF16BE_BOM, TextEncoding::Utf16Be),
    ];
    candidates
        .into_iter()
        .find(|(bom, _)| head.starts_with(bom))
        .map_or((TextEncoding::Utf8, 0), |(bom, encoding)| {
            (encoding, bom.len())
        })
}

fn bom_len(head: &[u8], bom: &[u8]) -> usize {
    if head.starts_with(bom) {
        bom.len()
    } else {
        0
    }
}

/// Bytes per code unit.
fn unit_width(encoding: TextEncoding) -> usize {
    match encoding {
        TextEncoding::Utf16Le | TextEncoding::Utf16Be => 2,
        TextEncoding::Utf32Le | TextEncoding::Utf32Be => 4,
        TextEncoding::Utf8 | TextEncoding::Auto => 1,
    }
}
