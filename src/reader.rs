//! Streaming readers that yield one record at a time.
//!
//! Both readers stop after the first malformed record: the error is
//! yielded once and the iterator is then exhausted.

use crate::classad::ClassAd;
use crate::error::ClassAdError;
use crate::parser::{parse_classads, Line};
use std::io::BufRead;

/// New-format records (`[ ... ]`) from a buffered reader, separated by
/// whitespace or comments.
pub struct ClassAdReader<R> {
    input: R,
    /// Text read but not yet consumed.
    buf: String,
    /// Line and byte offset of `buf`'s first character in the stream.
    line: usize,
    offset: usize,
    eof: bool,
    done: bool,
}

impl<R: BufRead> ClassAdReader<R> {
    pub fn new(input: R) -> Self {
        ClassAdReader {
            input,
            buf: String::new(),
            line: 0,
            offset: 0,
            eof: false,
            done: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<ClassAd>, ClassAdError> {
        loop {
            match scan(&self.buf) {
                Scan::Record(end) => return self.take_record(end).map(Some),
                Scan::Unexpected => return Err(self.malformed()),
                Scan::Empty if self.eof => return Ok(None),
                Scan::Incomplete if self.eof => return Err(self.malformed()),
                Scan::Empty | Scan::Incomplete => {
                    if self.input.read_line(&mut self.buf)? == 0 {
                        self.eof = true;
                    }
                }
            }
        }
    }

    /// Parse and consume `buf[..end]`, which holds exactly one record
    /// preceded only by whitespace and comments.
    fn take_record(&mut self, end: usize) -> Result<ClassAd, ClassAdError> {
        let text = &self.buf[..end];
        let mut ads = parse_classads(text).map_err(|e| e.relocated(self.line, self.offset))?;
        let ad = ads.pop().ok_or_else(|| {
            ClassAdError::Shape("Expected a record in the input stream".to_string())
        })?;
        tracing::debug!(line = self.line, attributes = ad.len(), "read record");
        self.line += text.matches('\n').count();
        self.offset += end;
        self.buf.drain(..end);
        Ok(ad)
    }

    /// The parse error for whatever is left in the buffer.
    fn malformed(&self) -> ClassAdError {
        match parse_classads(&self.buf) {
            Err(e) => e.relocated(self.line, self.offset).into(),
            Ok(_) => ClassAdError::Shape("Malformed record stream".to_string()),
        }
    }
}

impl<R: BufRead> Iterator for ClassAdReader<R> {
    type Item = Result<ClassAd, ClassAdError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(ad)) => Some(Ok(ad)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

enum Scan {
    /// Only whitespace and comments so far.
    Empty,
    /// A record starts but does not end within the text.
    Incomplete,
    /// A complete record ends just before this byte offset.
    Record(usize),
    /// Something other than a record, whitespace or a comment.
    Unexpected,
}

/// Find the end of the first balanced `[ ... ]` span, skipping over string
/// literals, quoted names and comments.
fn scan(text: &str) -> Scan {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => match text[i..].find('\n') {
                Some(n) => i += n,
                None if depth == 0 => return Scan::Empty,
                None => return Scan::Incomplete,
            },
            b'/' if bytes.get(i + 1) == Some(&b'*') => match text[i + 2..].find("*/") {
                Some(n) => i += n + 3,
                None => return Scan::Incomplete,
            },
            quote @ (b'"' | b'\'') if depth > 0 => match closing_quote(bytes, i + 1, quote) {
                Some(close) => i = close,
                None => return Scan::Incomplete,
            },
            b'[' => depth += 1,
            b']' if depth == 0 => return Scan::Unexpected,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Scan::Record(i + 1);
                }
            }
            b if depth == 0 && !b.is_ascii_whitespace() => return Scan::Unexpected,
            _ => {}
        }
        i += 1;
    }
    if depth == 0 {
        Scan::Empty
    } else {
        Scan::Incomplete
    }
}

/// Offset of the unescaped `quote` closing a literal that starts at `from`.
fn closing_quote(bytes: &[u8], from: usize, quote: u8) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Old-format records from a buffered reader: `name = expr` lines, with
/// records separated by blank lines.
pub struct OldClassAdReader<R> {
    input: R,
    line: usize,
    offset: usize,
    done: bool,
}

impl<R: BufRead> OldClassAdReader<R> {
    pub fn new(input: R) -> Self {
        OldClassAdReader {
            input,
            line: 0,
            offset: 0,
            done: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<ClassAd>, ClassAdError> {
        let mut current: Option<ClassAd> = None;
        let mut raw = String::new();
        loop {
            raw.clear();
            let read = self.input.read_line(&mut raw)?;
            if read == 0 {
                return Ok(current);
            }
            let text = raw.trim_end_matches(['\n', '\r']);
            let line = Line {
                text,
                number: self.line,
                offset: self.offset,
            };
            self.line += 1;
            self.offset += read;
            if line.is_blank() {
                if let Some(ad) = current.take() {
                    tracing::debug!(line = line.number, attributes = ad.len(), "read record");
                    return Ok(Some(ad));
                }
            } else if !line.is_ignorable() {
                line.parse_into(current.get_or_insert_with(ClassAd::new))?;
            }
        }
    }
}

impl<R: BufRead> Iterator for OldClassAdReader<R> {
    type Item = Result<ClassAd, ClassAdError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(ad)) => Some(Ok(ad)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
