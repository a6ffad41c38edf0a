use std::fmt;

/// A 0-based position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 0-based line number
    pub line: usize,
    /// 0-based column (character offset within the line)
    pub column: usize,
    /// 0-based absolute byte offset from the start of input
    pub offset: usize,
}

impl Position {
    /// Compute the position of byte `offset` within `input`.
    pub fn locate(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let consumed = &input[..offset];
        let line = consumed.matches('\n').count();
        let last_newline = consumed.rfind('\n').map(|i| i + 1).unwrap_or(0);
        Position {
            line,
            column: offset - last_newline,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A parse error with span information (begin..end).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{begin}: {message} ({code})")]
pub struct ParseError {
    pub code: String,
    pub message: String,
    /// Start of the offending region
    pub begin: Position,
    /// End of the offending region (exclusive)
    pub end: Position,
}

impl ParseError {
    pub fn syntax_error(message: String, begin: Position, end: Position) -> Self {
        ParseError {
            code: "classad-parse-syntax-error".to_string(),
            message,
            begin,
            end,
        }
    }

    /// Shift the error's span by `line` lines and `offset` bytes, used when a
    /// fragment of a larger input (one old-format line, one streamed record)
    /// was parsed on its own.
    pub fn relocated(mut self, line: usize, offset: usize) -> Self {
        for pos in [&mut self.begin, &mut self.end] {
            pos.line += line;
            pos.offset += offset;
        }
        self
    }
}

/// Host-level failures from parse, marshal and I/O entry points.
///
/// Semantic faults during evaluation never surface here; they are the
/// in-language `Value::Error`.
#[derive(Debug, thiserror::Error)]
pub enum ClassAdError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Well-formed input whose shape does not fit the requested target,
    /// e.g. a JSON array where a record was expected.
    #[error("{0}")]
    Shape(String),
}
