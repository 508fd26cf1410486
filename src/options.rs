use std::fmt::Write as _;

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};

use crate::error::ExportError;

pub const DEFAULT_DELIMITER: u8 = b',';
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Record terminator written after every row, header included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    #[default]
    Lf,
    CrLf,
}

impl LineTerminator {
    pub fn from_crlf_flag(use_crlf: bool) -> Self {
        if use_crlf {
            LineTerminator::CrLf
        } else {
            LineTerminator::Lf
        }
    }
}

/// A validated `strftime` pattern for timestamp cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    /// Validate `pattern` by rendering a sample timestamp with it.
    ///
    /// Rejects unknown specifiers and specifiers that need a time zone, since
    /// timestamps are rendered exactly as the driver delivered them.
    pub fn parse(pattern: &str) -> Result<Self, ExportError> {
        if pattern.is_empty() {
            return Err(ExportError::config("date format must not be empty"));
        }
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ExportError::config(format!(
                "invalid date format \"{pattern}\""
            )));
        }
        let sample = NaiveDateTime::default();
        let mut out = String::new();
        if write!(out, "{}", sample.format(pattern)).is_err() {
            return Err(ExportError::config(format!(
                "date format \"{pattern}\" cannot be applied to timestamps without a time zone"
            )));
        }
        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn render(&self, ts: &NaiveDateTime) -> Result<String, ExportError> {
        let mut out = String::new();
        write!(out, "{}", ts.format(&self.pattern)).map_err(|_| ExportError::Normalization {
            message: format!("cannot format {ts} with \"{}\"", self.pattern),
        })?;
        Ok(out)
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Immutable export configuration handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub delimiter: u8,
    pub terminator: LineTerminator,
    pub emit_header: bool,
    pub null_text: String,
    pub date_format: DateFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            terminator: LineTerminator::Lf,
            emit_header: false,
            null_text: String::new(),
            date_format: DateFormat::default(),
        }
    }
}

/// Parse a delimiter argument: one ASCII character or a backslash escape.
///
/// - empty → `,`
/// - single-character escapes: `\t`, `\a`, `\b`, `\f`, `\v`, `\\`, `\'`
/// - numeric escapes: `\xHH`, `\uHHHH`, `\UHHHHHHHH` and three-digit octal `\NNN`
/// - the quote character, CR and LF are rejected
pub fn parse_delimiter(raw: &str) -> Result<u8, ExportError> {
    if raw.is_empty() {
        return Ok(DEFAULT_DELIMITER);
    }

    let mut chars = raw.chars();
    let ch = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => match raw.strip_prefix('\\') {
            Some(escape) => unescape(escape).ok_or_else(|| {
                ExportError::config(format!("unknown delimiter escape \"{raw}\""))
            })?,
            None => {
                return Err(ExportError::config(format!(
                    "delimiter must be a single character, got \"{raw}\""
                )));
            }
        },
    };

    if !ch.is_ascii() {
        return Err(ExportError::config(format!(
            "delimiter must be an ASCII character, got '{ch}'"
        )));
    }
    if matches!(ch, '"' | '\r' | '\n') {
        return Err(ExportError::config(format!(
            "delimiter {ch:?} is reserved for quoting or line breaks"
        )));
    }
    Ok(ch as u8)
}

/// Decode the part of a backslash escape after the backslash.
fn unescape(escape: &str) -> Option<char> {
    let simple = match escape {
        "a" => Some('\x07'),
        "b" => Some('\x08'),
        "f" => Some('\x0c'),
        "n" => Some('\n'),
        "r" => Some('\r'),
        "t" => Some('\t'),
        "v" => Some('\x0b'),
        "\\" => Some('\\'),
        "'" => Some('\''),
        "\"" => Some('"'),
        _ => None,
    };
    if simple.is_some() {
        return simple;
    }

    let (digits, radix) = match escape.as_bytes() {
        [b'x', rest @ ..] if rest.len() == 2 => (&escape[1..], 16),
        [b'u', rest @ ..] if rest.len() == 4 => (&escape[1..], 16),
        [b'U', rest @ ..] if rest.len() == 8 => (&escape[1..], 16),
        [b'0'..=b'7', ..] if escape.len() == 3 => (escape, 8),
        _ => return None,
    };
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok().and_then(char::from_u32)
}
