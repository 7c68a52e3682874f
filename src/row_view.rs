// Row view and decoders. A borrowed, read-only handle over one scanned
// row; decoders unquote/convert on demand rather than on the hot scanning
// path, keeping "where a field is" separate from "what it decodes to".

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::Error;
use crate::header::HeaderIndex;

/// A borrowed window into the scanner's input covering one raw (still
/// possibly quoted) field. Never outlives the input window it points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnView<'a> {
    bytes: &'a [u8],
}

impl<'a> ColumnView<'a> {
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        ColumnView { bytes }
    }

    #[inline]
    pub fn raw(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Trim one leading/trailing quote (iff both present) and unfold
    /// doubled quotes. Idempotent on already-unquoted input: no
    /// surrounding quotes means no allocation either.
    pub fn decode_text(&self, quote: u8) -> Cow<'a, [u8]> {
        let field = self.bytes;
        if field.len() < 2 || field[0] != quote || field[field.len() - 1] != quote {
            return Cow::Borrowed(field);
        }
        let inner = &field[1..field.len() - 1];
        if !inner.contains(&quote) {
            return Cow::Borrowed(inner);
        }
        let mut out = Vec::with_capacity(inner.len());
        let mut i = 0;
        while i < inner.len() {
            if inner[i] == quote && i + 1 < inner.len() && inner[i + 1] == quote {
                out.push(quote);
                i += 2;
            } else {
                out.push(inner[i]);
                i += 1;
            }
        }
        Cow::Owned(out)
    }

    pub fn decode_string(&self, quote: u8) -> String {
        String::from_utf8_lossy(&self.decode_text(quote)).into_owned()
    }

    fn unquoted_ascii(&self, quote: u8) -> Cow<'a, [u8]> {
        self.decode_text(quote)
    }

    /// Signed integer decode: ASCII optional sign, base-10 digits. Empty
    /// input is an error; callers binding a nullable member check
    /// emptiness themselves before reaching this decoder.
    pub fn decode_i64(&self, quote: u8) -> Result<i64, String> {
        let text = self.unquoted_ascii(quote);
        parse_ascii_i64(&text).ok_or_else(|| String::from_utf8_lossy(&text).into_owned())
    }

    pub fn decode_u64(&self, quote: u8) -> Result<u64, String> {
        let text = self.unquoted_ascii(quote);
        parse_ascii_u64(&text).ok_or_else(|| String::from_utf8_lossy(&text).into_owned())
    }

    pub fn decode_f64(&self, quote: u8) -> Result<f64, String> {
        let text = self.unquoted_ascii(quote);
        if text.is_empty() {
            return Err(String::new());
        }
        let s = std::str::from_utf8(&text).map_err(|_| String::from_utf8_lossy(&text).into_owned())?;
        s.parse::<f64>().map_err(|_| s.to_string())
    }

    pub fn decode_bool(&self, quote: u8) -> Result<bool, String> {
        let text = self.unquoted_ascii(quote);
        match text.as_ref() {
            b"1" => Ok(true),
            b"0" => Ok(false),
            _ => {
                let s = String::from_utf8_lossy(&text);
                match s.to_ascii_lowercase().as_str() {
                    "true" => Ok(true),
                    "false" => Ok(false),
                    _ => Err(s.into_owned()),
                }
            }
        }
    }

    /// ISO-8601 subset: date, or date+time, naive or UTC-offset.
    pub fn decode_datetime(&self, quote: u8) -> Result<DateTime<Utc>, String> {
        let text = self.unquoted_ascii(quote);
        let s = std::str::from_utf8(&text).map_err(|_| String::from_utf8_lossy(&text).into_owned())?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(DateTime::from_naive_utc_and_offset(ndt, Utc));
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(DateTime::from_naive_utc_and_offset(
                d.and_hms_opt(0, 0, 0).expect("midnight is always valid"),
                Utc,
            ));
        }
        Err(s.to_string())
    }
}

fn parse_ascii_i64(text: &[u8]) -> Option<i64> {
    if text.is_empty() {
        return None;
    }
    let (neg, digits) = match text[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() {
        return None;
    }
    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add((b - b'0') as i64)?;
    }
    Some(if neg { -value } else { value })
}

fn parse_ascii_u64(text: &[u8]) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    let mut value: u64 = 0;
    for &b in text {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add((b - b'0') as u64)?;
    }
    Some(value)
}

/// A borrowed handle over one scanned row: the input window plus the
/// column offset/length arrays the scanner filled in. Invalid the moment
/// the owning session advances.
pub struct RowView<'a> {
    input: &'a [u8],
    row_start: usize,
    starts: &'a [u32],
    lengths: &'a [u32],
    column_count: usize,
}

impl<'a> RowView<'a> {
    pub fn new(
        input: &'a [u8],
        row_start: usize,
        starts: &'a [u32],
        lengths: &'a [u32],
        column_count: usize,
    ) -> Self {
        RowView {
            input,
            row_start,
            starts,
            lengths,
            column_count,
        }
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Column `i`'s raw bytes, still possibly quoted. Panics like a slice
    /// index out of range; use `try_column` for a fallible lookup.
    pub fn column(&self, i: usize) -> ColumnView<'a> {
        self.try_column(i).expect("column index out of range")
    }

    pub fn try_column(&self, i: usize) -> Option<ColumnView<'a>> {
        if i >= self.column_count {
            return None;
        }
        let start = self.row_start + self.starts[i] as usize;
        let len = self.lengths[i] as usize;
        Some(ColumnView::new(&self.input[start..start + len]))
    }

    /// Look up a column by header name via `header_index`; returns `None`
    /// when the name isn't present or case-sensitive/insensitive lookup
    /// fails, per the chosen `HeaderIndex` mode.
    pub fn try_column_named(&self, name: &str, header_index: &HeaderIndex) -> Option<ColumnView<'a>> {
        header_index.ordinal(name).and_then(|ord| self.try_column(ord))
    }
}

/// Empty text decodes to an empty string; empty numeric input is an error
/// unless the caller treats it as "absent" (nullable path).
pub fn is_empty_field(view: &ColumnView<'_>) -> bool {
    view.is_empty()
}

pub type DecodeResult<T> = Result<T, Error>;
