// Parse session. Owns the scratch arrays and cursor state for one
// single-threaded, cooperative parse. Not `Clone`/`Sync`: every mutating
// method takes `&mut self`, so the compiler enforces "not safe for
// concurrent calls" rather than a runtime guard.

use memchr::memchr2;

use crate::dialect::Dialect;
use crate::error::Error;
use crate::header::HeaderIndex;
use crate::row_view::RowView;
use crate::scanner::scan_row;

/// A single streaming parse over one borrowed input window. The window
/// must outlive the session; every `RowView` returned by `current_row` is
/// valid only until the next `advance`.
pub struct ParseSession<'a> {
    input: &'a [u8],
    dialect: Dialect,
    pos: usize,
    starts: Vec<u32>,
    lengths: Vec<u32>,
    row_start: usize,
    column_count: usize,
    row_number: usize,
    header: Option<HeaderIndex>,
}

impl<'a> ParseSession<'a> {
    /// Open a session over `input`. When `dialect.has_header`, immediately
    /// scans and consumes row 0 as the header; data rows start at 1.
    pub fn new(input: &'a [u8], dialect: Dialect) -> Result<Self, Error> {
        let max_columns = dialect.max_columns;
        let mut session = ParseSession {
            input,
            dialect,
            pos: 0,
            starts: vec![0u32; max_columns],
            lengths: vec![0u32; max_columns],
            row_start: 0,
            column_count: 0,
            row_number: 0,
            header: None,
        };

        if session.dialect.has_header {
            if session.advance()? {
                let names = (0..session.column_count)
                    .map(|i| session.current_row().column(i).decode_string(session.dialect.quote))
                    .collect();
                log::debug!("parsed header row with {} columns", session.column_count);
                session.header = Some(HeaderIndex::new(names));
            }
        }

        Ok(session)
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn header(&self) -> Option<&HeaderIndex> {
        self.header.as_ref()
    }

    /// 1-based ordinal of the most recently scanned row (0 before the
    /// first `advance`).
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    /// Scan the next row. Returns `Ok(false)` when the input is exhausted;
    /// an input ending without a terminator still yields its last row, and
    /// a trailing terminator never synthesizes an extra empty row.
    pub fn advance(&mut self) -> Result<bool, Error> {
        if self.pos >= self.input.len() {
            return Ok(false);
        }

        let window = &self.input[self.pos..];
        let result = scan_row(
            window,
            &self.dialect,
            self.row_number + 1,
            &mut self.starts,
            &mut self.lengths,
        )?;

        if result.consumed == 0 && result.column_count == 0 {
            return Ok(false);
        }

        self.row_start = self.pos;
        self.column_count = result.column_count;
        self.pos += result.consumed;
        self.row_number += 1;
        Ok(true)
    }

    /// Borrow the row most recently produced by `advance`. Do not retain
    /// across the next `advance` call; copy instead.
    pub fn current_row(&self) -> RowView<'_> {
        RowView::new(
            self.input,
            self.row_start,
            // `starts`/`lengths` only ever hold offsets relative to
            // `row_start` within `self.input`, whose lifetime is `'a`; the
            // slice borrow itself is tied to `&self`, which is exactly the
            // "valid until next advance" contract this method promises,
            // enforced here by the borrow checker instead of a
            // documented-but-unenforced rule.
            &self.starts,
            &self.lengths,
            self.column_count,
        )
    }

    /// Re-align to the next row terminator after a scanner error. Session
    /// state is otherwise unspecified until this is called. Returns
    /// `true` if a terminator was found and the session can continue;
    /// `false` at end of input.
    pub fn reset(&mut self) -> bool {
        log::warn!("resetting parse session after error at byte offset {}", self.pos);
        match memchr2(b'\n', b'\r', &self.input[self.pos..]) {
            Some(rel) => {
                let abs = self.pos + rel;
                self.pos = if self.input[abs] == b'\r' && self.input.get(abs + 1) == Some(&b'\n') {
                    abs + 2
                } else {
                    abs + 1
                };
                true
            }
            None => {
                self.pos = self.input.len();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Strictness;

    fn to_strings(row: &RowView<'_>, quote: u8) -> Vec<String> {
        (0..row.column_count())
            .map(|i| row.column(i).decode_string(quote))
            .collect()
    }

    #[test]
    fn basic_three_rows_scanned_in_order() {
        let dialect = Dialect::new(
            b',',
            b'"',
            false,
            crate::dialect::TerminatorPolicy::Any,
            Strictness::Strict,
            16,
        )
        .unwrap();
        let mut session = ParseSession::new(b"A,B,C\n1,2,3\n4,5,6", dialect).unwrap();

        let mut rows = Vec::new();
        while session.advance().unwrap() {
            rows.push(to_strings(&session.current_row(), b'"'));
        }
        assert_eq!(
            rows,
            vec![
                vec!["A", "B", "C"],
                vec!["1", "2", "3"],
                vec!["4", "5", "6"],
            ]
        );
    }

    #[test]
    fn header_row_is_consumed_and_indexed() {
        let session = ParseSession::new(b"Name,Age\nAlice,30\n", Dialect::csv()).unwrap();
        let header = session.header().unwrap();
        assert_eq!(header.ordinal("Age"), Some(1));
        assert_eq!(session.row_number(), 1);
    }

    #[test]
    fn trailing_terminator_does_not_yield_extra_empty_row() {
        let dialect = Dialect::new(
            b',',
            b'"',
            false,
            crate::dialect::TerminatorPolicy::Any,
            Strictness::Strict,
            16,
        )
        .unwrap();
        let mut session = ParseSession::new(b"a,b\nc,d\n", dialect).unwrap();
        let mut count = 0;
        while session.advance().unwrap() {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn reset_realigns_after_an_error() {
        let dialect = Dialect::new(
            b',',
            b'"',
            false,
            crate::dialect::TerminatorPolicy::Any,
            Strictness::Strict,
            1,
        )
        .unwrap();
        let mut session = ParseSession::new(b"a,b,c\nd,e\n", dialect).unwrap();
        let err = session.advance();
        assert!(err.is_err());
        assert!(session.reset());
        assert!(session.advance().is_err()); // second row also has 2 columns > max 1
    }

    #[test]
    fn advance_attributes_errors_to_the_real_row_number() {
        let dialect = Dialect::new(
            b',',
            b'"',
            false,
            crate::dialect::TerminatorPolicy::Any,
            Strictness::Strict,
            1,
        )
        .unwrap();
        let mut session = ParseSession::new(b"a\nb\nc,d\n", dialect).unwrap();
        assert!(session.advance().unwrap());
        assert!(session.advance().unwrap());
        let err = session.advance();
        assert!(matches!(
            err,
            Err(Error::TooManyColumns { row: 3, max: 1 })
        ));
    }
}
