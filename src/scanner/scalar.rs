// The scalar RFC 4180 state machine. This is the correctness oracle:
// every other scanning path must reproduce its output exactly.

use crate::dialect::{Dialect, Strictness, TerminatorPolicy};
use crate::error::Error;

use super::RowResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    InUnquotedField,
    InQuotedField,
    AfterQuoteInQuotedField,
}

/// Whether `c` can start a row terminator under the given policy. Bare CR
/// is recognized under `Any`/`Crlf` (Mac-classic line endings); `Lf`
/// restricts recognition to `\n` alone so a lone `\r` is ordinary field
/// content. `Crlf` and `Any` share this same recognition rule and differ
/// only in name; both collapse a `\r\n` pair into one consumed terminator.
#[inline]
fn is_terminator_byte(c: u8, policy: TerminatorPolicy) -> bool {
    match policy {
        TerminatorPolicy::Lf => c == b'\n',
        TerminatorPolicy::Crlf | TerminatorPolicy::Any => c == b'\n' || c == b'\r',
    }
}

#[inline]
fn emit_column(
    starts: &mut [u32],
    lengths: &mut [u32],
    column_count: &mut usize,
    start: usize,
    end: usize,
    max_columns: usize,
    row: usize,
) -> Result<(), Error> {
    if *column_count >= max_columns || *column_count >= starts.len() {
        return Err(Error::TooManyColumns { row, max: max_columns });
    }
    starts[*column_count] = start as u32;
    lengths[*column_count] = (end - start) as u32;
    *column_count += 1;
    Ok(())
}

/// `row` is the 1-based row number this scan is attempting, used only to
/// attribute errors; it has no effect on parsing itself.
pub(crate) fn scan_row_scalar(
    window: &[u8],
    dialect: &Dialect,
    row: usize,
    starts: &mut [u32],
    lengths: &mut [u32],
) -> Result<RowResult, Error> {
    let len = window.len();
    if len == 0 {
        return Ok(RowResult::empty());
    }

    let delimiter = dialect.delimiter;
    let quote = dialect.quote;
    let strict = dialect.strictness == Strictness::Strict;
    let policy = dialect.terminator;

    let mut state = State::FieldStart;
    let mut pos: usize = 0;
    let mut current_start: usize = 0;
    let mut column_count: usize = 0;

    loop {
        if pos >= len {
            return match state {
                State::InQuotedField if strict => Err(Error::UnterminatedQuote {
                    row,
                    column: column_count + 1,
                }),
                _ => {
                    emit_column(
                        starts,
                        lengths,
                        &mut column_count,
                        current_start,
                        pos,
                        dialect.max_columns,
                        row,
                    )?;
                    Ok(RowResult {
                        column_count,
                        row_length: pos,
                        consumed: pos,
                    })
                }
            };
        }

        let c = window[pos];

        match state {
            State::FieldStart => {
                if c == quote {
                    state = State::InQuotedField;
                    pos += 1;
                } else if c == delimiter {
                    emit_column(
                        starts,
                        lengths,
                        &mut column_count,
                        current_start,
                        pos,
                        dialect.max_columns,
                        row,
                    )?;
                    pos += 1;
                    current_start = pos;
                } else if is_terminator_byte(c, policy) {
                    emit_column(
                        starts,
                        lengths,
                        &mut column_count,
                        current_start,
                        pos,
                        dialect.max_columns,
                        row,
                    )?;
                    return Ok(end_of_row(window, pos, column_count));
                } else {
                    state = State::InUnquotedField;
                    pos += 1;
                }
            }
            State::InUnquotedField => {
                if c == delimiter {
                    emit_column(
                        starts,
                        lengths,
                        &mut column_count,
                        current_start,
                        pos,
                        dialect.max_columns,
                        row,
                    )?;
                    pos += 1;
                    current_start = pos;
                    state = State::FieldStart;
                } else if is_terminator_byte(c, policy) {
                    emit_column(
                        starts,
                        lengths,
                        &mut column_count,
                        current_start,
                        pos,
                        dialect.max_columns,
                        row,
                    )?;
                    return Ok(end_of_row(window, pos, column_count));
                } else if c == quote {
                    if strict {
                        return Err(Error::QuoteInUnquotedField {
                            row,
                            column: column_count + 1,
                        });
                    }
                    pos += 1;
                } else {
                    pos += 1;
                }
            }
            State::InQuotedField => {
                if c == quote {
                    state = State::AfterQuoteInQuotedField;
                }
                pos += 1;
            }
            State::AfterQuoteInQuotedField => {
                if c == quote {
                    state = State::InQuotedField;
                    pos += 1;
                } else if c == delimiter {
                    emit_column(
                        starts,
                        lengths,
                        &mut column_count,
                        current_start,
                        pos,
                        dialect.max_columns,
                        row,
                    )?;
                    pos += 1;
                    current_start = pos;
                    state = State::FieldStart;
                } else if is_terminator_byte(c, policy) {
                    emit_column(
                        starts,
                        lengths,
                        &mut column_count,
                        current_start,
                        pos,
                        dialect.max_columns,
                        row,
                    )?;
                    return Ok(end_of_row(window, pos, column_count));
                } else if strict {
                    return Err(Error::MalformedQuotedField {
                        row,
                        column: column_count + 1,
                    });
                } else {
                    state = State::InQuotedField;
                    pos += 1;
                }
            }
        }
    }
}

/// `pos` is the index of the first terminator byte. Collapses a `\r\n`
/// pair into a single consumed terminator rather than two.
#[inline]
fn end_of_row(window: &[u8], pos: usize, column_count: usize) -> RowResult {
    let row_length = pos;
    let c = window[pos];
    let consumed = if c == b'\r' && pos + 1 < window.len() && window[pos + 1] == b'\n' {
        pos + 2
    } else {
        pos + 1
    };
    RowResult {
        column_count,
        row_length,
        consumed,
    }
}
