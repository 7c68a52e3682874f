// Error taxonomy. No unwrap/expect on any path that can observe untrusted
// input; fallible paths use `?` against this enum.

use std::fmt;

/// A 1-based row or column position, when the scanner/binder can attribute
/// the error to one. Internal indices are 0-based throughout; this is the
/// boundary conversion point.
pub type Position = Option<usize>;

/// Every error the core can raise, across scanning, decoding, and binding.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("row {row} has more than {max} columns")]
    TooManyColumns { row: usize, max: usize },

    #[error("unterminated quote starting in row {row}, column {column}")]
    UnterminatedQuote { row: usize, column: usize },

    #[error("malformed quoted field in row {row}, column {column}: unexpected byte after closing quote")]
    MalformedQuotedField { row: usize, column: usize },

    #[error("quote character found inside unquoted field in row {row}, column {column}")]
    QuoteInUnquotedField { row: usize, column: usize },

    #[error("row {row} is shorter than the declared fixed-width layout")]
    RowTooShort { row: usize },

    #[error("row {row} has no column at position {column}")]
    ColumnOutOfRange { row: usize, column: usize },

    #[error("invalid integer in row {row}, column {column}: {text:?}")]
    InvalidInteger {
        row: usize,
        column: usize,
        text: String,
    },

    #[error("invalid float in row {row}, column {column}: {text:?}")]
    InvalidFloat {
        row: usize,
        column: usize,
        text: String,
    },

    #[error("invalid boolean in row {row}, column {column}: {text:?}")]
    InvalidBoolean {
        row: usize,
        column: usize,
        text: String,
    },

    #[error("invalid date/time in row {row}, column {column}: {text:?}")]
    InvalidDateTime {
        row: usize,
        column: usize,
        text: String,
    },

    #[error("member {member:?} could not be mapped to any column")]
    UnmappedMember { member: String },

    #[error("member {member:?} has a scalar type with no registered converter")]
    UnsupportedMemberType { member: String },

    #[error("dialect is invalid: {reason}")]
    InvalidDialect { reason: &'static str },
}

/// A single member/column conversion failure surfaced by the binder, as an
/// alternative to aborting the whole row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub member: String,
    pub kind: Error,
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conversion failed for member {:?}: {}", self.member, self.kind)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
