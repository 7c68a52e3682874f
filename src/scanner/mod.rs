// Scanner. Transforms a borrowed input window into row descriptors
// without copying field bytes. The scalar state machine is the
// correctness oracle; the SIMD path must match it byte-for-byte whenever
// the running CPU supports the required extension.

mod scalar;
mod simd;

use crate::dialect::Dialect;
use crate::error::Error;

/// Outcome of scanning one row: how many columns were found, how long the
/// row's content is (excluding the terminator), and how many input bytes
/// were consumed in total (including a swallowed terminator, if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowResult {
    pub column_count: usize,
    pub row_length: usize,
    pub consumed: usize,
}

impl RowResult {
    /// A row result for a window with no remaining input at all.
    pub(crate) fn empty() -> Self {
        RowResult {
            column_count: 0,
            row_length: 0,
            consumed: 0,
        }
    }
}

/// Parse at most one row starting at `window[0]`. `starts`/`lengths` are
/// caller-provided scratch arrays of length >= `dialect.max_columns`;
/// entries `0..column_count` are filled with byte offsets/lengths relative
/// to the start of the row. `row` is the 1-based row number this call is
/// attempting; it has no effect on parsing and is only used to attribute
/// errors.
///
/// Dispatches to a runtime-detected vector fast path when available,
/// falling back to the scalar state machine otherwise. The choice is made
/// fresh on every call against the running CPU's capabilities rather than
/// baked in at compile time.
pub fn scan_row(
    window: &[u8],
    dialect: &Dialect,
    row: usize,
    starts: &mut [u32],
    lengths: &mut [u32],
) -> Result<RowResult, Error> {
    if starts.len() < dialect.max_columns || lengths.len() < dialect.max_columns {
        log::warn!(
            "scratch arrays shorter than dialect.max_columns ({} < {})",
            starts.len().min(lengths.len()),
            dialect.max_columns
        );
    }
    if simd::is_fast_path_available() {
        simd::scan_row_simd(window, dialect, row, starts, lengths)
    } else {
        scalar::scan_row_scalar(window, dialect, row, starts, lengths)
    }
}

/// Always uses the scalar state machine, regardless of CPU capability.
/// Exposed for the SIMD/scalar equivalence property tests and for callers
/// that want a reproducible reference path.
pub fn scan_row_reference(
    window: &[u8],
    dialect: &Dialect,
    row: usize,
    starts: &mut [u32],
    lengths: &mut [u32],
) -> Result<RowResult, Error> {
    scalar::scan_row_scalar(window, dialect, row, starts, lengths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    #[test]
    fn scalar_and_dispatched_agree_on_basic_row() {
        let dialect = Dialect::csv();
        let input = b"A,B,C\n1,2,3\n4,5,6";
        let mut s1 = [0u32; 8];
        let mut l1 = [0u32; 8];
        let mut s2 = [0u32; 8];
        let mut l2 = [0u32; 8];
        let a = scan_row(input, &dialect, 1, &mut s1, &mut l1).unwrap();
        let b = scan_row_reference(input, &dialect, 1, &mut s2, &mut l2).unwrap();
        assert_eq!(a, b);
        assert_eq!(s1, s2);
        assert_eq!(l1, l2);
    }
}
