// Parallel row decode. A caller who already knows rows don't span a
// partition boundary can split on any `\n`/`\r\n` outside quotes, but
// finding those boundaries safely still requires the quote-aware scanner,
// which is inherently sequential. What parallelizes is decoding: once
// boundaries are known, unquoting/unescaping each row's fields is
// independent of every other row.

use rayon::prelude::*;

use crate::dialect::Dialect;
use crate::error::Error;
use crate::row_view::ColumnView;
use crate::scanner::scan_row;

/// One row, decoded and owned so it can cross a thread boundary.
pub type OwnedRow = Vec<Vec<u8>>;

struct RowBoundary {
    start: usize,
    starts: Vec<u32>,
    lengths: Vec<u32>,
}

/// Scan `input` for row boundaries single-threaded, then decode each
/// row's fields across a rayon thread pool. Row order in the returned
/// `Vec` always matches input order, even though decoding runs out of
/// order across threads.
pub fn parse_rows_parallel(input: &[u8], dialect: &Dialect) -> Result<Vec<OwnedRow>, Error> {
    let boundaries = find_row_boundaries(input, dialect)?;

    Ok(boundaries
        .into_par_iter()
        .map(|b| {
            b.starts
                .iter()
                .zip(b.lengths.iter())
                .map(|(&rel_start, &len)| {
                    let start = b.start + rel_start as usize;
                    let end = start + len as usize;
                    ColumnView::new(&input[start..end])
                        .decode_text(dialect.quote)
                        .into_owned()
                })
                .collect()
        })
        .collect())
}

fn find_row_boundaries(input: &[u8], dialect: &Dialect) -> Result<Vec<RowBoundary>, Error> {
    let mut boundaries = Vec::new();
    let mut pos = 0usize;
    let mut starts = vec![0u32; dialect.max_columns];
    let mut lengths = vec![0u32; dialect.max_columns];

    while pos < input.len() {
        let window = &input[pos..];
        let result = scan_row(window, dialect, boundaries.len() + 1, &mut starts, &mut lengths)?;
        if result.consumed == 0 && result.column_count == 0 {
            break;
        }
        boundaries.push(RowBoundary {
            start: pos,
            starts: starts[..result.column_count].to_vec(),
            lengths: lengths[..result.column_count].to_vec(),
        });
        pos += result.consumed;
    }

    Ok(boundaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> Dialect {
        Dialect::csv().with_has_header(false)
    }

    #[test]
    fn decodes_rows_in_input_order() {
        let input = b"a,b,c\n1,2,3\n4,5,6\n";
        let rows = parse_rows_parallel(input, &dialect()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(rows[2], vec![b"4".to_vec(), b"5".to_vec(), b"6".to_vec()]);
    }

    #[test]
    fn quoted_newline_does_not_split_a_row() {
        let input = b"a,\"line1\nline2\",c\nd,e,f\n";
        let rows = parse_rows_parallel(input, &dialect()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], b"line1\nline2".to_vec());
    }

    #[test]
    fn many_rows_decode_in_declared_order() {
        let mut input = Vec::new();
        for i in 0..1000 {
            input.extend_from_slice(format!("{},{},{}\n", i, i + 1, i + 2).as_bytes());
        }
        let rows = parse_rows_parallel(&input, &dialect()).unwrap();
        assert_eq!(rows.len(), 1000);
        assert_eq!(rows[0][0], b"0".to_vec());
        assert_eq!(rows[999][0], b"999".to_vec());
    }

    #[test]
    fn quoted_field_containing_the_delimiter_survives_parallel_decode() {
        let input = b"a,\"b,c\",d\n";
        let rows = parse_rows_parallel(input, &dialect()).unwrap();
        assert_eq!(rows[0], vec![b"a".to_vec(), b"b,c".to_vec(), b"d".to_vec()]);
    }
}
