// Runtime-detected SIMD fast path: prefix-XOR parity tracking for quoted
// regions, and bitmask-then-trailing_zeros extraction of structural byte
// positions. Uses stable `std::arch` intrinsics behind
// `is_x86_feature_detected!` and falls back to the scalar oracle
// (`super::scalar`) whenever no suitable vector extension is available at
// runtime, including on every non-x86_64 target.

use crate::dialect::Dialect;
use crate::error::Error;

use super::scalar::scan_row_scalar;
use super::RowResult;

const CHUNK: usize = 16;

/// True if this process can use the vectorized structural scan on the
/// current CPU. Checked fresh on every call rather than cached in a
/// static.
#[inline]
pub(crate) fn is_fast_path_available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("sse2")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Prefix-XOR via shift-and-xor cascade, restricted to the low 16 bits
/// used by our chunk width. Bit i of the result is set iff position i is
/// inside a quoted region (an odd number of quote bytes precede it).
#[inline]
fn prefix_xor16(mut x: u32) -> u32 {
    x ^= x << 1;
    x ^= x << 2;
    x ^= x << 4;
    x ^= x << 8;
    x & 0xFFFF
}

#[inline]
fn extract_positions(mut mask: u32, base: usize, out: &mut Vec<usize>) {
    while mask != 0 {
        let bit = mask.trailing_zeros() as usize;
        out.push(base + bit);
        mask &= mask - 1;
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn chunk_masks_sse2(chunk: &[u8; CHUNK], quote: u8, delimiter: u8) -> (u32, u32, u32, u32) {
    use std::arch::x86_64::*;
    // SAFETY: `is_fast_path_available` confirmed sse2 support before this
    // is ever called.
    unsafe {
        let data = _mm_loadu_si128(chunk.as_ptr() as *const __m128i);
        let quote_v = _mm_set1_epi8(quote as i8);
        let delim_v = _mm_set1_epi8(delimiter as i8);
        let lf_v = _mm_set1_epi8(b'\n' as i8);
        let cr_v = _mm_set1_epi8(b'\r' as i8);

        let quote_mask = _mm_movemask_epi8(_mm_cmpeq_epi8(data, quote_v)) as u32 & 0xFFFF;
        let delim_mask = _mm_movemask_epi8(_mm_cmpeq_epi8(data, delim_v)) as u32 & 0xFFFF;
        let lf_mask = _mm_movemask_epi8(_mm_cmpeq_epi8(data, lf_v)) as u32 & 0xFFFF;
        let cr_mask = _mm_movemask_epi8(_mm_cmpeq_epi8(data, cr_v)) as u32 & 0xFFFF;

        (quote_mask, delim_mask, lf_mask, cr_mask)
    }
}

/// Structural index of one row: every quote/delimiter/terminator byte
/// position within it, plus the quoted-region parity at each scanned
/// position.
#[cfg(target_arch = "x86_64")]
struct Structural {
    quote_positions: Vec<usize>,
    delimiter_positions: Vec<usize>,
    terminator_positions: Vec<usize>, // LF or CR positions
    quoted: Vec<bool>,                // per scanned byte: inside a quoted region?
}

/// Scans `window` chunk by chunk, stopping as soon as an unquoted
/// terminator is found. `window` is always the *entire remaining* input
/// suffix (every caller re-passes `&input[pos..]`), so scanning past the
/// current row's end would cost O(remaining input) on every single row
/// instead of O(one row). Stopping here is what keeps a full parse
/// linear in the input size rather than quadratic.
#[cfg(target_arch = "x86_64")]
fn build_structural(window: &[u8], dialect: &Dialect) -> Structural {
    let len = window.len();
    let mut quote_positions = Vec::new();
    let mut delimiter_positions = Vec::new();
    let mut terminator_positions = Vec::new();
    let mut quoted = Vec::new();

    let mut pos = 0usize;
    let mut carry: u32 = 0; // 0 or 1: quote parity carried from previous chunk

    while pos + CHUNK <= len {
        let mut buf = [0u8; CHUNK];
        buf.copy_from_slice(&window[pos..pos + CHUNK]);
        let (quote_mask, delim_mask, lf_mask, cr_mask) =
            chunk_masks_sse2(&buf, dialect.quote, dialect.delimiter);

        let raw = prefix_xor16(quote_mask);
        // Bit i of `quoted_mask` is 1 iff byte i lies inside a quoted
        // region (toggled an odd number of times so far, including this
        // chunk's own quote at i contributing its toggle before i itself).
        let quoted_mask = raw ^ (0u32.wrapping_sub(carry) & 0xFFFF);
        carry ^= quote_mask.count_ones() & 1;

        for i in 0..CHUNK {
            quoted.push((quoted_mask >> i) & 1 == 1);
        }

        let unquoted_delim = delim_mask & !quoted_mask;
        let unquoted_term = (lf_mask | cr_mask) & !quoted_mask;

        extract_positions(quote_mask, pos, &mut quote_positions);
        extract_positions(unquoted_delim, pos, &mut delimiter_positions);
        extract_positions(unquoted_term, pos, &mut terminator_positions);

        pos += CHUNK;

        if !terminator_positions.is_empty() {
            // Row end found in this chunk; the rest of `window` belongs to
            // later rows and is scanned on a later call.
            return Structural {
                quote_positions,
                delimiter_positions,
                terminator_positions,
                quoted,
            };
        }
    }

    // No terminator in any full chunk. Either this row's terminator falls
    // in the final partial chunk, or (only possible for the last row of
    // the whole input) there is none at all. Either way the remainder is
    // short (< CHUNK bytes) unless this really is the terminator-less
    // final row, so the scalar tail below costs at most one chunk in the
    // common case.
    let mut in_quotes = carry == 1;
    while pos < len {
        let c = window[pos];
        quoted.push(in_quotes);
        if c == dialect.quote {
            quote_positions.push(pos);
            in_quotes = !in_quotes;
        } else if !in_quotes && c == dialect.delimiter {
            delimiter_positions.push(pos);
        } else if !in_quotes && (c == b'\n' || c == b'\r') {
            terminator_positions.push(pos);
            pos += 1;
            break;
        }
        pos += 1;
    }

    Structural {
        quote_positions,
        delimiter_positions,
        terminator_positions,
        quoted,
    }
}

/// Scan one row using the vectorized structural index, falling back to the
/// scalar oracle whenever a quote appears before the row's terminator (in
/// either strictness mode): the malformed-quote checks and the lenient
/// literal-continuation rule are simplest to hand off entirely to the
/// well-tested scalar path rather than duplicate in the vector path.
#[cfg(target_arch = "x86_64")]
pub(crate) fn scan_row_simd(
    window: &[u8],
    dialect: &Dialect,
    row: usize,
    starts: &mut [u32],
    lengths: &mut [u32],
) -> Result<RowResult, Error> {
    if window.is_empty() {
        return Ok(RowResult::empty());
    }

    // Look for whichever comes first: a quote, or a terminator byte. This
    // bounds the check to the current row (like `build_structural` below)
    // instead of scanning the whole remaining input on every call.
    if let Some(p) = memchr::memchr3(dialect.quote, b'\n', b'\r', window) {
        if window[p] == dialect.quote {
            return scan_row_scalar(window, dialect, row, starts, lengths);
        }
    }

    // No quote precedes the row's terminator (or appears anywhere in a
    // terminator-less trailing window), so every position up to
    // `content_end` is unquoted and an unterminated-quote condition
    // cannot arise here; it would already have been handed to
    // `scan_row_scalar` above.
    let structural = build_structural(window, dialect);
    let row_end = structural.terminator_positions.first().copied();
    let content_end = row_end.unwrap_or(window.len());

    let mut column_count = 0usize;
    let mut current_start = 0usize;
    for &sep in structural
        .delimiter_positions
        .iter()
        .take_while(|&&p| p < content_end)
    {
        if column_count >= dialect.max_columns || column_count >= starts.len() {
            return Err(Error::TooManyColumns {
                row,
                max: dialect.max_columns,
            });
        }
        starts[column_count] = current_start as u32;
        lengths[column_count] = (sep - current_start) as u32;
        column_count += 1;
        current_start = sep + 1;
    }

    if column_count >= dialect.max_columns || column_count >= starts.len() {
        return Err(Error::TooManyColumns {
            row,
            max: dialect.max_columns,
        });
    }
    starts[column_count] = current_start as u32;
    lengths[column_count] = (content_end - current_start) as u32;
    column_count += 1;

    let consumed = match row_end {
        None => content_end,
        Some(p) if window[p] == b'\r' && p + 1 < window.len() && window[p + 1] == b'\n' => p + 2,
        Some(p) => p + 1,
    };

    Ok(RowResult {
        column_count,
        row_length: content_end,
        consumed,
    })
}

#[cfg(not(target_arch = "x86_64"))]
pub(crate) fn scan_row_simd(
    window: &[u8],
    dialect: &Dialect,
    row: usize,
    starts: &mut [u32],
    lengths: &mut [u32],
) -> Result<RowResult, Error> {
    scan_row_scalar(window, dialect, row, starts, lengths)
}

#[cfg(all(test, target_arch = "x86_64"))]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, Strictness};

    fn compare(input: &[u8]) {
        let dialect = Dialect::csv();
        let mut s1 = [0u32; 32];
        let mut l1 = [0u32; 32];
        let mut s2 = [0u32; 32];
        let mut l2 = [0u32; 32];
        let scalar = scan_row_scalar(input, &dialect, 1, &mut s1, &mut l1);
        let simd = scan_row_simd(input, &dialect, 1, &mut s2, &mut l2);
        assert_eq!(scalar, simd, "divergence on {:?}", String::from_utf8_lossy(input));
        if let (Ok(a), Ok(_b)) = (&scalar, &simd) {
            assert_eq!(&s1[..a.column_count], &s2[..a.column_count]);
            assert_eq!(&l1[..a.column_count], &l2[..a.column_count]);
        }
    }

    #[test]
    fn agrees_on_unquoted_rows_longer_than_one_chunk() {
        compare(b"aaaaaaaaaaaaaaaaaaaaaaa,b,c\n");
        compare(b"1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18\n");
    }

    #[test]
    fn agrees_on_empty_and_short_rows() {
        compare(b"");
        compare(b"a,b,c");
        compare(b"a,b,c\n");
    }

    #[test]
    fn agrees_and_defers_on_quoted_rows() {
        compare(b"\"a,b\",c\n");
        compare(b"\"say \"\"hi\"\"\",c\n");
    }

    #[test]
    fn agrees_on_lenient_malformed_quote_continuation() {
        // A quoted field followed by a stray byte before the delimiter: in
        // lenient mode the scalar oracle folds the rest of the row into
        // one literal field. The vector path must defer to it rather than
        // closing the quoted region early and splitting on the comma.
        let dialect = Dialect::csv().with_strictness(Strictness::Lenient);
        let mut s1 = [0u32; 32];
        let mut l1 = [0u32; 32];
        let mut s2 = [0u32; 32];
        let mut l2 = [0u32; 32];
        let input = b"\"abc\"x,y\n";
        let scalar = scan_row_scalar(input, &dialect, 1, &mut s1, &mut l1).unwrap();
        let simd = scan_row_simd(input, &dialect, 1, &mut s2, &mut l2).unwrap();
        assert_eq!(scalar, simd);
        assert_eq!(scalar.column_count, 1);
    }

    #[test]
    fn does_not_rescan_past_the_first_row_of_a_large_window() {
        // A large remaining window (simulating a caller re-passing
        // `&input[pos..]` on every row) whose second row is enormous. If
        // the first row's scan touched any of it, this would be slow
        // enough in debug builds to make the test suite noticeably
        // sluggish; instead it should return almost immediately.
        let mut window = Vec::from(&b"a,b,c\n"[..]);
        window.extend(std::iter::repeat(b'x').take(50_000_000));
        let dialect = Dialect::csv().with_has_header(false);
        let mut starts = [0u32; 8];
        let mut lengths = [0u32; 8];
        let result = scan_row_simd(&window, &dialect, 1, &mut starts, &mut lengths).unwrap();
        assert_eq!(result.column_count, 3);
        assert_eq!(result.consumed, 6);
    }
}
