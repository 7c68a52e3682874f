// Dialect detector. Samples a prefix of the input with the scanner under
// each candidate delimiter and scores consistency across rows. No
// allocation beyond the result; no side effects.

use crate::dialect::{Dialect, Strictness, TerminatorPolicy};
use crate::scanner::scan_row;

/// Per-candidate diagnostics plus the chosen delimiter.
#[derive(Debug, Clone)]
pub struct DelimiterDetectionResult {
    pub chosen: u8,
    pub scores: Vec<CandidateScore>,
}

#[derive(Debug, Clone, Copy)]
pub struct CandidateScore {
    pub delimiter: u8,
    pub score: f64,
    pub mean_count: f64,
    pub total_rows_sampled: usize,
}

/// Score a candidate by consistency of its per-row delimiter count:
/// perfect consistency (every sampled row has the same count) scores 100;
/// score decreases monotonically with variance. Chosen as a bounded,
/// monotone penalty (see DESIGN.md) so that a single outlier row in a
/// reasonably sized sample costs a small, legible amount of score rather
/// than collapsing it to zero.
fn score_counts(counts: &[usize]) -> (f64, f64) {
    if counts.is_empty() {
        return (0.0, 0.0);
    }
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<usize>() as f64 / n;
    let variance = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    // Penalty factor chosen so a variance of 1.0 (e.g. one row off by one
    // in an otherwise-uniform sample) costs roughly 12 points; variance
    // saturates the penalty at 0 score once it reaches ~8.3.
    const PENALTY_FACTOR: f64 = 12.0;
    let score = (100.0 - variance * PENALTY_FACTOR).max(0.0);
    (score, mean)
}

/// Scan up to `max_rows` rows of `sample` under each candidate delimiter,
/// counting per-row delimiter occurrences and scoring consistency. Ties
/// break on higher mean count, then on candidate order.
pub fn detect(sample: &[u8], candidates: &[u8], max_rows: usize) -> DelimiterDetectionResult {
    let mut scores = Vec::with_capacity(candidates.len());

    for &candidate in candidates {
        let dialect = match Dialect::new(
            candidate,
            b'"',
            false,
            TerminatorPolicy::Any,
            Strictness::Lenient,
            4096,
        ) {
            Ok(d) => d,
            Err(_) => {
                // Collides with the default quote char; not a valid
                // delimiter candidate, score it at zero rather than guess.
                scores.push(CandidateScore {
                    delimiter: candidate,
                    score: 0.0,
                    mean_count: 0.0,
                    total_rows_sampled: 0,
                });
                continue;
            }
        };

        let mut counts = Vec::with_capacity(max_rows);
        let mut pos = 0usize;
        let mut starts = vec![0u32; dialect.max_columns];
        let mut lengths = vec![0u32; dialect.max_columns];

        while pos < sample.len() && counts.len() < max_rows {
            match scan_row(&sample[pos..], &dialect, counts.len() + 1, &mut starts, &mut lengths) {
                Ok(result) if result.consumed == 0 => break,
                Ok(result) => {
                    // Delimiter occurrences in a row with N columns is N-1.
                    counts.push(result.column_count.saturating_sub(1));
                    pos += result.consumed;
                }
                Err(_) => break,
            }
        }

        let (score, mean) = score_counts(&counts);
        scores.push(CandidateScore {
            delimiter: candidate,
            score,
            mean_count: mean,
            total_rows_sampled: counts.len(),
        });
    }

    let chosen = scores
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.mean_count.partial_cmp(&b.mean_count).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| ib.cmp(ia)) // earlier candidate order wins ties
        })
        .map(|(_, c)| c.delimiter)
        .unwrap_or(b',');

    log::debug!("dialect detector chose delimiter {:?}", chosen as char);

    DelimiterDetectionResult { chosen, scores }
}
