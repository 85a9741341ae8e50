/*!
The pairwise alignment boundary.
The resolver only depends on the `AlignmentEngine` trait, which returns a structured `EngineAlignment` (or `None` on failure).
`GlocalAligner` is the bundled engine: an affine-gap fitting alignment where the whole primer must align and the reference ends are free.
```rust
use primal_tiling::sequence_alignment::{AlignmentEngine, AlignmentScoring, GlocalAligner};
let result = GlocalAligner.align(b"TTTTACGTACGTTTTT", b"ACGTACGT", &AlignmentScoring::default()).unwrap();
assert_eq!(result.ref_start, 4);
assert_eq!(result.ref_end, 11);
assert_eq!(result.full_primer_identity, 100.0);
```
*/

use crate::sequence_utils::GAP;

/// Scores used by the alignment engine; gaps cost `gap_open` for the first position and `gap_extend` for each additional one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlignmentScoring {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32
}

impl Default for AlignmentScoring {
    fn default() -> Self {
        Self {
            match_score: 2,
            mismatch_score: -1,
            gap_open: -2,
            gap_extend: -1
        }
    }
}

/// Structured result of one engine call
#[derive(Clone, Debug, PartialEq)]
pub struct EngineAlignment {
    /// First reference position covered by the alignment
    pub ref_start: usize,
    /// Last reference position covered by the alignment (inclusive)
    pub ref_end: usize,
    /// Matches over the full primer length, as a percentage
    pub full_primer_identity: f64,
    /// Matches over the aligned columns, as a percentage
    pub aligned_region_identity: f64,
    /// Full-width reference row, gaps inserted where the primer has extra bases
    pub aligned_ref: Vec<u8>,
    /// Full-width primer row, padded with gaps outside the aligned span
    pub aligned_query: Vec<u8>
}

/// A glocal pairwise aligner; the caller handles strand orientation and coordinate mapping.
pub trait AlignmentEngine {
    /// Aligns the full `primer` somewhere inside `reference`.
    /// Returns `None` when no alignment could be produced.
    /// # Arguments
    /// * `reference` - the sequence to search, already in the primer's strand sense
    /// * `primer` - the primer sequence
    /// * `scoring` - the scoring scheme
    fn align(&self, reference: &[u8], primer: &[u8], scoring: &AlignmentScoring) -> Option<EngineAlignment>;
}

// traceback bits
const M_FROM_MASK: u8 = 0b0011;
const FROM_M: u8 = 0;
const FROM_I: u8 = 1;
const FROM_D: u8 = 2;
const I_EXTENDS: u8 = 0b0100;
const D_EXTENDS: u8 = 0b1000;

const NEG_INF: i32 = i32::MIN / 4;

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    Match,
    Insertion,
    Deletion
}

/// Gotoh affine-gap fitting alignment.
/// Rows walk the primer, columns walk the reference; the first row and the last row are free in the reference dimension.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlocalAligner;

impl AlignmentEngine for GlocalAligner {
    fn align(&self, reference: &[u8], primer: &[u8], scoring: &AlignmentScoring) -> Option<EngineAlignment> {
        let m = primer.len();
        let n = reference.len();
        if m == 0 || n == 0 {
            return None;
        }

        let width = n + 1;
        let mut traceback: Vec<u8> = vec![0; (m + 1) * width];

        // rolling rows: M ends in a primer/reference pair, I in a primer base against a gap, D in a reference base against a gap
        let mut prev_m: Vec<i32> = vec![0; width];
        let mut prev_i: Vec<i32> = vec![NEG_INF; width];
        let mut prev_d: Vec<i32> = vec![NEG_INF; width];
        let mut curr_m: Vec<i32> = vec![NEG_INF; width];
        let mut curr_i: Vec<i32> = vec![NEG_INF; width];
        let mut curr_d: Vec<i32> = vec![NEG_INF; width];

        for i in 1..=m {
            let p = primer[i - 1];
            curr_m[0] = NEG_INF;
            curr_d[0] = NEG_INF;
            curr_i[0] = scoring.gap_open + (i as i32 - 1) * scoring.gap_extend;
            if i > 1 {
                traceback[i * width] = I_EXTENDS;
            }

            for j in 1..=n {
                let mut bits = 0;

                // diagonal
                let substitution = if p == reference[j - 1] { scoring.match_score } else { scoring.mismatch_score };
                let (mut best_prev, mut from) = (prev_m[j - 1], FROM_M);
                if prev_i[j - 1] > best_prev {
                    best_prev = prev_i[j - 1];
                    from = FROM_I;
                }
                if prev_d[j - 1] > best_prev {
                    best_prev = prev_d[j - 1];
                    from = FROM_D;
                }
                curr_m[j] = best_prev.saturating_add(substitution).max(NEG_INF);
                bits |= from;

                // primer base against a reference gap
                let open_i = prev_m[j].saturating_add(scoring.gap_open);
                let extend_i = prev_i[j].saturating_add(scoring.gap_extend);
                if extend_i > open_i {
                    curr_i[j] = extend_i;
                    bits |= I_EXTENDS;
                } else {
                    curr_i[j] = open_i.max(NEG_INF);
                }

                // reference base against a primer gap
                let open_d = curr_m[j - 1].saturating_add(scoring.gap_open);
                let extend_d = curr_d[j - 1].saturating_add(scoring.gap_extend);
                if extend_d > open_d {
                    curr_d[j] = extend_d;
                    bits |= D_EXTENDS;
                } else {
                    curr_d[j] = open_d.max(NEG_INF);
                }

                traceback[i * width + j] = bits;
            }

            std::mem::swap(&mut prev_m, &mut curr_m);
            std::mem::swap(&mut prev_i, &mut curr_i);
            std::mem::swap(&mut prev_d, &mut curr_d);
        }

        // free trailing reference: best end anywhere in the last row, leftmost wins ties
        let mut best: Option<(i32, usize, State)> = None;
        for j in 1..=n {
            for (score, state) in [(prev_m[j], State::Match), (prev_i[j], State::Insertion)] {
                if best.map_or(true, |(b, _, _)| score > b) {
                    best = Some((score, j, state));
                }
            }
        }
        let (_score, end_j, mut state) = best?;

        // trace back to the first row
        let mut query_part: Vec<u8> = vec![];
        let mut ref_part: Vec<u8> = vec![];
        let mut i = m;
        let mut j = end_j;
        while i > 0 {
            let bits = traceback[i * width + j];
            match state {
                State::Match => {
                    query_part.push(primer[i - 1]);
                    ref_part.push(reference[j - 1]);
                    state = match bits & M_FROM_MASK {
                        FROM_I => State::Insertion,
                        FROM_D => State::Deletion,
                        _ => State::Match
                    };
                    i -= 1;
                    j -= 1;
                },
                State::Insertion => {
                    query_part.push(primer[i - 1]);
                    ref_part.push(GAP);
                    state = if bits & I_EXTENDS != 0 { State::Insertion } else { State::Match };
                    i -= 1;
                },
                State::Deletion => {
                    query_part.push(GAP);
                    ref_part.push(reference[j - 1]);
                    state = if bits & D_EXTENDS != 0 { State::Deletion } else { State::Match };
                    j -= 1;
                }
            }
        }
        let start_j = j;
        if end_j <= start_j {
            // nothing in the reference was consumed
            return None;
        }
        query_part.reverse();
        ref_part.reverse();

        let matches = query_part.iter().zip(ref_part.iter())
            .filter(|(&q, &r)| q == r && q != GAP)
            .count();
        let columns = query_part.len();

        let mut aligned_ref = Vec::with_capacity(n + columns);
        aligned_ref.extend_from_slice(&reference[..start_j]);
        aligned_ref.extend_from_slice(&ref_part);
        aligned_ref.extend_from_slice(&reference[end_j..]);

        let mut aligned_query = vec![GAP; start_j];
        aligned_query.extend_from_slice(&query_part);
        aligned_query.resize(aligned_ref.len(), GAP);

        Some(EngineAlignment {
            ref_start: start_j,
            ref_end: end_j - 1,
            full_primer_identity: 100.0 * matches as f64 / m as f64,
            aligned_region_identity: 100.0 * matches as f64 / columns as f64,
            aligned_ref,
            aligned_query
        })
    }
}
