/*!
The result of aligning one primer against one reference, mapped back into forward reference coordinates.
A failed attempt (engine failure, identity below the threshold, or over the cell budget) keeps every field unset; it still counts as an attempt.
If the 3'-terminal primer base and the complemented template base form a disallowed pair, the identity is forced to 0.

# Example usage
```rust
use primal_tiling::primer::{Direction, PrimerRecord};
use primal_tiling::reference::Reference;
use primal_tiling::reference_alignment::ReferenceAlignment;
use primal_tiling::resolver_config::AlignmentConfig;
use primal_tiling::sequence_alignment::GlocalAligner;
use primal_tiling::thermo::NearestNeighborThermo;

let thermo = NearestNeighborThermo::default();
let primer = PrimerRecord::new(Direction::Left, "p_LEFT", b"ACGTTGCA".to_vec(), &thermo).unwrap();
let reference = Reference::new("ref1", b"GGGGGACGTTGCAGGGGG".to_vec()).unwrap();

let alignment = ReferenceAlignment::new(&primer, &reference, &GlocalAligner, &AlignmentConfig::default());
assert_eq!(alignment.start(), Some(5));
assert_eq!(alignment.end(), Some(13));
assert_eq!(alignment.percent_identity(), Some(100.0));
assert_eq!(alignment.mm_3prime(), Some(false));
```
*/

use rustc_hash::FxHashSet as HashSet;
use std::fmt;

use crate::primer::{Direction, PrimerRecord};
use crate::reference::Reference;
use crate::resolver_config::AlignmentConfig;
use crate::sequence_alignment::{AlignmentEngine, EngineAlignment};
use crate::sequence_utils::{complement, GAP};

/// Names longer than this are cut in the display block
const DISPLAY_NAME_WIDTH: usize = 30;

/// An unordered pair of bases
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BasePair(u8, u8);

impl BasePair {
    /// Constructor, order of the arguments does not matter
    pub fn new(a: u8, b: u8) -> BasePair {
        if a <= b {
            BasePair(a, b)
        } else {
            BasePair(b, a)
        }
    }
}

/// Table of primer/template base pairs that are not tolerated at the primer's 3' end.
/// Pairs are compared as (primer base, complement of the reference base), so a perfect match is always a Watson-Crick pair.
#[derive(Clone, Debug, PartialEq)]
pub struct MismatchTable {
    pairs: HashSet<BasePair>
}

impl MismatchTable {
    /// Creates a table from a list of unordered pairs
    pub fn new(pairs: &[(u8, u8)]) -> MismatchTable {
        MismatchTable {
            pairs: pairs.iter().map(|&(a, b)| BasePair::new(a, b)).collect()
        }
    }

    /// A table that never penalizes
    pub fn empty() -> MismatchTable {
        MismatchTable {
            pairs: Default::default()
        }
    }

    pub fn contains(&self, a: u8, b: u8) -> bool {
        self.pairs.contains(&BasePair::new(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Default for MismatchTable {
    fn default() -> Self {
        // purine-purine and C-C pairs are the poorest extended
        MismatchTable::new(&[(b'A', b'G'), (b'G', b'G'), (b'A', b'A'), (b'C', b'C')])
    }
}

/// Everything known about a successful alignment
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentDetails {
    /// Start in forward reference coordinates; for RIGHT primers this is the larger coordinate
    start: usize,
    /// End in forward reference coordinates (exclusive for LEFT, counted from the far end for RIGHT)
    end: usize,
    length: usize,
    /// Full-primer identity, or 0 if the 3' rule fired
    percent_identity: f64,
    aligned_query: Vec<u8>,
    aligned_ref: Vec<u8>,
    aligned_ref_complement: Vec<u8>,
    ref_id: String,
    mm_3prime: bool,
    /// '|' for a match, '*' for a mismatch, ' ' for a gap
    marker: String,
    formatted: String
}

/// One attempted alignment of a primer to a reference
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceAlignment {
    /// None when the attempt failed
    details: Option<AlignmentDetails>,
    /// True if the attempt was skipped because it exceeded the configured cell budget
    over_budget: bool
}

impl ReferenceAlignment {
    /// A failed attempt with every field unset
    pub fn failed() -> ReferenceAlignment {
        Default::default()
    }

    /// Aligns a primer against one reference.
    /// LEFT primers are aligned against the forward strand and RIGHT primers against the reverse complement, so both are in the primer's sense.
    /// # Arguments
    /// * `primer` - the primer to align
    /// * `reference` - the reference to align against
    /// * `aligner` - the alignment engine
    /// * `config` - scoring, identity threshold, and 3' mismatch table
    pub fn new<A: AlignmentEngine + ?Sized>(primer: &PrimerRecord, reference: &Reference, aligner: &A, config: &AlignmentConfig) -> ReferenceAlignment {
        let target = match primer.direction() {
            Direction::Left => reference.sequence(),
            Direction::Right => reference.reverse_complement()
        };

        if let Some(max_cells) = config.max_alignment_cells {
            if primer.length().saturating_mul(target.len()) > max_cells {
                return ReferenceAlignment {
                    details: None,
                    over_budget: true
                };
            }
        }

        let result = aligner.align(target, primer.sequence(), &config.scoring);
        Self::from_engine_result(primer, reference.id(), reference.len(), result, config)
    }

    /// Builds the alignment from a raw engine result.
    /// # Arguments
    /// * `primer` - the primer that was aligned
    /// * `ref_id` - the reference identifier
    /// * `reference_length` - length of the reference, needed to map RIGHT primers back to the forward strand
    /// * `result` - the engine output, None if the engine failed
    /// * `config` - identity threshold and 3' mismatch table
    pub fn from_engine_result(primer: &PrimerRecord, ref_id: &str, reference_length: usize, result: Option<EngineAlignment>, config: &AlignmentConfig) -> ReferenceAlignment {
        let result = match result {
            Some(r) if r.full_primer_identity >= config.min_percent_identity => r,
            _ => return Self::failed()
        };

        // the engine reports an inclusive end
        let ref_start = result.ref_start;
        let ref_end = result.ref_end + 1;

        let (start, end, length) = match primer.direction() {
            Direction::Left => (ref_start, ref_end, ref_end - ref_start),
            Direction::Right => {
                // aligned on the reverse complement, so count from the far end
                let start = reference_length.saturating_sub(ref_start);
                let end = reference_length.saturating_sub(ref_end);
                (start, end, start - end)
            }
        };

        let (row_start, row_end) = row_span(&result.aligned_query, ref_start, ref_end);
        let aligned_query = slice_row(&result.aligned_query, row_start, row_end);
        let aligned_ref = slice_row(&result.aligned_ref, row_start, row_end);
        let aligned_ref_complement = complement(&aligned_ref);

        let marker: String = aligned_query.iter().zip(aligned_ref.iter())
            .map(|(&q, &r)| {
                if q == GAP || r == GAP {
                    ' '
                } else if q != r {
                    '*'
                } else {
                    '|'
                }
            })
            .collect();

        let mm_3prime = match (aligned_query.last(), aligned_ref_complement.last()) {
            (Some(&q), Some(&r)) => config.disallowed_3prime.contains(q, r),
            _ => false
        };
        let percent_identity = if mm_3prime { 0.0 } else { result.full_primer_identity };

        let formatted = format_alignment(primer.name(), ref_id, &aligned_query, &marker, &aligned_ref_complement);

        ReferenceAlignment {
            details: Some(AlignmentDetails {
                start,
                end,
                length,
                percent_identity,
                aligned_query,
                aligned_ref,
                aligned_ref_complement,
                ref_id: ref_id.to_string(),
                mm_3prime,
                marker,
                formatted
            }),
            over_budget: false
        }
    }

    /// True if the attempt produced an alignment
    pub fn is_aligned(&self) -> bool {
        self.details.is_some()
    }

    /// True if the attempt was skipped by the cell budget
    pub fn is_over_budget(&self) -> bool {
        self.over_budget
    }

    // Getters, all None for a failed attempt
    pub fn details(&self) -> Option<&AlignmentDetails> {
        self.details.as_ref()
    }

    pub fn start(&self) -> Option<usize> {
        self.details.as_ref().map(|d| d.start)
    }

    pub fn end(&self) -> Option<usize> {
        self.details.as_ref().map(|d| d.end)
    }

    pub fn length(&self) -> Option<usize> {
        self.details.as_ref().map(|d| d.length)
    }

    pub fn percent_identity(&self) -> Option<f64> {
        self.details.as_ref().map(|d| d.percent_identity)
    }

    pub fn aligned_query(&self) -> Option<&[u8]> {
        self.details.as_ref().map(|d| d.aligned_query.as_slice())
    }

    pub fn aligned_ref(&self) -> Option<&[u8]> {
        self.details.as_ref().map(|d| d.aligned_ref.as_slice())
    }

    pub fn aligned_ref_complement(&self) -> Option<&[u8]> {
        self.details.as_ref().map(|d| d.aligned_ref_complement.as_slice())
    }

    pub fn ref_id(&self) -> Option<&str> {
        self.details.as_ref().map(|d| d.ref_id.as_str())
    }

    pub fn mm_3prime(&self) -> Option<bool> {
        self.details.as_ref().map(|d| d.mm_3prime)
    }

    pub fn marker(&self) -> Option<&str> {
        self.details.as_ref().map(|d| d.marker.as_str())
    }

    pub fn formatted_alignment(&self) -> Option<&str> {
        self.details.as_ref().map(|d| d.formatted.as_str())
    }
}

impl fmt::Display for ReferenceAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.formatted_alignment() {
            Some(formatted) => write!(f, "{formatted}"),
            None => write!(f, "no alignment")
        }
    }
}

/// Columns of the full-width rows covered by the primer.
/// Reference gaps inside the alignment shift the end past `ref_end`, so the span comes from the query row when it has one.
fn row_span(aligned_query: &[u8], ref_start: usize, ref_end: usize) -> (usize, usize) {
    let first = aligned_query.iter().position(|&b| b != GAP);
    let last = aligned_query.iter().rposition(|&b| b != GAP);
    match (first, last) {
        (Some(first), Some(last)) => (first, last + 1),
        _ => (ref_start, ref_end)
    }
}

/// Cuts `[start, end)` out of an aligned row, clamped to the row length
fn slice_row(row: &[u8], start: usize, end: usize) -> Vec<u8> {
    let end = end.min(row.len());
    let start = start.min(end);
    row[start..end].to_vec()
}

/// Truncates a name to the display width
fn short_name(name: &str) -> String {
    name.chars().take(DISPLAY_NAME_WIDTH).collect()
}

/// Three-line diagnostic block: primer row, marker row, complemented reference row
fn format_alignment(primer_name: &str, ref_id: &str, aligned_query: &[u8], marker: &str, aligned_ref_complement: &[u8]) -> String {
    format!(
        "{:<width$}5'-{}-3'\n{:<pad$}{}\n{:<width$}3'-{}-5'",
        short_name(primer_name),
        String::from_utf8_lossy(aligned_query),
        "",
        marker,
        short_name(ref_id),
        String::from_utf8_lossy(aligned_ref_complement),
        width = DISPLAY_NAME_WIDTH,
        pad = DISPLAY_NAME_WIDTH + 3
    )
}
