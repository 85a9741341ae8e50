/*!
Primer types: the base `PrimerRecord`, the positioned `CandidatePrimer` that carries its reference alignments, and `CandidatePrimerPair`.

# Example usage
```rust
use primal_tiling::primer::{CandidatePrimer, CandidatePrimerPair, Direction};
use primal_tiling::reference::Reference;
use primal_tiling::resolver_config::{AlignmentConfig, IdentityAveraging};
use primal_tiling::sequence_alignment::GlocalAligner;
use primal_tiling::thermo::NearestNeighborThermo;

let thermo = NearestNeighborThermo::default();
let references = [
    Reference::new("ref1", b"GGGGGACGTTGCAGGGGGGGGGCCATGCAGTTTTT".to_vec()).unwrap()
];

let mut left = CandidatePrimer::new(Direction::Left, "amp_1_LEFT", b"ACGTTGCA".to_vec(), 5, &thermo).unwrap();
let mut right = CandidatePrimer::new(Direction::Right, "amp_1_RIGHT", b"CTGCATGG".to_vec(), 30, &thermo).unwrap();
left.align(&references, &GlocalAligner, &AlignmentConfig::default(), IdentityAveraging::AlignedOnly);
right.align(&references, &GlocalAligner, &AlignmentConfig::default(), IdentityAveraging::AlignedOnly);
assert_eq!(left.percent_identity(), 100.0);
assert_eq!(right.percent_identity(), 100.0);

let pair = CandidatePrimerPair::new(left, right).unwrap();
assert_eq!(pair.mean_percent_identity(), 100.0);
assert_eq!(pair.product_length(), 26);
```
*/

use simple_error::bail;
use std::fmt;

use crate::reference::Reference;
use crate::reference_alignment::ReferenceAlignment;
use crate::resolver_config::{AlignmentConfig, IdentityAveraging};
use crate::sequence_alignment::AlignmentEngine;
use crate::sequence_utils::{gc_percent, validate_sequence};
use crate::thermo::ThermoCalculator;

/// Which strand a primer binds; RIGHT primers are written in reverse-strand sense
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    Left,
    Right
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "LEFT"),
            Direction::Right => write!(f, "RIGHT")
        }
    }
}

/// A primer sequence with its thermodynamic and composition metrics, computed once at construction
#[derive(Clone, Debug, PartialEq)]
pub struct PrimerRecord {
    direction: Direction,
    name: String,
    sequence: Vec<u8>,
    /// Melting temperature (C)
    tm: f64,
    /// Hairpin melting temperature (C)
    hairpin_tm: f64,
    /// Homodimer melting temperature (C)
    homodimer_tm: f64,
    /// GC content as a percentage
    gc: f64
}

impl PrimerRecord {
    /// Constructor, computes all the metrics.
    /// # Arguments
    /// * `direction` - LEFT or RIGHT
    /// * `name` - the primer identifier
    /// * `sequence` - the primer sequence over {A,C,G,T}
    /// * `thermo` - the thermodynamic calculator
    /// # Errors
    /// * if the sequence is empty or contains anything outside {A,C,G,T}
    pub fn new<T: ThermoCalculator + ?Sized>(direction: Direction, name: &str, sequence: Vec<u8>, thermo: &T) -> Result<PrimerRecord, Box<dyn std::error::Error>> {
        validate_sequence(name, &sequence)?;
        Ok(PrimerRecord {
            direction,
            name: name.to_string(),
            tm: thermo.melting_temperature(&sequence),
            hairpin_tm: thermo.hairpin_tm(&sequence),
            homodimer_tm: thermo.homodimer_tm(&sequence),
            gc: gc_percent(&sequence),
            sequence
        })
    }

    // Getters
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn length(&self) -> usize {
        self.sequence.len()
    }

    pub fn tm(&self) -> f64 {
        self.tm
    }

    pub fn hairpin_tm(&self) -> f64 {
        self.hairpin_tm
    }

    pub fn homodimer_tm(&self) -> f64 {
        self.homodimer_tm
    }

    pub fn gc(&self) -> f64 {
        self.gc
    }
}

/// A positioned primer for one region, holding one alignment attempt per reference
#[derive(Clone, Debug, PartialEq)]
pub struct CandidatePrimer {
    record: PrimerRecord,
    /// Position of the 5' end in window/genome coordinates
    start: i64,
    /// Aggregate identity across the reference panel
    percent_identity: f64,
    /// One entry per reference in panel order, including failed attempts
    alignments: Vec<ReferenceAlignment>
}

impl CandidatePrimer {
    /// Constructor that builds the underlying `PrimerRecord`.
    /// # Arguments
    /// * `direction` - LEFT or RIGHT
    /// * `name` - the primer identifier
    /// * `sequence` - the primer sequence over {A,C,G,T}
    /// * `start` - position of the 5' end
    /// * `thermo` - the thermodynamic calculator
    /// # Errors
    /// * if the sequence fails validation
    pub fn new<T: ThermoCalculator + ?Sized>(direction: Direction, name: &str, sequence: Vec<u8>, start: i64, thermo: &T) -> Result<CandidatePrimer, Box<dyn std::error::Error>> {
        let record = PrimerRecord::new(direction, name, sequence, thermo)?;
        Ok(Self::from_record(record, start))
    }

    /// Wraps an existing record; the primer starts unaligned with identity 0
    pub fn from_record(record: PrimerRecord, start: i64) -> CandidatePrimer {
        CandidatePrimer {
            record,
            start,
            percent_identity: 0.0,
            alignments: vec![]
        }
    }

    /// Aligns this primer against every reference in panel order, replacing any previous alignments and identity.
    /// Returns the primer so alignment can be chained onto construction.
    /// # Arguments
    /// * `references` - the reference panel
    /// * `aligner` - the alignment engine
    /// * `config` - per-alignment settings
    /// * `averaging` - how the per-reference identities are combined
    pub fn align<A: AlignmentEngine + ?Sized>(&mut self, references: &[Reference], aligner: &A, config: &AlignmentConfig, averaging: IdentityAveraging) -> &mut Self {
        self.alignments = references.iter()
            .map(|reference| ReferenceAlignment::new(&self.record, reference, aligner, config))
            .collect();
        self.percent_identity = average_identity(&self.alignments, averaging);
        self
    }

    /// Returns (attempted, aligned, 3'-penalized) counts over the current alignments
    pub fn alignment_summary(&self) -> (usize, usize, usize) {
        let aligned = self.alignments.iter().filter(|a| a.is_aligned()).count();
        let penalized = self.alignments.iter().filter(|a| a.mm_3prime() == Some(true)).count();
        (self.alignments.len(), aligned, penalized)
    }

    /// The 3' end of the primer: start + length for LEFT, start - length for RIGHT
    pub fn end(&self) -> i64 {
        let length = self.record.length() as i64;
        match self.record.direction() {
            Direction::Left => self.start + length,
            Direction::Right => self.start - length
        }
    }

    // Getters
    pub fn record(&self) -> &PrimerRecord {
        &self.record
    }

    pub fn direction(&self) -> Direction {
        self.record.direction()
    }

    pub fn name(&self) -> &str {
        self.record.name()
    }

    pub fn sequence(&self) -> &[u8] {
        self.record.sequence()
    }

    pub fn length(&self) -> usize {
        self.record.length()
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn percent_identity(&self) -> f64 {
        self.percent_identity
    }

    pub fn alignments(&self) -> &[ReferenceAlignment] {
        &self.alignments
    }
}

/// Combines per-reference identities, 0.0 if nothing contributes.
/// Alignments zeroed by the 3' rule are left out under `AlignedOnly`, the same as failed attempts.
fn average_identity(alignments: &[ReferenceAlignment], averaging: IdentityAveraging) -> f64 {
    let identities: Vec<f64> = alignments.iter()
        .filter_map(|a| a.percent_identity())
        .filter(|&identity| identity > 0.0)
        .collect();
    let denominator = match averaging {
        IdentityAveraging::AlignedOnly => identities.len(),
        IdentityAveraging::AllAttempts => alignments.len()
    };
    if denominator == 0 {
        0.0
    } else {
        identities.iter().sum::<f64>() / denominator as f64
    }
}

/// A left/right pairing; the mean identity is a snapshot taken at construction
#[derive(Clone, Debug, PartialEq)]
pub struct CandidatePrimerPair {
    left: CandidatePrimer,
    right: CandidatePrimer,
    mean_percent_identity: f64
}

impl CandidatePrimerPair {
    /// Constructor, takes the identity snapshot.
    /// # Arguments
    /// * `left` - must be a LEFT primer
    /// * `right` - must be a RIGHT primer
    /// # Errors
    /// * if either primer has the wrong direction
    pub fn new(left: CandidatePrimer, right: CandidatePrimer) -> Result<CandidatePrimerPair, Box<dyn std::error::Error>> {
        if left.direction() != Direction::Left || right.direction() != Direction::Right {
            bail!(
                "InvalidPrimerPair: expected LEFT/RIGHT but got {}/{} for {}/{}",
                left.direction(), right.direction(), left.name(), right.name()
            );
        }
        let mean_percent_identity = (left.percent_identity() + right.percent_identity()) / 2.0;
        Ok(CandidatePrimerPair {
            left,
            right,
            mean_percent_identity
        })
    }

    /// Returns the same pair with the mean identity recomputed from the primers' current identities
    pub fn rederived(mut self) -> CandidatePrimerPair {
        self.mean_percent_identity = (self.left.percent_identity() + self.right.percent_identity()) / 2.0;
        self
    }

    /// Amplicon length spanned by the two 5' ends, inclusive
    pub fn product_length(&self) -> i64 {
        self.right.start() - self.left.start() + 1
    }

    /// Mutable access to both primers for re-alignment; the snapshot is left untouched
    pub(crate) fn primers_mut(&mut self) -> [&mut CandidatePrimer; 2] {
        [&mut self.left, &mut self.right]
    }

    // Getters
    pub fn left(&self) -> &CandidatePrimer {
        &self.left
    }

    pub fn right(&self) -> &CandidatePrimer {
        &self.right
    }

    pub fn mean_percent_identity(&self) -> f64 {
        self.mean_percent_identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::sequence_alignment::GlocalAligner;
    use crate::thermo::NearestNeighborThermo;

    fn candidate(direction: Direction, name: &str, sequence: &[u8], start: i64) -> CandidatePrimer {
        CandidatePrimer::new(direction, name, sequence.to_vec(), start, &NearestNeighborThermo::default()).unwrap()
    }

    fn align(primer: &mut CandidatePrimer, references: &[Reference], averaging: IdentityAveraging) {
        primer.align(references, &GlocalAligner, &AlignmentConfig::default(), averaging);
    }

    #[test]
    fn test_primer_record() {
        let thermo = NearestNeighborThermo::default();
        let record = PrimerRecord::new(Direction::Left, "p1", b"ACCAGGAACTAATCAGACAAG".to_vec(), &thermo).unwrap();
        assert_eq!(record.length(), 21);
        assert_eq!(record.gc(), 100.0 * 9.0 / 21.0);
        assert_eq!(record.tm(), thermo.melting_temperature(b"ACCAGGAACTAATCAGACAAG"));
        assert_eq!(record.hairpin_tm(), thermo.hairpin_tm(b"ACCAGGAACTAATCAGACAAG"));
        assert_eq!(record.homodimer_tm(), thermo.homodimer_tm(b"ACCAGGAACTAATCAGACAAG"));
        assert!(record.gc() >= 0.0 && record.gc() <= 100.0);
    }

    #[test]
    fn test_primer_gc_bounds() {
        let thermo = NearestNeighborThermo::default();
        for (sequence, expected) in [(&b"GGGG"[..], 100.0), (&b"TTTT"[..], 0.0), (&b"GATC"[..], 50.0), (&b"GAT"[..], 100.0 / 3.0)] {
            let record = PrimerRecord::new(Direction::Right, "p", sequence.to_vec(), &thermo).unwrap();
            assert_eq!(record.gc(), expected);
        }
    }

    #[test]
    fn test_invalid_alphabet() {
        let thermo = NearestNeighborThermo::default();
        let err = PrimerRecord::new(Direction::Left, "bad", b"ACGU".to_vec(), &thermo).unwrap_err();
        assert_eq!(err.to_string(), "InvalidSequenceAlphabet: sequence for bad has 'U' at position 3");
        assert!(CandidatePrimer::new(Direction::Left, "empty", vec![], 0, &thermo).is_err());
    }

    #[test]
    fn test_end() {
        let left = candidate(Direction::Left, "l", b"ACGTTGCA", 100);
        assert_eq!(left.end(), 108);
        let right = candidate(Direction::Right, "r", b"ACGTTGCA", 500);
        assert_eq!(right.end(), 492);
    }

    #[test]
    fn test_align_empty_panel() {
        let mut primer = candidate(Direction::Left, "l", b"ACGTTGCA", 0);
        align(&mut primer, &[], IdentityAveraging::AlignedOnly);
        assert_eq!(primer.percent_identity(), 0.0);
        assert!(primer.alignments().is_empty());
    }

    #[test]
    fn test_align_all_failed() {
        let references = [
            Reference::new("r1", b"TTTTTTTTTTTTTTTTTTTT".to_vec()).unwrap(),
            Reference::new("r2", b"CCCCCCCCCCCCCCCCCCCC".to_vec()).unwrap()
        ];
        let mut primer = candidate(Direction::Left, "l", b"ACGTTGCA", 0);
        align(&mut primer, &references, IdentityAveraging::AlignedOnly);
        assert_eq!(primer.percent_identity(), 0.0);
        assert_eq!(primer.alignments().len(), 2);
        assert!(primer.alignments().iter().all(|a| !a.is_aligned()));
        assert_eq!(primer.alignment_summary(), (2, 0, 0));
    }

    #[test]
    fn test_align_averaging() {
        let references = [
            // exact
            Reference::new("r1", b"GGGGGACGTTGCAGGGGG".to_vec()).unwrap(),
            // one internal mismatch
            Reference::new("r2", b"GGGGGACGATGCAGGGGG".to_vec()).unwrap(),
            // no alignment
            Reference::new("r3", b"TTTTTTTTTTTTTTTTTT".to_vec()).unwrap()
        ];

        let mut primer = candidate(Direction::Left, "l", b"ACGTTGCA", 5);
        align(&mut primer, &references, IdentityAveraging::AlignedOnly);
        assert_eq!(primer.alignments().len(), 3);
        assert_eq!(primer.percent_identity(), (100.0 + 87.5) / 2.0);
        assert_eq!(primer.alignment_summary(), (3, 2, 0));

        // the failed attempt now drags the mean down
        align(&mut primer, &references, IdentityAveraging::AllAttempts);
        assert_eq!(primer.alignments().len(), 3);
        assert_eq!(primer.percent_identity(), (100.0 + 87.5) / 3.0);
    }

    #[test]
    fn test_align_replaces() {
        let references = [Reference::new("r1", b"GGGGGACGTTGCAGGGGG".to_vec()).unwrap()];
        let mut primer = candidate(Direction::Left, "l", b"ACGTTGCA", 5);
        align(&mut primer, &references, IdentityAveraging::AlignedOnly);
        let first = primer.clone();
        align(&mut primer, &references, IdentityAveraging::AlignedOnly);
        assert_eq!(primer, first);
        assert_eq!(primer.alignments().len(), 1);
    }

    #[test]
    fn test_penalized_alignment_counts() {
        // terminal A over a T template is disallowed, so this reference is zeroed
        let references = [
            Reference::new("r1", b"GGGGGACGTTGCAGGGGG".to_vec()).unwrap(),
            Reference::new("r2", b"GGGGGACGTTGCTGGGGG".to_vec()).unwrap()
        ];
        let mut primer = candidate(Direction::Left, "l", b"ACGTTGCA", 5);
        align(&mut primer, &references, IdentityAveraging::AlignedOnly);
        assert_eq!(primer.alignment_summary(), (2, 2, 1));
        // the zeroed alignment is left out of the mean, like a failed one
        assert_eq!(primer.percent_identity(), 100.0);

        // but it still counts against the primer when every attempt is averaged
        align(&mut primer, &references, IdentityAveraging::AllAttempts);
        assert_eq!(primer.alignment_summary(), (2, 2, 1));
        assert_eq!(primer.percent_identity(), 50.0);
    }

    #[test]
    fn test_product_length() {
        let left = candidate(Direction::Left, "l", b"ACGTTGCA", 100);
        let right = candidate(Direction::Right, "r", b"ACGTTGCA", 500);
        let pair = CandidatePrimerPair::new(left, right).unwrap();
        assert_eq!(pair.product_length(), 401);
    }

    #[test]
    fn test_invalid_pair() {
        let left = candidate(Direction::Left, "l", b"ACGTTGCA", 100);
        let other_left = candidate(Direction::Left, "l2", b"ACGTTGCA", 500);
        let err = CandidatePrimerPair::new(left, other_left).unwrap_err();
        assert_eq!(err.to_string(), "InvalidPrimerPair: expected LEFT/RIGHT but got LEFT/LEFT for l/l2");
    }

    #[test]
    fn test_mean_identity_snapshot() {
        let references = [Reference::new("r1", b"GGGGGACGTTGCAGGGGGCCATGCAGTTTTT".to_vec()).unwrap()];
        let left = candidate(Direction::Left, "l", b"ACGTTGCA", 5);
        let right = candidate(Direction::Right, "r", b"CTGCATGG", 26);

        // built before aligning, so the snapshot is 0
        let mut pair = CandidatePrimerPair::new(left, right).unwrap();
        assert_eq!(pair.mean_percent_identity(), 0.0);

        for primer in pair.primers_mut() {
            align(primer, &references, IdentityAveraging::AlignedOnly);
        }
        assert_eq!(pair.left().percent_identity(), 100.0);
        assert_eq!(pair.right().percent_identity(), 100.0);
        assert_eq!(pair.mean_percent_identity(), 0.0);

        let pair = pair.rederived();
        assert_eq!(pair.mean_percent_identity(), 100.0);
    }
}
