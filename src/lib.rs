/*!
# primal_tiling
This library evaluates candidate primers for one region of a tiled amplicon scheme against a panel of related reference genomes.

Key benefits:
* Every candidate primer is aligned against every reference, with a 3' mismatch rule that zeroes out alignments unlikely to extend
* Candidate pairs are ranked by their mean identity and the best pair is picked deterministically
* Reference variants under the picked pair are promoted to alternate primers when they occur in more than one reference

Performance notes:
* The (primer, reference) alignments are independent and run on the rayon pool by default
* Alignment cost scales with primer length times reference length; `AlignmentConfig::max_alignment_cells` bounds it per attempt

# Example usage
```rust
use primal_tiling::diagnostics::LogSink;
use primal_tiling::primer::{CandidatePrimer, CandidatePrimerPair, Direction};
use primal_tiling::reference::Reference;
use primal_tiling::region::RegionResolver;
use primal_tiling::resolver_config::RegionConfig;
use primal_tiling::sequence_alignment::GlocalAligner;
use primal_tiling::thermo::NearestNeighborThermo;

let thermo = NearestNeighborThermo::default();
let references = [
    Reference::new("ref1", b"GGGGGACGTTGCAGGGGGGGGGCCATGCAGTTTTT".to_vec()).unwrap(),
    Reference::new("ref2", b"GGGGGACGTAGCAGGGGGGGGGCCATGCAGTTTTT".to_vec()).unwrap(), // variant under the left primer
    Reference::new("ref3", b"GGGGGACGTAGCAGGGGGGGGGCCATGCAGTTTTT".to_vec()).unwrap()
];

let left = CandidatePrimer::new(Direction::Left, "demo_1_LEFT", b"ACGTTGCA".to_vec(), 5, &thermo).unwrap();
let right = CandidatePrimer::new(Direction::Right, "demo_1_RIGHT", b"CTGCATGG".to_vec(), 30, &thermo).unwrap();
let pairs = vec![CandidatePrimerPair::new(left, right).unwrap()];

let config = RegionConfig::default();
let resolver = RegionResolver::new(&references, &GlocalAligner, &thermo, &config);
let region = resolver.resolve(0, 0, pairs, &mut LogSink).unwrap();

// the shared variant becomes an alternate primer
assert_eq!(region.alternates().len(), 1);
assert_eq!(region.alternates()[0].name(), "demo_1_LEFT_alt1");
assert_eq!(region.alternates()[0].sequence(), b"ACGTAGCA");
assert_eq!(region.primers().len(), 3);
```
*/

/// Explicit diagnostics emitted while resolving a region
pub mod diagnostics;
/// Utility for generating synthetic panels and candidates
pub mod example_gen;
/// Primer records, positioned candidates, and candidate pairs
pub mod primer;
/// Reference sequences in the panel
pub mod reference;
/// Alignment of one primer against one reference, with the 3' mismatch rule
pub mod reference_alignment;
/// Main functionality for resolving a single region
pub mod region;
/// Configuration for alignment and region resolution
pub mod resolver_config;
/// Basic pair-wise alignment utilities
pub mod sequence_alignment;
/// Nucleotide helpers
pub mod sequence_utils;
/// Melting temperature calculations
pub mod thermo;
