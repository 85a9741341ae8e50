/*!
This module resolves one tiling window: it ranks the candidate pairs, aligns every primer against the reference panel, and derives alternate primers for the chosen pair.

# Example usage
```rust
use primal_tiling::diagnostics::NullSink;
use primal_tiling::primer::{CandidatePrimer, CandidatePrimerPair, Direction};
use primal_tiling::reference::Reference;
use primal_tiling::region::RegionResolver;
use primal_tiling::resolver_config::RegionConfigBuilder;
use primal_tiling::sequence_alignment::GlocalAligner;
use primal_tiling::thermo::NearestNeighborThermo;

let thermo = NearestNeighborThermo::default();
let references = [
    Reference::new("ref1", b"GGGGGACGTTGCAGGGGGGGGGCCATGCAGTTTTT".to_vec()).unwrap(),
    Reference::new("ref2", b"GGGGGACGTTGCAGGGGGGGGGCCATGCAGTTTTT".to_vec()).unwrap()
];
let left = CandidatePrimer::new(Direction::Left, "demo_1_LEFT", b"ACGTTGCA".to_vec(), 5, &thermo).unwrap();
let right = CandidatePrimer::new(Direction::Right, "demo_1_RIGHT", b"CTGCATGG".to_vec(), 30, &thermo).unwrap();
let pairs = vec![CandidatePrimerPair::new(left, right).unwrap()];

let config = RegionConfigBuilder::default().prefix("demo").build().unwrap();
let resolver = RegionResolver::new(&references, &GlocalAligner, &thermo, &config);
let region = resolver.resolve(0, 0, pairs, &mut NullSink).unwrap();

assert_eq!(region.pool(), "demo_2");
assert_eq!(region.top_pair().left().percent_identity(), 100.0);
assert_eq!(region.top_pair().right().alignments()[1].start(), Some(30));
assert!(region.alternates().is_empty());
```
*/

use itertools::Itertools;
use rayon::prelude::*;
use rustc_hash::FxHashSet as HashSet;
use simple_error::bail;

use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink};
use crate::primer::{CandidatePrimer, CandidatePrimerPair};
use crate::reference::Reference;
use crate::resolver_config::RegionConfig;
use crate::sequence_alignment::AlignmentEngine;
use crate::sequence_utils::ungapped;
use crate::thermo::ThermoCalculator;

/// Returns the pool for a region; adjacent regions alternate so overlapping amplicons never share a reaction.
/// # Examples
/// ```rust
/// use primal_tiling::region::pool_name;
/// assert_eq!(pool_name("nCoV", 0), "nCoV_2");
/// assert_eq!(pool_name("nCoV", 1), "nCoV_1");
/// ```
pub fn pool_name(prefix: &str, region_num: usize) -> String {
    if region_num % 2 == 0 {
        format!("{prefix}_2")
    } else {
        format!("{prefix}_1")
    }
}

/// Sorts pairs best first: highest mean identity, then the right primer reaching furthest.
/// The sort is stable, so exact ties keep their input order.
pub fn sort_candidate_pairs(candidate_pairs: &mut [CandidatePrimerPair]) {
    candidate_pairs.sort_by(|a, b| {
        b.mean_percent_identity().total_cmp(&a.mean_percent_identity())
            .then_with(|| b.right().end().cmp(&a.right().end()))
    });
}

/// A fully resolved region; only constructed by `RegionResolver::resolve`, so it always has at least one pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRegion {
    /// 0-based ordinal of the tiling window
    region_num: usize,
    /// Origin of the window this region was searched in
    window_start: i64,
    prefix: String,
    pool: String,
    /// Sorted best first, every primer aligned
    candidate_pairs: Vec<CandidatePrimerPair>,
    /// Left alternates followed by right alternates
    alternates: Vec<CandidatePrimer>
}

impl ResolvedRegion {
    /// The chosen pair
    pub fn top_pair(&self) -> &CandidatePrimerPair {
        &self.candidate_pairs[0]
    }

    /// Number of distinct (left, right) sequences across all candidate pairs
    pub fn unique_candidates(&self) -> (usize, usize) {
        let unique_left: HashSet<&[u8]> = self.candidate_pairs.iter().map(|p| p.left().sequence()).collect();
        let unique_right: HashSet<&[u8]> = self.candidate_pairs.iter().map(|p| p.right().sequence()).collect();
        (unique_left.len(), unique_right.len())
    }

    /// Every primer that goes into the scheme for this region: the chosen left and right, then the alternates
    pub fn primers(&self) -> Vec<&CandidatePrimer> {
        let top = self.top_pair();
        [top.left(), top.right()].into_iter()
            .chain(self.alternates.iter())
            .collect()
    }

    // Getters
    pub fn region_num(&self) -> usize {
        self.region_num
    }

    pub fn window_start(&self) -> i64 {
        self.window_start
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn pool(&self) -> &str {
        &self.pool
    }

    pub fn candidate_pairs(&self) -> &[CandidatePrimerPair] {
        &self.candidate_pairs
    }

    pub fn alternates(&self) -> &[CandidatePrimer] {
        &self.alternates
    }
}

/// Resolves regions against a fixed reference panel.
/// Each call to `resolve` is independent and owns its own working set.
pub struct RegionResolver<'a, A: ?Sized, T: ?Sized> {
    references: &'a [Reference],
    aligner: &'a A,
    thermo: &'a T,
    config: &'a RegionConfig
}

impl<'a, A, T> RegionResolver<'a, A, T>
where
    A: AlignmentEngine + Sync + ?Sized,
    T: ThermoCalculator + ?Sized
{
    /// Constructor
    /// # Arguments
    /// * `references` - the reference panel, in the order alignments are reported
    /// * `aligner` - the alignment engine
    /// * `thermo` - the thermodynamic calculator, used for alternate primers
    /// * `config` - the region settings
    pub fn new(references: &'a [Reference], aligner: &'a A, thermo: &'a T, config: &'a RegionConfig) -> RegionResolver<'a, A, T> {
        RegionResolver {
            references,
            aligner,
            thermo,
            config
        }
    }

    /// Sorts, aligns, and derives alternates for one region in a single step.
    /// Pairs are ranked by their construction-time identity snapshot; re-aligning does not change that snapshot.
    /// # Arguments
    /// * `region_num` - 0-based ordinal of the window, sets the pool
    /// * `window_start` - origin of the window, kept for bookkeeping
    /// * `candidate_pairs` - the candidates for this window, in any order
    /// * `sink` - receives diagnostics
    /// # Errors
    /// * if `candidate_pairs` is empty
    /// * if an alternate primer cannot be constructed
    pub fn resolve(&self, region_num: usize, window_start: i64, mut candidate_pairs: Vec<CandidatePrimerPair>, sink: &mut dyn DiagnosticsSink) -> Result<ResolvedRegion, Box<dyn std::error::Error>> {
        if candidate_pairs.is_empty() {
            bail!("EmptyCandidateSetError: region {region_num} has no candidate primer pairs");
        }

        let pool = pool_name(&self.config.prefix, region_num);
        sort_candidate_pairs(&mut candidate_pairs);

        // every (primer, reference) cell is independent; ordering is restored by writing back in place
        let mut primers: Vec<&mut CandidatePrimer> = candidate_pairs.iter_mut()
            .flat_map(|pair| pair.primers_mut())
            .collect();
        self.align_all(&mut primers);

        for pair in candidate_pairs.iter() {
            for primer in [pair.left(), pair.right()] {
                sink.record(summarize(region_num, primer));
            }
        }

        let mut alternates = vec![];
        let top_pair = &candidate_pairs[0];
        for top_primer in [top_pair.left(), top_pair.right()] {
            alternates.extend(self.derive_alternates(region_num, top_primer, sink)?);
        }

        let region = ResolvedRegion {
            region_num,
            window_start,
            prefix: self.config.prefix.clone(),
            pool,
            candidate_pairs,
            alternates
        };

        let top_pair = region.top_pair();
        sink.record(DiagnosticEvent::RegionResolved {
            region_num,
            pool: region.pool.clone(),
            left: top_pair.left().name().to_string(),
            right: top_pair.right().name().to_string(),
            mean_percent_identity: top_pair.mean_percent_identity(),
            unique_candidates: region.unique_candidates(),
            alternates: region.alternates.len()
        });

        Ok(region)
    }

    /// Aligns every primer against the full panel, on the rayon pool if configured
    fn align_all(&self, primers: &mut [&mut CandidatePrimer]) {
        let references = self.references;
        let aligner = self.aligner;
        let alignment_config = &self.config.alignment;
        let averaging = self.config.identity_averaging;

        if self.config.parallel_alignment {
            primers.par_iter_mut().for_each(|primer| {
                primer.align(references, aligner, alignment_config, averaging);
            });
        } else {
            for primer in primers.iter_mut() {
                primer.align(references, aligner, alignment_config, averaging);
            }
        }
    }

    /// Collects the reference variants under an aligned primer and promotes the frequent ones to alternates.
    /// # Arguments
    /// * `region_num` - used for diagnostics
    /// * `top_primer` - one side of the chosen pair, already aligned
    /// * `sink` - receives diagnostics
    /// # Errors
    /// * if an alternate primer cannot be constructed
    fn derive_alternates(&self, region_num: usize, top_primer: &CandidatePrimer, sink: &mut dyn DiagnosticsSink) -> Result<Vec<CandidatePrimer>, Box<dyn std::error::Error>> {
        let variants = variant_frequencies(top_primer);

        let mut alternates = vec![];
        for (index, (variant, frequency)) in variants.into_iter().enumerate() {
            if frequency <= 1 {
                sink.record(DiagnosticEvent::SingletonVariantSkipped {
                    region_num,
                    direction: top_primer.direction(),
                    sequence: String::from_utf8_lossy(&variant).to_string()
                });
                continue;
            }
            if index >= self.config.max_alts {
                continue;
            }

            let name = format!("{}_alt{}", top_primer.name(), index + 1);
            let mut alternate = CandidatePrimer::new(top_primer.direction(), &name, variant, top_primer.start(), self.thermo)?;
            alternate.align(self.references, self.aligner, &self.config.alignment, self.config.identity_averaging);

            sink.record(DiagnosticEvent::AlternateFound {
                region_num,
                name,
                direction: top_primer.direction(),
                frequency
            });
            alternates.push(alternate);
        }
        Ok(alternates)
    }
}

/// Distinct reference variants under a primer with how many references carry each, most frequent first.
/// Variants are compared without alignment gaps; ties are ordered by sequence.
fn variant_frequencies(primer: &CandidatePrimer) -> Vec<(Vec<u8>, usize)> {
    primer.alignments().iter()
        .filter_map(|a| a.aligned_ref())
        .map(ungapped)
        .filter(|variant| variant.as_slice() != primer.sequence())
        .counts()
        .into_iter()
        .sorted_by(|(v1, c1), (v2, c2)| c2.cmp(c1).then_with(|| v1.cmp(v2)))
        .collect()
}

/// Alignment counts for one primer
fn summarize(region_num: usize, primer: &CandidatePrimer) -> DiagnosticEvent {
    let (attempted, aligned, penalized_3prime) = primer.alignment_summary();
    let over_budget = primer.alignments().iter().filter(|a| a.is_over_budget()).count();
    DiagnosticEvent::AlignmentSummary {
        region_num,
        primer: primer.name().to_string(),
        attempted,
        aligned,
        penalized_3prime,
        over_budget
    }
}
