/*!
Contains configuration information for resolving a tiling region.
Typical usage is to build the config with the builders, e.g.
```
use primal_tiling::resolver_config::{AlignmentConfigBuilder, IdentityAveraging, RegionConfig, RegionConfigBuilder};
let config: RegionConfig = RegionConfigBuilder::default()
    .prefix("nCoV-2019")
    .max_alts(3)
    .identity_averaging(IdentityAveraging::AllAttempts)
    .alignment(
        AlignmentConfigBuilder::default()
            .min_percent_identity(80.0)
            .build()
            .unwrap()
    )
    .build()
    .unwrap();
```
*/

use crate::reference_alignment::MismatchTable;
use crate::sequence_alignment::AlignmentScoring;

/// How a primer's per-reference identities are combined into one score.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum IdentityAveraging {
    /// Mean over the references that produced a non-zero alignment; failed attempts and alignments zeroed by the 3' rule are ignored
    #[default]
    AlignedOnly,
    /// Mean over every attempted reference; failed and 3'-zeroed attempts count as 0
    AllAttempts
}

/// Settings for aligning a single primer against a single reference.
#[derive(derive_builder::Builder, Clone, Debug)]
#[builder(default)]
pub struct AlignmentConfig {
    /// Scoring scheme passed to the alignment engine
    pub scoring: AlignmentScoring,
    /// Full-primer identity below this is recorded as a failed attempt
    pub min_percent_identity: f64,
    /// Unordered primer/template base pairs that block extension at the 3' end
    pub disallowed_3prime: MismatchTable,
    /// Optional cap on primer length * reference length; larger attempts are recorded as failed without aligning
    pub max_alignment_cells: Option<usize>
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            scoring: AlignmentScoring::default(),
            // anything below this is not going to prime
            min_percent_identity: 70.0,
            disallowed_3prime: MismatchTable::default(),
            // by default, we do not bound alignment cost
            max_alignment_cells: None
        }
    }
}

/**
Contains configuration information for resolving one region of a scheme.
```
use primal_tiling::resolver_config::{RegionConfig, RegionConfigBuilder};
let config: RegionConfig = RegionConfigBuilder::default()
    .prefix("HIV")
    .max_alts(0)
    .build()
    .unwrap();
assert!(config.parallel_alignment);
```
*/
#[derive(derive_builder::Builder, Clone, Debug)]
#[builder(default)]
pub struct RegionConfig {
    /// Scheme name, used for pool names
    #[builder(setter(into))]
    pub prefix: String,
    /// Maximum number of alternates emitted per side of the chosen pair
    pub max_alts: usize,
    /// How per-reference identities are averaged for each primer
    pub identity_averaging: IdentityAveraging,
    /// If true, primer alignments within a region run on the rayon thread pool
    pub parallel_alignment: bool,
    /// Per-alignment settings
    pub alignment: AlignmentConfig
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            prefix: "primal".to_string(),
            // matches the usual command line default
            max_alts: 2,
            identity_averaging: IdentityAveraging::AlignedOnly,
            // results are identical either way, so use the threads
            parallel_alignment: true,
            alignment: AlignmentConfig::default()
        }
    }
}
