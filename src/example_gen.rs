use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};
use simple_error::bail;

use crate::primer::{CandidatePrimer, CandidatePrimerPair, Direction};
use crate::reference::Reference;
use crate::sequence_utils::reverse_complement;
use crate::thermo::ThermoCalculator;

const BASES: [u8; 4] = *b"ACGT";

/// Creates a synthetic reference panel derived from one random consensus
/// # Arguments
/// * `seq_len` - the length of the consensus
/// * `num_references` - the number of references to generate from the consensus
/// * `variant_rate` - overall variant rate, assumes substitution, insertion, and deletion are equally likely sub-components of this rate
/// * `seed` - seed for the generator, the same seed always gives the same panel
/// # Errors
/// * if `seq_len` is 0
pub fn generate_panel(seq_len: usize, num_references: usize, variant_rate: f64, seed: u64) -> Result<(Vec<u8>, Vec<Reference>), Box<dyn std::error::Error>> {
    assert!((0.0..=1.0).contains(&variant_rate));

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let base_distribution = Uniform::new(0, BASES.len());
    let basem1_distribution = Uniform::new(1, BASES.len());
    let variant_distribution = Uniform::new(0.0, 1.0);
    let variant_type_distribution = Uniform::new(0, 3);

    let consensus: Vec<u8> = (0..seq_len)
        .map(|_i| BASES[rng.sample(base_distribution)])
        .collect();
    let consensus_index: Vec<usize> = consensus.iter()
        .map(|&c| BASES.iter().position(|&b| b == c).unwrap_or_default())
        .collect();

    let mut references = Vec::with_capacity(num_references);
    for ref_index in 0..num_references {
        let mut seq = vec![];
        let mut con_index = 0;
        while con_index < consensus.len() {
            let c = consensus_index[con_index];
            let is_variant = rng.sample(variant_distribution) < variant_rate;
            if is_variant {
                match rng.sample(variant_type_distribution) {
                    0 => {
                        // substitution
                        let sub_offset = rng.sample(basem1_distribution);
                        seq.push(BASES[(c + sub_offset) % BASES.len()]);
                        con_index += 1;
                    },
                    1 => {
                        // deletion
                        con_index += 1;
                    },
                    2 => {
                        // insertion
                        seq.push(BASES[rng.sample(base_distribution)]);
                    },
                    _ => panic!("no impl")
                }
            } else {
                seq.push(BASES[c]);
                con_index += 1;
            }
        }

        // a reference that lost every base still needs to be a valid sequence
        if seq.is_empty() {
            seq = consensus.clone();
        }
        references.push(Reference::new(&format!("synthetic_{ref_index}"), seq)?);
    }

    Ok((consensus, references))
}

/// Tiles candidate pairs across one window of a consensus, shifting both primers by one base per pair
/// # Arguments
/// * `consensus` - the consensus the panel was generated from
/// * `prefix` - naming prefix, pairs are named `{prefix}_{i}_LEFT` and `{prefix}_{i}_RIGHT`
/// * `window_start` - where the first left primer starts
/// * `num_pairs` - the number of pairs to generate
/// * `primer_len` - length of every primer
/// * `amplicon_len` - distance from the left 5' end to the right 5' end
/// * `thermo` - the thermodynamic calculator
/// # Errors
/// * if `primer_len` is 0 or longer than `amplicon_len`
/// * if the window runs past the end of the consensus
pub fn generate_candidate_pairs<T: ThermoCalculator + ?Sized>(
    consensus: &[u8], prefix: &str, window_start: usize, num_pairs: usize, primer_len: usize, amplicon_len: usize, thermo: &T
) -> Result<Vec<CandidatePrimerPair>, Box<dyn std::error::Error>> {
    if primer_len == 0 || primer_len > amplicon_len {
        bail!("primer length {primer_len} must be between 1 and amplicon length {amplicon_len}");
    }
    // the last right primer ends at window_start + (num_pairs - 1) + amplicon_len
    if num_pairs > 0 && window_start + num_pairs - 1 + amplicon_len > consensus.len() {
        bail!("window of {num_pairs} pairs at {window_start} with amplicon length {amplicon_len} exceeds consensus length {}", consensus.len());
    }

    let mut pairs = Vec::with_capacity(num_pairs);
    for i in 0..num_pairs {
        let left_start = window_start + i;
        let right_start = left_start + amplicon_len;
        let left_seq = consensus[left_start..(left_start + primer_len)].to_vec();
        let right_seq = reverse_complement(&consensus[(right_start - primer_len)..right_start]);

        let left = CandidatePrimer::new(Direction::Left, &format!("{prefix}_{i}_LEFT"), left_seq, left_start as i64, thermo)?;
        let right = CandidatePrimer::new(Direction::Right, &format!("{prefix}_{i}_RIGHT"), right_seq, right_start as i64, thermo)?;
        pairs.push(CandidatePrimerPair::new(left, right)?);
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::thermo::NearestNeighborThermo;

    #[test]
    fn test_generate_panel() {
        let (consensus, references) = generate_panel(500, 8, 0.0, 0).unwrap();
        assert_eq!(consensus.len(), 500);
        assert_eq!(references.len(), 8);
        for reference in references.iter() {
            assert_eq!(reference.sequence(), consensus.as_slice());
        }
        assert_eq!(references[3].id(), "synthetic_3");

        // same seed, same panel
        let (_, again) = generate_panel(500, 8, 0.0, 0).unwrap();
        assert_eq!(references, again);
    }

    #[test]
    fn test_generate_panel_variants() {
        let (consensus, references) = generate_panel(500, 8, 0.05, 7).unwrap();
        assert!(references.iter().any(|r| r.sequence() != consensus.as_slice()));
    }

    #[test]
    fn test_generate_candidate_pairs() {
        let thermo = NearestNeighborThermo::default();
        let (consensus, _references) = generate_panel(500, 1, 0.0, 0).unwrap();
        let pairs = generate_candidate_pairs(&consensus, "syn", 10, 5, 22, 300, &thermo).unwrap();
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[2].left().start(), 12);
        assert_eq!(pairs[2].right().start(), 312);
        assert_eq!(pairs[2].right().end(), 290);
        assert_eq!(pairs[2].product_length(), 301);
        assert_eq!(pairs[2].left().name(), "syn_2_LEFT");

        let err = generate_candidate_pairs(&consensus, "syn", 400, 5, 22, 300, &thermo).unwrap_err();
        assert_eq!(err.to_string(), "window of 5 pairs at 400 with amplicon length 300 exceeds consensus length 500");

        // the last pair may end exactly at the end of the consensus
        let pairs = generate_candidate_pairs(&consensus, "syn", 196, 5, 22, 300, &thermo).unwrap();
        assert_eq!(pairs[4].right().start(), 500);
        let err = generate_candidate_pairs(&consensus, "syn", 197, 5, 22, 300, &thermo).unwrap_err();
        assert_eq!(err.to_string(), "window of 5 pairs at 197 with amplicon length 300 exceeds consensus length 500");
    }

    #[test]
    fn test_generate_candidate_pairs_primer_length() {
        let thermo = NearestNeighborThermo::default();
        let (consensus, _references) = generate_panel(50, 1, 0.0, 0).unwrap();

        // primers longer than the amplicon would run off the consensus
        let err = generate_candidate_pairs(&consensus, "syn", 40, 1, 30, 10, &thermo).unwrap_err();
        assert_eq!(err.to_string(), "primer length 30 must be between 1 and amplicon length 10");
        let err = generate_candidate_pairs(&consensus, "syn", 0, 1, 0, 10, &thermo).unwrap_err();
        assert_eq!(err.to_string(), "primer length 0 must be between 1 and amplicon length 10");

        assert!(generate_candidate_pairs(&consensus, "syn", 0, 0, 5, 10, &thermo).unwrap().is_empty());
    }
}
