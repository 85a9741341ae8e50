/*!
Thermodynamic signals for primers: melting temperature, hairpin Tm, and homodimer Tm.
The resolver only needs the `ThermoCalculator` trait; `NearestNeighborThermo` is the default implementation.
Typical usage:
```
use primal_tiling::thermo::{NearestNeighborThermo, ThermoCalculator, ThermoConditionsBuilder};
let thermo = NearestNeighborThermo::new(
    ThermoConditionsBuilder::default()
        .monovalent_mm(50.0)
        .build()
        .unwrap()
);
let tm = thermo.melting_temperature(b"ACCAGGAACTAATCAGACAAG");
assert!(tm > 40.0 && tm < 70.0);
```
*/

use crate::sequence_utils::{complement_base, reverse_complement};

/// Gas constant in cal/(K*mol)
const GAS_CONSTANT: f64 = 1.987;
/// Offset between Celsius and Kelvin
const KELVIN: f64 = 273.15;
/// Shortest complementary stretch that counts as a secondary structure
const MIN_STEM_LENGTH: usize = 4;
/// Shortest hairpin loop that can physically close
const MIN_LOOP_LENGTH: usize = 3;

/// Buffer conditions used for every thermodynamic calculation
#[derive(derive_builder::Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct ThermoConditions {
    /// Monovalent cation concentration (mM)
    pub monovalent_mm: f64,
    /// Divalent cation concentration (mM)
    pub divalent_mm: f64,
    /// dNTP concentration (mM)
    pub dntp_mm: f64,
    /// Oligo concentration (nM)
    pub dna_nm: f64
}

impl Default for ThermoConditions {
    fn default() -> Self {
        Self {
            monovalent_mm: 50.0,
            divalent_mm: 1.5,
            dntp_mm: 0.6,
            // standard primer3 oligo concentration
            dna_nm: 50.0
        }
    }
}

/// External thermodynamic calculator; every entry point is a pure function of the sequence.
pub trait ThermoCalculator {
    /// Duplex melting temperature (C) of the sequence against its perfect complement
    fn melting_temperature(&self, sequence: &[u8]) -> f64;
    /// Melting temperature (C) of the strongest hairpin, 0.0 if none forms
    fn hairpin_tm(&self, sequence: &[u8]) -> f64;
    /// Melting temperature (C) of the strongest self-dimer, 0.0 if none forms
    fn homodimer_tm(&self, sequence: &[u8]) -> f64;
}

/// SantaLucia (1998) unified nearest-neighbor model with a divalent-to-monovalent salt correction.
/// Hairpins and homodimers are estimated from the strongest ungapped complementary stem.
#[derive(Clone, Debug, Default)]
pub struct NearestNeighborThermo {
    conditions: ThermoConditions
}

impl NearestNeighborThermo {
    /// Constructor
    /// # Arguments
    /// * `conditions` - the buffer conditions to evaluate with
    pub fn new(conditions: ThermoConditions) -> NearestNeighborThermo {
        NearestNeighborThermo {
            conditions
        }
    }

    /// Monovalent-equivalent sodium concentration in M
    fn equivalent_sodium(&self) -> f64 {
        let free_divalent = (self.conditions.divalent_mm - self.conditions.dntp_mm).max(0.0);
        (self.conditions.monovalent_mm + 120.0 * free_divalent.sqrt()) / 1000.0
    }

    /// Entropy salt correction for a stretch with `stacks` nearest-neighbor steps
    fn salt_entropy(&self, stacks: usize) -> f64 {
        0.368 * stacks as f64 * self.equivalent_sodium().ln()
    }

    /// Tm of a two-molecule duplex given raw enthalpy (kcal/mol) and entropy (cal/K/mol)
    fn bimolecular_tm(&self, dh: f64, ds: f64, length: usize, symmetric: bool) -> f64 {
        let ct = self.conditions.dna_nm * 1e-9;
        let (ct_factor, symmetry_ds) = if symmetric { (1.0, -1.4) } else { (4.0, 0.0) };
        let total_ds = ds + symmetry_ds + self.salt_entropy(length - 1) + GAS_CONSTANT * (ct / ct_factor).ln();
        1000.0 * dh / total_ds - KELVIN
    }

    /// Returns the Tm of the strongest complementary stem found on any antiparallel diagonal.
    /// # Arguments
    /// * `sequence` - the sequence folding onto (hairpin) or pairing with (homodimer) itself
    /// * `hairpin` - if true, both arms come from one molecule and must enclose a loop
    fn strongest_stem_tm(&self, sequence: &[u8], hairpin: bool) -> f64 {
        let n = sequence.len();
        if n < MIN_STEM_LENGTH {
            return 0.0;
        }

        let mut best_tm: f64 = 0.0;
        // diagonal `c` pairs position i with position c - i
        for c in 1..(2 * n - 2) {
            let first_i = c.saturating_sub(n - 1);
            let last_i = c.min(n - 1);
            let mut run_start: Option<usize> = None;
            for i in first_i..=last_i {
                let k = c - i;
                let loop_ok = !hairpin || (k > i && k - i - 1 >= MIN_LOOP_LENGTH);
                if loop_ok && complement_base(sequence[i]) == sequence[k] {
                    run_start.get_or_insert(i);
                } else if let Some(start) = run_start.take() {
                    best_tm = best_tm.max(self.stem_tm(sequence, start, i, c, hairpin));
                }
            }
            if let Some(start) = run_start {
                best_tm = best_tm.max(self.stem_tm(sequence, start, last_i + 1, c, hairpin));
            }
        }
        best_tm
    }

    /// Tm of the stem `sequence[start..end]` paired along diagonal `c`, 0.0 if it is too short
    fn stem_tm(&self, sequence: &[u8], start: usize, end: usize, c: usize, hairpin: bool) -> f64 {
        if end - start < MIN_STEM_LENGTH {
            return 0.0;
        }
        let stem = &sequence[start..end];
        let tm = if hairpin {
            // the loop sits between the innermost pair
            let inner_i = end - 1;
            let inner_k = c - inner_i;
            self.hairpin_stem_tm(stem, inner_k - inner_i - 1)
        } else {
            let (dh, ds) = duplex_thermo(stem);
            self.bimolecular_tm(dh, ds, stem.len(), false)
        };
        tm.max(0.0)
    }

    /// Unimolecular Tm for a hairpin stem closing a loop of the given length
    fn hairpin_stem_tm(&self, stem: &[u8], loop_length: usize) -> f64 {
        let (dh, ds) = stack_thermo(stem);
        let loop_ds = -1000.0 * hairpin_loop_dg(loop_length) / (37.0 + KELVIN);
        1000.0 * dh / (ds + loop_ds + self.salt_entropy(stem.len() - 1)) - KELVIN
    }
}

impl ThermoCalculator for NearestNeighborThermo {
    fn melting_temperature(&self, sequence: &[u8]) -> f64 {
        if sequence.len() < 2 {
            return 0.0;
        }
        let (dh, ds) = duplex_thermo(sequence);
        let symmetric = reverse_complement(sequence) == sequence;
        self.bimolecular_tm(dh, ds, sequence.len(), symmetric)
    }

    fn hairpin_tm(&self, sequence: &[u8]) -> f64 {
        self.strongest_stem_tm(sequence, true)
    }

    fn homodimer_tm(&self, sequence: &[u8]) -> f64 {
        self.strongest_stem_tm(sequence, false)
    }
}

/// Nearest-neighbor enthalpy (kcal/mol) and entropy (cal/K/mol) for the 5'->3' step `a b`
fn stack_params(a: u8, b: u8) -> Option<(f64, f64)> {
    let params = match (a, b) {
        (b'A', b'A') | (b'T', b'T') => (-7.9, -22.2),
        (b'A', b'T') => (-7.2, -20.4),
        (b'T', b'A') => (-7.2, -21.3),
        (b'C', b'A') | (b'T', b'G') => (-8.5, -22.7),
        (b'G', b'T') | (b'A', b'C') => (-8.4, -22.4),
        (b'C', b'T') | (b'A', b'G') => (-7.8, -21.0),
        (b'G', b'A') | (b'T', b'C') => (-8.2, -22.2),
        (b'C', b'G') => (-10.6, -27.2),
        (b'G', b'C') => (-9.8, -24.4),
        (b'G', b'G') | (b'C', b'C') => (-8.0, -19.9),
        _ => return None
    };
    Some(params)
}

/// Initiation parameters for a terminal base pair
fn terminal_params(base: u8) -> (f64, f64) {
    match base {
        b'G' | b'C' => (0.1, -2.8),
        _ => (2.3, 4.1)
    }
}

/// Sums the stacking terms over a sequence
fn stack_thermo(sequence: &[u8]) -> (f64, f64) {
    sequence.windows(2)
        .filter_map(|w| stack_params(w[0], w[1]))
        .fold((0.0, 0.0), |(dh, ds), (h, s)| (dh + h, ds + s))
}

/// Stacking plus initiation terms for a full duplex
fn duplex_thermo(sequence: &[u8]) -> (f64, f64) {
    let (mut dh, mut ds) = stack_thermo(sequence);
    for &end in [sequence[0], sequence[sequence.len() - 1]].iter() {
        let (h, s) = terminal_params(end);
        dh += h;
        ds += s;
    }
    (dh, ds)
}

/// Free energy penalty (kcal/mol at 37C) for closing a hairpin loop, SantaLucia & Hicks (2004)
fn hairpin_loop_dg(loop_length: usize) -> f64 {
    const LOOP_DG: [f64; 8] = [3.5, 3.5, 3.3, 4.0, 4.2, 4.3, 4.5, 4.6];
    match loop_length {
        0..=2 => f64::INFINITY,
        3..=10 => LOOP_DG[loop_length - 3],
        _ => {
            // Jacobson-Stockmayer extrapolation from the longest tabulated loop
            LOOP_DG[7] + 2.44 * GAS_CONSTANT * (37.0 + KELVIN) / 1000.0 * (loop_length as f64 / 10.0).ln()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_sodium() {
        let thermo = NearestNeighborThermo::default();
        let expected = (50.0 + 120.0 * 0.9_f64.sqrt()) / 1000.0;
        assert!((thermo.equivalent_sodium() - expected).abs() < 1e-12);

        // dNTPs above the divalent concentration chelate all of it
        let thermo = NearestNeighborThermo::new(
            ThermoConditionsBuilder::default()
                .divalent_mm(0.5)
                .dntp_mm(0.6)
                .build().unwrap()
        );
        assert!((thermo.equivalent_sodium() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_melting_temperature_ranges() {
        let thermo = NearestNeighborThermo::default();
        let typical = thermo.melting_temperature(b"ACCAGGAACTAATCAGACAAG");
        assert!(typical > 40.0 && typical < 70.0, "{typical}");

        let gc_rich = thermo.melting_temperature(b"ACGGCGTCGGCAGCCGCTGA");
        let at_rich = thermo.melting_temperature(b"ATTAAATTTAATATAAATTA");
        assert!(gc_rich > at_rich + 20.0, "{gc_rich} {at_rich}");

        // more salt stabilizes the duplex
        let salty = NearestNeighborThermo::new(
            ThermoConditionsBuilder::default()
                .monovalent_mm(500.0)
                .build().unwrap()
        );
        assert!(salty.melting_temperature(b"ACCAGGAACTAATCAGACAAG") > typical);

        assert_eq!(thermo.melting_temperature(b"A"), 0.0);
    }

    #[test]
    fn test_no_secondary_structure() {
        let thermo = NearestNeighborThermo::default();
        // poly-A cannot pair with itself
        assert_eq!(thermo.hairpin_tm(b"AAAAAAAAAAAAAAAAAAAA"), 0.0);
        assert_eq!(thermo.homodimer_tm(b"AAAAAAAAAAAAAAAAAAAA"), 0.0);
        assert_eq!(thermo.hairpin_tm(b"ACG"), 0.0);
    }

    #[test]
    fn test_hairpin() {
        let thermo = NearestNeighborThermo::default();
        // GCGCGCG stem, AAAA loop, CGCGCGC stem
        let tm = thermo.hairpin_tm(b"GCGCGCGAAAACGCGCGC");
        assert!(tm > 40.0, "{tm}");
    }

    #[test]
    fn test_homodimer() {
        let thermo = NearestNeighborThermo::default();
        // fully palindromic, so it dimerizes end to end
        let palindrome = thermo.homodimer_tm(b"GGCCGGCCGGCCGGCC");
        let weak = thermo.homodimer_tm(b"AAAAAAAAAAAAGGCC");
        assert!(palindrome > weak, "{palindrome} {weak}");
        assert!(palindrome > 0.0);
    }

    #[test]
    fn test_hairpin_loop_dg() {
        assert!(hairpin_loop_dg(2).is_infinite());
        assert_eq!(hairpin_loop_dg(3), 3.5);
        assert_eq!(hairpin_loop_dg(10), 4.6);
        assert!(hairpin_loop_dg(20) > 4.6);
    }
}
