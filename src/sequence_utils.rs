
use simple_error::bail;

/// The gap symbol used in aligned rows
pub const GAP: u8 = b'-';

/// Returns the Watson-Crick complement of a single base; anything else (e.g. gaps) passes through unchanged.
/// # Arguments
/// * `base` - the base to complement
pub fn complement_base(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        other => other
    }
}

/// Returns the base-wise complement of a sequence without reversing it.
/// # Examples
/// ```rust
/// use primal_tiling::sequence_utils::complement;
/// assert_eq!(complement(b"AC-GT"), b"TG-CA".to_vec());
/// ```
pub fn complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().map(|&b| complement_base(b)).collect()
}

/// Returns the reverse complement of a sequence.
/// # Examples
/// ```rust
/// use primal_tiling::sequence_utils::reverse_complement;
/// assert_eq!(reverse_complement(b"AACG"), b"CGTT".to_vec());
/// ```
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|&b| complement_base(b)).collect()
}

/// Returns the GC content of a sequence as a percentage, 0.0 for an empty sequence.
pub fn gc_percent(sequence: &[u8]) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let gc_count = sequence.iter()
        .filter(|&&b| b == b'G' || b == b'C')
        .count();
    100.0 * gc_count as f64 / sequence.len() as f64
}

/// Returns true if the base is one of A, C, G, or T
pub fn is_nucleotide(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T')
}

/// Verifies that a sequence is non-empty and restricted to {A,C,G,T}.
/// # Arguments
/// * `label` - a name for the sequence, used in the error message
/// * `sequence` - the sequence to check
/// # Errors
/// * if the sequence is empty or contains any other character
pub fn validate_sequence(label: &str, sequence: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    if sequence.is_empty() {
        bail!("InvalidSequenceAlphabet: sequence for {label} is empty");
    }
    if let Some(position) = sequence.iter().position(|&b| !is_nucleotide(b)) {
        bail!(
            "InvalidSequenceAlphabet: sequence for {label} has '{}' at position {position}",
            sequence[position] as char
        );
    }
    Ok(())
}

/// Strips alignment gaps and upper-cases raw FASTA sequence text.
/// # Examples
/// ```rust
/// use primal_tiling::sequence_utils::normalize_raw_sequence;
/// assert_eq!(normalize_raw_sequence(b"ac-gT--a"), b"ACGTA".to_vec());
/// ```
pub fn normalize_raw_sequence(raw: &[u8]) -> Vec<u8> {
    raw.iter()
        .filter(|&&b| b != GAP)
        .map(|b| b.to_ascii_uppercase())
        .collect()
}

/// Removes gap symbols from an aligned row
pub fn ungapped(aligned: &[u8]) -> Vec<u8> {
    aligned.iter().cloned().filter(|&b| b != GAP).collect()
}
