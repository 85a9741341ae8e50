
use crate::sequence_utils::{normalize_raw_sequence, reverse_complement, validate_sequence};

/// One member of the reference panel.
/// The reverse complement is computed once here since every RIGHT primer aligns against it.
#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    /// Identifier, e.g. the FASTA record id
    id: String,
    /// Forward strand sequence over {A,C,G,T}
    sequence: Vec<u8>,
    /// Cached reverse complement of `sequence`
    reverse_complement: Vec<u8>
}

impl Reference {
    /// Constructor for an already normalized sequence.
    /// # Arguments
    /// * `id` - the reference identifier
    /// * `sequence` - the forward strand sequence
    /// # Errors
    /// * if the sequence is empty or contains anything outside {A,C,G,T}
    pub fn new(id: &str, sequence: Vec<u8>) -> Result<Reference, Box<dyn std::error::Error>> {
        validate_sequence(id, &sequence)?;
        let reverse_complement = reverse_complement(&sequence);
        Ok(Reference {
            id: id.to_string(),
            sequence,
            reverse_complement
        })
    }

    /// Constructor for raw FASTA text; gaps are stripped and bases upper-cased before validation.
    /// # Arguments
    /// * `id` - the reference identifier
    /// * `raw` - the raw sequence, possibly aligned and mixed case
    /// # Errors
    /// * if anything other than {A,C,G,T} remains after normalization
    pub fn from_raw(id: &str, raw: &[u8]) -> Result<Reference, Box<dyn std::error::Error>> {
        Self::new(id, normalize_raw_sequence(raw))
    }

    // Getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn reverse_complement(&self) -> &[u8] {
        &self.reverse_complement
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference() {
        let reference = Reference::new("ref1", b"AACGT".to_vec()).unwrap();
        assert_eq!(reference.id(), "ref1");
        assert_eq!(reference.len(), 5);
        assert_eq!(reference.reverse_complement(), b"ACGTT");
    }

    #[test]
    fn test_from_raw() {
        let reference = Reference::from_raw("ref2", b"aa-cg--T").unwrap();
        assert_eq!(reference.sequence(), b"AACGT");

        let err = Reference::from_raw("ref3", b"AANCGT").unwrap_err();
        assert_eq!(err.to_string(), "InvalidSequenceAlphabet: sequence for ref3 has 'N' at position 2");
    }
}
