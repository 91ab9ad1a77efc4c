use std::collections::BTreeMap;
use std::sync::Arc;

use super::modification::Modification;

/// The prefix marking a protein record as a decoy entry. Decoy databases use this
/// convention verbatim, so the match is case-sensitive.
pub const DECOY_PREFIX: &str = "DECOY";

/// A protein record as referenced by a search result, identified by its FASTA
/// description line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protein {
    /// The FASTA description ("defline") the search engine reported
    pub defline: String,
    pub accession: Option<String>,
    pub sequence: Option<String>,
}

impl Protein {
    pub fn new(defline: impl Into<String>) -> Protein {
        Protein {
            defline: defline.into(),
            accession: None,
            sequence: None,
        }
    }

    pub fn with_accession(mut self, accession: impl Into<String>) -> Protein {
        self.accession = Some(accession.into());
        self
    }

    pub fn is_decoy(&self) -> bool {
        self.defline.starts_with(DECOY_PREFIX)
    }
}

/**
An amino-acid sequence with a residue range within an optional parent protein and a
set of positional modifications.

The sequence is normalized to uppercase on construction. Modification positions are
1-based and unique per position; iteration is in ascending position order.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct Peptide {
    sequence: String,
    /// The 1-based residue in the parent protein where this peptide starts
    pub start_residue: usize,
    /// The 1-based residue in the parent protein where this peptide ends
    pub end_residue: usize,
    pub parent: Option<Arc<Protein>>,
    modifications: BTreeMap<usize, Modification>,
}

impl Peptide {
    pub fn new(sequence: impl AsRef<str>) -> Peptide {
        Peptide {
            sequence: sequence.as_ref().to_uppercase(),
            start_residue: 0,
            end_residue: 0,
            parent: None,
            modifications: BTreeMap::new(),
        }
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn residue(&self, position: usize) -> Option<char> {
        if position == 0 {
            return None;
        }
        self.sequence.chars().nth(position - 1)
    }

    /// Set the modification at a 1-based residue position, replacing any
    /// modification already present there
    pub fn set_modification(
        &mut self,
        modification: Modification,
        position: usize,
    ) -> Option<Modification> {
        self.modifications.insert(position, modification)
    }

    pub fn modification_at(&self, position: usize) -> Option<&Modification> {
        self.modifications.get(&position)
    }

    /// The positional modifications in ascending position order
    pub fn modifications(&self) -> impl Iterator<Item = (usize, &Modification)> {
        self.modifications.iter().map(|(i, m)| (*i, m))
    }

    pub fn modification_count(&self) -> usize {
        self.modifications.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sequence_normalized_to_uppercase() {
        let peptide = Peptide::new("pePTIdeK");
        assert_eq!(peptide.sequence(), "PEPTIDEK");
        assert_eq!(peptide.len(), 8);
        assert_eq!(peptide.residue(1), Some('P'));
        assert_eq!(peptide.residue(8), Some('K'));
        assert_eq!(peptide.residue(9), None);
        assert_eq!(peptide.residue(0), None);
    }

    #[test]
    fn test_set_modification_replaces() {
        let mut peptide = Peptide::new("PEPTIDE");
        assert!(peptide
            .set_modification(Modification::named("Oxidation"), 3)
            .is_none());
        let prev = peptide.set_modification(Modification::named("Phospho"), 3);
        assert_eq!(prev.unwrap().name, "Oxidation");
        assert_eq!(peptide.modification_count(), 1);
        assert_eq!(peptide.modification_at(3).unwrap().name, "Phospho");
    }

    #[test]
    fn test_decoy_prefix_is_case_sensitive() {
        assert!(Protein::new("DECOY_sp|P12345").is_decoy());
        assert!(!Protein::new("sp|P12345").is_decoy());
        assert!(!Protein::new("decoy_sp|P12345").is_decoy());
    }
}
