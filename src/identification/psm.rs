use indexmap::IndexMap;

use crate::spectrum::Spectrum;

use super::peptide::Peptide;

/// The kind of confidence score attached to a [`PeptideSpectralMatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreType {
    EValue,
}

impl Default for ScoreType {
    fn default() -> ScoreType {
        ScoreType::EValue
    }
}

/**
An assignment of a peptide to an observed spectrum, as reported by a search engine.

The `spectrum` field stays `None` until the originating spectral data file has been
resolved and the scan fetched; a PSM whose file is unknown is still a valid record.
The match never owns the scan data in the backing file, it carries a copied-out
[`Spectrum`] snapshot.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct PeptideSpectralMatch {
    pub peptide: Peptide,
    pub score: f64,
    pub score_type: ScoreType,
    pub charge: i32,
    /// Whether the matched protein record follows the decoy naming convention
    pub is_decoy: bool,
    /// The source file name exactly as recorded in the search result
    pub file_name: String,
    /// The 1-based spectrum number within the source file
    pub spectrum_number: usize,
    pub spectrum: Option<Spectrum>,
    extra: IndexMap<String, String>,
}

impl PeptideSpectralMatch {
    pub fn new(peptide: Peptide, score: f64, charge: i32) -> PeptideSpectralMatch {
        PeptideSpectralMatch {
            peptide,
            score,
            score_type: ScoreType::default(),
            charge,
            is_decoy: false,
            file_name: String::new(),
            spectrum_number: 0,
            spectrum: None,
            extra: IndexMap::new(),
        }
    }

    /// Attach a named attribute copied verbatim from the result record, keyed by
    /// the original column name
    pub fn add_extra_data(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.extra.insert(name.into(), value.into());
    }

    pub fn extra_data(&self, name: &str) -> Option<&str> {
        self.extra.get(name).map(|v| v.as_str())
    }

    /// The extra attributes in the order they were attached
    pub fn extra(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_extra_data_preserves_order() {
        let mut psm = PeptideSpectralMatch::new(Peptide::new("PEPTIDE"), 0.01, 2);
        psm.add_extra_data("NIST score", "0");
        psm.add_extra_data("gi", "4503571");
        let keys: Vec<_> = psm.extra().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["NIST score", "gi"]);
        assert_eq!(psm.extra_data("gi"), Some("4503571"));
        assert_eq!(psm.extra_data("missing"), None);
    }
}
