//! Peptides, proteins, modifications, and the peptide-spectrum match record that
//! ties a search-engine identification back to an observed spectrum.

pub mod modification;
pub mod peptide;
pub mod psm;

pub use modification::{FixedModificationSet, Modification};
pub use peptide::{Peptide, Protein, DECOY_PREFIX};
pub use psm::{PeptideSpectralMatch, ScoreType};
