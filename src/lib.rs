//! `mzlink` ties search-engine identifications back to the mass spectrometry data
//! files they were derived from. It reads peptide-spectrum matches out of OMSSA CSV
//! results, applies fixed and variable modifications, and resolves each match's
//! source file and spectrum number into a full [`spectrum::Spectrum`] record
//! through the [`io::SpectralFile`] capability interface.

pub mod identification;
pub mod io;
pub mod spectrum;

pub use crate::identification::{
    FixedModificationSet, Modification, Peptide, PeptideSpectralMatch, Protein, ScoreType,
};
pub use crate::io::agilent::AgilentDDirectory;
pub use crate::io::omssa::{ModificationDictionary, OmssaCsvPsmReader, PsmReaderError};
pub use crate::io::registry::SpectralFileRegistry;
pub use crate::io::traits::{SpectralFile, SpectralFileError};
pub use crate::spectrum::{MassSpectrum, Spectrum};
