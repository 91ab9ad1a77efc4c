//! The common in-memory representation of mass spectra and their scan-level
//! metadata, independent of the file format they were read from.

pub mod scan;
pub mod scan_properties;
pub mod signal;

pub use scan::Spectrum;
pub use scan_properties::{DissociationType, MassAnalyzerType, MassRange, ScanPolarity};
pub use signal::MassSpectrum;
