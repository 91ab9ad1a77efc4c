//! Readers for spectral data files and search-engine result files, and the
//! capability interface that lets the PSM pipeline treat every backing format
//! the same way.

pub mod agilent;
pub mod omssa;
pub mod registry;
pub mod traits;

pub use agilent::AgilentDDirectory;
pub use omssa::{ModificationDictionary, OmssaCsvPsmReader, PsmReaderError};
pub use registry::SpectralFileRegistry;
pub use traits::{SpectralFile, SpectralFileError};
