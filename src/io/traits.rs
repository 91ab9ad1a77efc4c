use std::io;

use thiserror::Error;

use crate::spectrum::{
    DissociationType, MassAnalyzerType, MassRange, MassSpectrum, ScanPolarity, Spectrum,
};

/// Errors that may arise while opening or reading a spectral data file
#[derive(Debug, Error)]
pub enum SpectralFileError {
    /// The backing store is missing or could not be read
    #[error("The spectral data file could not be accessed: {0}")]
    FileAccess(#[source] io::Error),
    /// The backing store was readable but its content did not make sense
    #[error("The spectral data file is malformed: {0}")]
    Malformed(String),
    /// A spectrum number outside `[first, last]` was requested
    #[error("Spectrum number {number} is outside the valid range [{first}, {last}]")]
    OutOfRange {
        number: usize,
        first: usize,
        last: usize,
    },
    /// A per-spectrum accessor was called before `open`
    #[error("The spectral data file has not been opened")]
    NotOpen,
}

impl From<io::Error> for SpectralFileError {
    fn from(value: io::Error) -> Self {
        SpectralFileError::FileAccess(value)
    }
}

impl From<SpectralFileError> for io::Error {
    fn from(value: SpectralFileError) -> Self {
        let s = value.to_string();
        match value {
            SpectralFileError::FileAccess(e) => e,
            SpectralFileError::Malformed(_) => io::Error::new(io::ErrorKind::InvalidData, s),
            SpectralFileError::OutOfRange { .. } => io::Error::new(io::ErrorKind::NotFound, s),
            SpectralFileError::NotOpen => io::Error::new(io::ErrorKind::NotConnected, s),
        }
    }
}

/**
A capability interface over any source of mass spectra addressable by a contiguous,
1-based spectrum number.

The connection to the backing store is established lazily by [`SpectralFile::open`],
which must be idempotent because several consumers may trigger it independently.
Spectrum numbers are stable for the lifetime of an open file and span the inclusive
range `[first_spectrum_number, last_spectrum_number]`; accessors fail with
[`SpectralFileError::OutOfRange`] outside it.

The MSn-specific accessors come in pairs: a `*_of` method taking the MS order
explicitly, and a provided convenience method fixed at MS order 2, the common case.
*/
pub trait SpectralFile {
    /// Establish the connection to the backing store. Calling `open` on an already
    /// open file is a no-op.
    fn open(&mut self) -> Result<(), SpectralFileError>;

    /// Release the connection to the backing store. Safe to call on a file that
    /// was never opened.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// The filename stem this file is registered under, the part of the file name
    /// before the first `.`
    fn file_stem(&self) -> &str;

    /// The smallest valid spectrum number, inclusive
    fn first_spectrum_number(&mut self) -> Result<usize, SpectralFileError>;

    /// The largest valid spectrum number, inclusive
    fn last_spectrum_number(&mut self) -> Result<usize, SpectralFileError>;

    /// Verify that `spectrum_number` falls inside the valid range
    fn check_spectrum_number(&mut self, spectrum_number: usize) -> Result<(), SpectralFileError> {
        let first = self.first_spectrum_number()?;
        let last = self.last_spectrum_number()?;
        if spectrum_number < first || spectrum_number > last {
            Err(SpectralFileError::OutOfRange {
                number: spectrum_number,
                first,
                last,
            })
        } else {
            Ok(())
        }
    }

    /// The retention time of the scan, in minutes
    fn retention_time(&mut self, spectrum_number: usize) -> Result<f64, SpectralFileError>;

    /// The stage of tandem fragmentation of the scan, 1 or 2
    fn msn_order(&mut self, spectrum_number: usize) -> Result<u8, SpectralFileError>;

    fn polarity(&mut self, spectrum_number: usize) -> Result<ScanPolarity, SpectralFileError>;

    fn mz_spectrum(&mut self, spectrum_number: usize) -> Result<MassSpectrum, SpectralFileError>;

    fn mz_analyzer(
        &mut self,
        spectrum_number: usize,
    ) -> Result<MassAnalyzerType, SpectralFileError>;

    fn mz_range(&mut self, spectrum_number: usize) -> Result<MassRange, SpectralFileError>;

    /// The ion injection or accumulation time for the scan, in milliseconds.
    /// `NaN` when the backing format does not record one.
    fn injection_time(&mut self, spectrum_number: usize) -> Result<f64, SpectralFileError>;

    /// The resolving power of the scan. `NaN` when the backing format does not
    /// record one.
    fn resolution(&mut self, spectrum_number: usize) -> Result<f64, SpectralFileError>;

    fn precursor_mz_of(
        &mut self,
        spectrum_number: usize,
        msn_order: u8,
    ) -> Result<f64, SpectralFileError>;

    fn precursor_mz(&mut self, spectrum_number: usize) -> Result<f64, SpectralFileError> {
        self.precursor_mz_of(spectrum_number, 2)
    }

    /// The reported precursor charge state. Zero when the backing format did not
    /// assign one.
    fn precursor_charge_of(
        &mut self,
        spectrum_number: usize,
        msn_order: u8,
    ) -> Result<i32, SpectralFileError>;

    fn precursor_charge(&mut self, spectrum_number: usize) -> Result<i32, SpectralFileError> {
        self.precursor_charge_of(spectrum_number, 2)
    }

    fn isolation_width_of(
        &mut self,
        spectrum_number: usize,
        msn_order: u8,
    ) -> Result<f64, SpectralFileError>;

    fn isolation_width(&mut self, spectrum_number: usize) -> Result<f64, SpectralFileError> {
        self.isolation_width_of(spectrum_number, 2)
    }

    fn dissociation_type_of(
        &mut self,
        spectrum_number: usize,
        msn_order: u8,
    ) -> Result<DissociationType, SpectralFileError>;

    fn dissociation_type(
        &mut self,
        spectrum_number: usize,
    ) -> Result<DissociationType, SpectralFileError> {
        self.dissociation_type_of(spectrum_number, 2)
    }

    /// Find the 1-based spectrum number whose time point in the total-ion-chromatogram
    /// trace lies nearest to `retention_time`. Ties break to the earliest index.
    fn spectrum_number(&mut self, retention_time: f64) -> Result<usize, SpectralFileError>;

    /// Assemble the full [`Spectrum`] record for a scan from the individual
    /// accessors. Precursor attributes are only populated for MSn scans, and a
    /// reported charge of zero is treated as unassigned.
    fn spectrum(&mut self, spectrum_number: usize) -> Result<Spectrum, SpectralFileError> {
        let ms_level = self.msn_order(spectrum_number)?;
        let mut scan = Spectrum {
            spectrum_number,
            retention_time: self.retention_time(spectrum_number)?,
            ms_level,
            polarity: self.polarity(spectrum_number)?,
            mz_analyzer: self.mz_analyzer(spectrum_number)?,
            mz_range: self.mz_range(spectrum_number)?,
            injection_time: self.injection_time(spectrum_number)?,
            resolution: self.resolution(spectrum_number)?,
            signal: self.mz_spectrum(spectrum_number)?,
            ..Spectrum::default()
        };
        if ms_level >= 2 {
            scan.precursor_mz = Some(self.precursor_mz(spectrum_number)?);
            let charge = self.precursor_charge(spectrum_number)?;
            scan.precursor_charge = (charge != 0).then_some(charge);
            scan.dissociation = self.dissociation_type(spectrum_number)?;
        }
        Ok(scan)
    }
}
