use super::scan_properties::{DissociationType, MassAnalyzerType, MassRange, ScanPolarity};
use super::signal::MassSpectrum;

/**
A single scan read out of a spectral data file, carrying both its signal and the
descriptive metadata every backend can provide.

The precursor fields are only meaningful when `ms_level >= 2`. `resolution` and
`injection_time` may be `NaN` when the backing format does not record them.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// The 1-based spectrum number within the source file
    pub spectrum_number: usize,
    /// The retention time at which the scan was acquired, in minutes
    pub retention_time: f64,
    /// The stage of tandem fragmentation, 1 for a survey scan, 2 for a fragmentation scan
    pub ms_level: u8,
    pub polarity: ScanPolarity,
    pub mz_analyzer: MassAnalyzerType,
    pub dissociation: DissociationType,
    pub precursor_mz: Option<f64>,
    pub precursor_charge: Option<i32>,
    pub mz_range: MassRange,
    pub resolution: f64,
    pub injection_time: f64,
    pub signal: MassSpectrum,
}

impl Default for Spectrum {
    fn default() -> Spectrum {
        Spectrum {
            spectrum_number: 0,
            retention_time: 0.0,
            ms_level: 1,
            polarity: ScanPolarity::default(),
            mz_analyzer: MassAnalyzerType::default(),
            dissociation: DissociationType::default(),
            precursor_mz: None,
            precursor_charge: None,
            mz_range: MassRange::default(),
            resolution: f64::NAN,
            injection_time: f64::NAN,
            signal: MassSpectrum::default(),
        }
    }
}

impl Spectrum {
    /// Whether this scan is a fragmentation product scan
    pub fn is_msn(&self) -> bool {
        self.ms_level > 1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default() {
        let scan = Spectrum::default();
        assert_eq!(scan.ms_level, 1);
        assert!(!scan.is_msn());
        assert!(scan.resolution.is_nan());
        assert!(scan.injection_time.is_nan());
        assert_eq!(scan.precursor_mz, None);
    }
}
