/*!
Reader for Agilent `.d` directories.

The binary layout of a `.d` directory is not publicly documented and is only
accessible through Agilent's proprietary MassHunter data access library. This module
therefore talks to the store through the [`MassSpecDataReader`] seam: a thin mirror
of the vendor accessor surface that a platform-specific driver implements. Everything
above the seam, index translation, classification mapping, and derived quantities, is
vendor-independent and lives here.
*/
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use regex::Regex;

use crate::io::traits::{SpectralFile, SpectralFileError};
use crate::spectrum::{
    DissociationType, MassAnalyzerType, MassRange, MassSpectrum, ScanPolarity,
};

/// The vendor library's ion polarity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IonPolarity {
    Positive,
    Negative,
    Mixed,
    Unassigned,
}

/// The vendor library's acquisition level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsLevel {
    Ms,
    MsMs,
}

/// The vendor library's device classification for the instrument segment that
/// produced a spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    IonTrap,
    Quadrupole,
    TandemQuadrupole,
    QuadrupoleTimeOfFlight,
    TimeOfFlight,
    Unknown,
}

/// Translation table from the vendor polarity codes onto the internal closed set.
/// Codes without a clean counterpart fall back to `Neutral`.
impl From<IonPolarity> for ScanPolarity {
    fn from(value: IonPolarity) -> Self {
        match value {
            IonPolarity::Positive => ScanPolarity::Positive,
            IonPolarity::Negative => ScanPolarity::Negative,
            _ => ScanPolarity::Neutral,
        }
    }
}

/// Translation table from the vendor device classification onto the internal
/// analyzer set, with an `Unknown` fallback.
impl From<DeviceType> for MassAnalyzerType {
    fn from(value: DeviceType) -> Self {
        match value {
            DeviceType::IonTrap => MassAnalyzerType::IonTrap3D,
            DeviceType::Quadrupole | DeviceType::TandemQuadrupole => {
                MassAnalyzerType::Quadrupole
            }
            DeviceType::QuadrupoleTimeOfFlight | DeviceType::TimeOfFlight => {
                MassAnalyzerType::TOF
            }
            _ => MassAnalyzerType::Unknown,
        }
    }
}

/// One entry of the vendor scan record table, addressed by 0-based scan index
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub retention_time: f64,
    pub ms_level: MsLevel,
    pub ion_polarity: IonPolarity,
    /// The precursor m/z for fragmentation scans, 0 otherwise
    pub mz_of_interest: f64,
}

/// The signal and per-spectrum device metadata the vendor library reports
#[derive(Debug, Clone, PartialEq)]
pub struct SpecData {
    pub mz_array: Vec<f64>,
    pub intensity_array: Vec<f32>,
    pub device_type: DeviceType,
    /// The measured m/z range as `(start, end)`
    pub measured_mass_range: (f64, f64),
    /// The assigned precursor charge, 0 when unassigned
    pub precursor_charge: i32,
}

/// One named "actual value" record, an instrument reading logged against a
/// retention time
#[derive(Debug, Clone, PartialEq)]
pub struct ActualValue {
    pub display_name: String,
    pub display_value: String,
}

/// The time axis of the total-ion-chromatogram trace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChromData {
    pub times: Vec<f64>,
}

/**
The seam to the vendor data access library. Implementations delegate each call to
whatever native accessor is available on the platform; all indices are the vendor's
own 0-based scan indices.
*/
pub trait MassSpecDataReader {
    fn total_scans(&self) -> usize;

    fn scan_record(&mut self, index: usize) -> io::Result<ScanRecord>;

    fn spectrum_data(&mut self, index: usize) -> io::Result<SpecData>;

    /// The "actual value" records logged at `retention_time`
    fn actuals_at(&mut self, retention_time: f64) -> io::Result<Vec<ActualValue>>;

    fn tic(&mut self) -> io::Result<ChromData>;

    /// The acquisition method document (`AcqData/AcqMethod.xml`) as text
    fn acquisition_method(&mut self) -> io::Result<String>;

    fn close(&mut self);
}

/// Constructor for a platform-specific [`MassSpecDataReader`] over a `.d` directory
pub type DriverFactory = Box<dyn Fn(&Path) -> io::Result<Box<dyn MassSpecDataReader>>>;

/**
An Agilent `.d` directory exposed through the [`SpectralFile`] capability interface.

The connection is created lazily on [`SpectralFile::open`] through the supplied
driver factory, and spectrum numbers are shifted between the interface's 1-based
convention and the vendor's 0-based scan indices.
*/
pub struct AgilentDDirectory {
    path: PathBuf,
    stem: String,
    factory: DriverFactory,
    driver: Option<Box<dyn MassSpecDataReader>>,
}

impl AgilentDDirectory {
    pub fn new(path: impl Into<PathBuf>, factory: DriverFactory) -> AgilentDDirectory {
        let path = path.into();
        let stem = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.split('.').next())
            .unwrap_or_default()
            .to_string();
        AgilentDDirectory {
            path,
            stem,
            factory,
            driver: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn driver_mut(&mut self) -> Result<&mut (dyn MassSpecDataReader + 'static), SpectralFileError> {
        self.driver.as_deref_mut().ok_or(SpectralFileError::NotOpen)
    }
}

impl SpectralFile for AgilentDDirectory {
    fn open(&mut self) -> Result<(), SpectralFileError> {
        if self.driver.is_some() {
            return Ok(());
        }
        let driver = (self.factory)(&self.path).map_err(SpectralFileError::FileAccess)?;
        self.driver = Some(driver);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.close();
        }
    }

    fn is_open(&self) -> bool {
        self.driver.is_some()
    }

    fn file_stem(&self) -> &str {
        &self.stem
    }

    fn first_spectrum_number(&mut self) -> Result<usize, SpectralFileError> {
        Ok(1)
    }

    fn last_spectrum_number(&mut self) -> Result<usize, SpectralFileError> {
        Ok(self.driver_mut()?.total_scans())
    }

    fn retention_time(&mut self, spectrum_number: usize) -> Result<f64, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        let record = self.driver_mut()?.scan_record(spectrum_number - 1)?;
        Ok(record.retention_time)
    }

    fn msn_order(&mut self, spectrum_number: usize) -> Result<u8, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        let record = self.driver_mut()?.scan_record(spectrum_number - 1)?;
        Ok(match record.ms_level {
            MsLevel::MsMs => 2,
            MsLevel::Ms => 1,
        })
    }

    fn polarity(&mut self, spectrum_number: usize) -> Result<ScanPolarity, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        let record = self.driver_mut()?.scan_record(spectrum_number - 1)?;
        Ok(record.ion_polarity.into())
    }

    fn mz_spectrum(&mut self, spectrum_number: usize) -> Result<MassSpectrum, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        let data = self.driver_mut()?.spectrum_data(spectrum_number - 1)?;
        Ok(MassSpectrum::new(data.mz_array, data.intensity_array))
    }

    fn mz_analyzer(
        &mut self,
        spectrum_number: usize,
    ) -> Result<MassAnalyzerType, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        let data = self.driver_mut()?.spectrum_data(spectrum_number - 1)?;
        Ok(data.device_type.into())
    }

    fn mz_range(&mut self, spectrum_number: usize) -> Result<MassRange, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        let data = self.driver_mut()?.spectrum_data(spectrum_number - 1)?;
        let (start, end) = data.measured_mass_range;
        Ok(MassRange::new(start, end))
    }

    /// Derived, not stored: the product of the "Number of Transients" and
    /// "Length of Transients" actual values logged at the scan's retention time,
    /// `NaN` when either is absent.
    ///
    /// Caveat: under extended dynamic range acquisition the instrument interleaves
    /// two transient sets per scan and this figure may be off by a factor of two.
    fn injection_time(&mut self, spectrum_number: usize) -> Result<f64, SpectralFileError> {
        let retention_time = self.retention_time(spectrum_number)?;
        let actuals = self.driver_mut()?.actuals_at(retention_time)?;
        let mut number_of_transients: Option<f64> = None;
        let mut length_of_transients: Option<f64> = None;
        for actual in actuals {
            match actual.display_name.as_str() {
                "Number of Transients" => {
                    number_of_transients = actual.display_value.trim().parse().ok();
                }
                "Length of Transients" => {
                    length_of_transients = actual.display_value.trim().parse().ok();
                }
                _ => {}
            }
        }
        match (number_of_transients, length_of_transients) {
            (Some(n), Some(len)) => Ok(n * len),
            _ => Ok(f64::NAN),
        }
    }

    /// Not recorded by this instrument family
    fn resolution(&mut self, spectrum_number: usize) -> Result<f64, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        Ok(f64::NAN)
    }

    fn precursor_mz_of(
        &mut self,
        spectrum_number: usize,
        _msn_order: u8,
    ) -> Result<f64, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        let record = self.driver_mut()?.scan_record(spectrum_number - 1)?;
        Ok(record.mz_of_interest)
    }

    fn precursor_charge_of(
        &mut self,
        spectrum_number: usize,
        _msn_order: u8,
    ) -> Result<i32, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        let data = self.driver_mut()?.spectrum_data(spectrum_number - 1)?;
        Ok(data.precursor_charge)
    }

    /// The isolation width is not stored per scan, it is configured once in the
    /// acquisition method document.
    fn isolation_width_of(
        &mut self,
        spectrum_number: usize,
        _msn_order: u8,
    ) -> Result<f64, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        let document = self.driver_mut()?.acquisition_method()?;
        isolation_width_from_method(&document)
    }

    /// This instrument family only performs collision-induced dissociation
    fn dissociation_type_of(
        &mut self,
        spectrum_number: usize,
        _msn_order: u8,
    ) -> Result<DissociationType, SpectralFileError> {
        self.check_spectrum_number(spectrum_number)?;
        Ok(DissociationType::CID)
    }

    fn spectrum_number(&mut self, retention_time: f64) -> Result<usize, SpectralFileError> {
        let tic = self.driver_mut()?.tic()?;
        let mut index: Option<usize> = None;
        for (i, time) in tic.times.iter().enumerate() {
            match index {
                Some(j) if (time - retention_time).abs() >= (tic.times[j] - retention_time).abs() => {}
                _ => index = Some(i),
            }
        }
        index.map(|i| i + 1).ok_or_else(|| {
            SpectralFileError::Malformed(
                "the total-ion-chromatogram trace contains no data points".to_string(),
            )
        })
    }
}

impl Drop for AgilentDDirectory {
    fn drop(&mut self) {
        self.close();
    }
}

/// Extract the target isolation width, in amu, from an acquisition method
/// document.
///
/// The value is located structurally first: the `Value` element following an `ID`
/// element reading `TargetIsolationWidth`. Some methods embed that section as
/// escaped markup inside another document, where no structure is visible; those
/// fall back to a pattern match over the serialized text.
fn isolation_width_from_method(document: &str) -> Result<f64, SpectralFileError> {
    if let Some(text) = target_isolation_width_value(document) {
        return parse_amu_value(&text).ok_or_else(|| {
            SpectralFileError::Malformed(format!(
                "could not read an isolation width out of {text:?}"
            ))
        });
    }
    let pattern = legacy_isolation_width_pattern();
    if let Some(captures) = pattern.captures(document) {
        // The single-character capture group reproduces the legacy extractor
        // exactly: a width with more than one digit is truncated to its last
        // digit here. The structured path above is not affected.
        if let Ok(width) = captures[1].parse() {
            return Ok(width);
        }
    }
    Err(SpectralFileError::Malformed(
        "no TargetIsolationWidth entry found in the acquisition method".to_string(),
    ))
}

/// Walk the method document and return the text of the `Value` element paired with
/// the `TargetIsolationWidth` ID, if the document is structured XML
fn target_isolation_width_value(document: &str) -> Option<String> {
    let mut reader = XmlReader::from_str(document);
    reader.trim_text(true);
    let mut current: Option<Vec<u8>> = None;
    let mut armed = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => current = Some(e.local_name().as_ref().to_vec()),
            Ok(Event::Text(t)) => {
                let text = t.unescape().ok()?.into_owned();
                match current.as_deref() {
                    Some(b"ID") => armed = text == "TargetIsolationWidth",
                    Some(b"Value") if armed => return Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

fn parse_amu_value(text: &str) -> Option<f64> {
    static AMU_VALUE: OnceLock<Regex> = OnceLock::new();
    let pattern = AMU_VALUE.get_or_init(|| Regex::new(r"\(~([0-9.]+) amu\)").unwrap());
    pattern.captures(text)?[1].parse().ok()
}

fn legacy_isolation_width_pattern() -> &'static Regex {
    static LEGACY: OnceLock<Regex> = OnceLock::new();
    LEGACY.get_or_init(|| {
        Regex::new(
            r"(?:&lt;|<)ID(?:&gt;|>)TargetIsolationWidth(?:&lt;|<)/ID(?:&gt;|>)\s*(?:&lt;|<)Value(?:&gt;|>).*\(~([0-9.])+ amu\)(?:&lt;|<)/Value(?:&gt;|>)",
        )
        .unwrap()
    })
}


#[cfg(test)]
mod test {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_open_is_idempotent_and_close_is_safe() {
        let mut file = synthetic_directory("test/data/sample1.d");
        assert!(!file.is_open());
        file.close();
        file.open().unwrap();
        file.open().unwrap();
        assert!(file.is_open());
        assert_eq!(file.file_stem(), "sample1");
        file.close();
        assert!(!file.is_open());
    }

    #[test]
    fn test_open_failure_is_a_file_access_error() {
        let mut file = AgilentDDirectory::new(
            "test/data/missing.d",
            Box::new(|path| {
                Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                ))
            }),
        );
        match file.open() {
            Err(SpectralFileError::FileAccess(_)) => {}
            other => panic!("expected a FileAccess error, got {other:?}"),
        }
    }

    #[test]
    fn test_accessors_require_open() {
        let mut file = synthetic_directory("test/data/sample1.d");
        assert!(matches!(
            file.last_spectrum_number(),
            Err(SpectralFileError::NotOpen)
        ));
    }

    #[test]
    fn test_all_spectra_are_readable() {
        let mut file = synthetic_directory("test/data/sample1.d");
        file.open().unwrap();
        assert_eq!(file.first_spectrum_number().unwrap(), 1);
        assert_eq!(file.last_spectrum_number().unwrap(), 4);
        for n in 1..=4 {
            let order = file.msn_order(n).unwrap();
            assert!(order == 1 || order == 2);
            assert!(file.retention_time(n).unwrap() > 0.0);
            file.polarity(n).unwrap();
            file.mz_analyzer(n).unwrap();
            let signal = file.mz_spectrum(n).unwrap();
            assert!(!signal.is_empty());
            let range = file.mz_range(n).unwrap();
            assert!(range.width() > 0.0);
            file.injection_time(n).unwrap();
            assert!(file.resolution(n).unwrap().is_nan());
        }
    }

    #[test]
    fn test_out_of_range_spectrum_numbers() {
        let mut file = synthetic_directory("test/data/sample1.d");
        file.open().unwrap();
        for n in [0usize, 5, 100] {
            match file.retention_time(n) {
                Err(SpectralFileError::OutOfRange { number, first, last }) => {
                    assert_eq!(number, n);
                    assert_eq!((first, last), (1, 4));
                }
                other => panic!("expected OutOfRange for {n}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_polarity_translation() {
        let mut file = synthetic_directory("test/data/sample1.d");
        file.open().unwrap();
        assert_eq!(file.polarity(1).unwrap(), ScanPolarity::Positive);
        assert_eq!(file.polarity(3).unwrap(), ScanPolarity::Negative);
        assert_eq!(ScanPolarity::from(IonPolarity::Mixed), ScanPolarity::Neutral);
        assert_eq!(
            ScanPolarity::from(IonPolarity::Unassigned),
            ScanPolarity::Neutral
        );
    }

    #[test]
    fn test_analyzer_translation() {
        assert_eq!(
            MassAnalyzerType::from(DeviceType::IonTrap),
            MassAnalyzerType::IonTrap3D
        );
        assert_eq!(
            MassAnalyzerType::from(DeviceType::TandemQuadrupole),
            MassAnalyzerType::Quadrupole
        );
        assert_eq!(
            MassAnalyzerType::from(DeviceType::TimeOfFlight),
            MassAnalyzerType::TOF
        );
        assert_eq!(
            MassAnalyzerType::from(DeviceType::Unknown),
            MassAnalyzerType::Unknown
        );
    }

    #[test]
    fn test_spectrum_number_by_time() {
        let mut file = synthetic_directory("test/data/sample1.d");
        file.open().unwrap();
        assert_eq!(file.spectrum_number(0.8).unwrap(), 2);
        assert_eq!(file.spectrum_number(0.0).unwrap(), 1);
        assert_eq!(file.spectrum_number(5.0).unwrap(), 4);
    }

    #[test]
    fn test_spectrum_number_ties_break_to_the_earliest_index() {
        let mut file = AgilentDDirectory::new(
            "test/data/sample1.d",
            Box::new(|_| {
                let mut driver = SyntheticDataReader::small();
                driver.tic_times = vec![1.0, 3.0, 5.0];
                Ok(Box::new(driver) as Box<dyn MassSpecDataReader>)
            }),
        );
        file.open().unwrap();
        assert_eq!(file.spectrum_number(2.0).unwrap(), 1);
        assert_eq!(file.spectrum_number(4.0).unwrap(), 2);
    }

    #[test]
    fn test_injection_time_is_the_transients_product() {
        let mut file = synthetic_directory("test/data/sample1.d");
        file.open().unwrap();
        assert!((file.injection_time(2).unwrap() - 1.0).abs() < 1e-9);
        // one of the two actual values is missing for this scan
        assert!(file.injection_time(3).unwrap().is_nan());
        // no actuals logged at this retention time at all
        assert!(file.injection_time(1).unwrap().is_nan());
    }

    #[test]
    fn test_isolation_width_structured() {
        let mut file = synthetic_directory("test/data/sample1.d");
        file.open().unwrap();
        assert!((file.isolation_width(2).unwrap() - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_isolation_width_fallback_on_escaped_markup() {
        let escaped = r#"<?xml version="1.0"?>
<Method>
  <Section>&lt;ID&gt;TargetIsolationWidth&lt;/ID&gt;&lt;Value&gt;Narrow (~4 amu)&lt;/Value&gt;</Section>
</Method>
"#;
        assert!((isolation_width_from_method(escaped).unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_isolation_width_fallback_truncates_to_the_last_digit() {
        // the legacy pattern's capture group only retains one character; this
        // pins the behavior rather than silently changing it
        let escaped = r#"<Section>&lt;ID&gt;TargetIsolationWidth&lt;/ID&gt;&lt;Value&gt;Medium (~2.5 amu)&lt;/Value&gt;</Section>"#;
        assert!((isolation_width_from_method(escaped).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_isolation_width_missing() {
        assert!(matches!(
            isolation_width_from_method("<Method></Method>"),
            Err(SpectralFileError::Malformed(_))
        ));
    }

    #[test]
    fn test_full_spectrum_assembly() {
        let mut file = synthetic_directory("test/data/sample1.d");
        file.open().unwrap();

        let survey = file.spectrum(1).unwrap();
        assert_eq!(survey.ms_level, 1);
        assert!(!survey.is_msn());
        assert_eq!(survey.precursor_mz, None);
        assert_eq!(survey.dissociation, DissociationType::Unknown);

        let product = file.spectrum(2).unwrap();
        assert_eq!(product.ms_level, 2);
        assert!((product.precursor_mz.unwrap() - 522.29).abs() < 1e-9);
        assert_eq!(product.precursor_charge, Some(2));
        assert_eq!(product.dissociation, DissociationType::CID);
        assert_eq!(product.mz_analyzer, MassAnalyzerType::TOF);
        assert_eq!(product.signal.len(), 3);

        // an unassigned vendor charge of 0 maps to None
        let unassigned = file.spectrum(3).unwrap();
        assert_eq!(unassigned.precursor_charge, None);
    }
}
