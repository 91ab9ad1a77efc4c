/**
Describes the polarity of a scan. A spectrum is either `Positive` (1+), `Negative` (-1),
or `Neutral` (0). `Neutral` doubles as the fallback for vendor polarity codes that have
no sensible translation.
*/
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq)]
pub enum ScanPolarity {
    Neutral = 0,
    Positive = 1,
    Negative = -1,
}

impl Default for ScanPolarity {
    fn default() -> ScanPolarity {
        ScanPolarity::Neutral
    }
}

/**
The kind of mass analyzer a spectrum was acquired on. Every vendor backend maps its own
device classification onto this closed set, falling back to `Unknown` for anything it
does not recognize.
*/
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassAnalyzerType {
    Unknown = 0,
    Quadrupole,
    IonTrap2D,
    IonTrap3D,
    Orbitrap,
    TOF,
    FTICR,
    Sector,
}

impl Default for MassAnalyzerType {
    fn default() -> MassAnalyzerType {
        MassAnalyzerType::Unknown
    }
}

/**
The dissociation method used to fragment a precursor ion for an MSn scan.
*/
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DissociationType {
    Unknown = 0,
    CID,
    HCD,
    ETD,
    ECD,
}

impl Default for DissociationType {
    fn default() -> DissociationType {
        DissociationType::Unknown
    }
}

/// An inclusive m/z interval, such as the measured range of a scan.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MassRange {
    pub start: f64,
    pub end: f64,
}

impl MassRange {
    pub fn new(start: f64, end: f64) -> MassRange {
        MassRange { start, end }
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, mz: f64) -> bool {
        self.start <= mz && mz <= self.end
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(ScanPolarity::default(), ScanPolarity::Neutral);
        assert_eq!(MassAnalyzerType::default(), MassAnalyzerType::Unknown);
        assert_eq!(DissociationType::default(), DissociationType::Unknown);
    }

    #[test]
    fn test_mass_range() {
        let range = MassRange::new(100.0, 1700.0);
        assert!(range.contains(100.0));
        assert!(range.contains(1700.0));
        assert!(!range.contains(1700.5));
        assert!((range.width() - 1600.0).abs() < 1e-9);
    }
}
