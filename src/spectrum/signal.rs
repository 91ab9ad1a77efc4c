/**
The recorded signal of a single scan, as parallel m/z (f64) and intensity (f32)
arrays in ascending m/z order.
*/
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MassSpectrum {
    mz_array: Vec<f64>,
    intensity_array: Vec<f32>,
}

impl MassSpectrum {
    /// Wrap a pair of parallel arrays. The arrays are truncated to the shorter
    /// of the two lengths if they disagree.
    pub fn new(mut mz_array: Vec<f64>, mut intensity_array: Vec<f32>) -> MassSpectrum {
        let n = mz_array.len().min(intensity_array.len());
        mz_array.truncate(n);
        intensity_array.truncate(n);
        MassSpectrum {
            mz_array,
            intensity_array,
        }
    }

    pub fn mzs(&self) -> &[f64] {
        &self.mz_array
    }

    pub fn intensities(&self) -> &[f32] {
        &self.intensity_array
    }

    pub fn len(&self) -> usize {
        self.mz_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz_array.is_empty()
    }

    /// The total ion current, the sum of all intensities
    pub fn tic(&self) -> f64 {
        self.intensity_array.iter().map(|i| *i as f64).sum()
    }

    /// The (m/z, intensity) pair of the most intense data point, if any
    pub fn base_peak(&self) -> Option<(f64, f32)> {
        let mut best: Option<usize> = None;
        for (i, intensity) in self.intensity_array.iter().enumerate() {
            match best {
                Some(j) if *intensity <= self.intensity_array[j] => {}
                _ => best = Some(i),
            }
        }
        best.map(|i| (self.mz_array[i], self.intensity_array[i]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.mz_array
            .iter()
            .copied()
            .zip(self.intensity_array.iter().copied())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_summaries() {
        let spectrum = MassSpectrum::new(
            vec![244.08, 522.29, 810.41],
            vec![320.0, 1250.5, 870.2],
        );
        assert_eq!(spectrum.len(), 3);
        assert!((spectrum.tic() - 2440.7).abs() < 1e-3);
        let (mz, intensity) = spectrum.base_peak().unwrap();
        assert!((mz - 522.29).abs() < 1e-6);
        assert!((intensity - 1250.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty() {
        let spectrum = MassSpectrum::default();
        assert!(spectrum.is_empty());
        assert_eq!(spectrum.base_peak(), None);
        assert_eq!(spectrum.tic(), 0.0);
    }

    #[test]
    fn test_mismatched_lengths_truncate() {
        let spectrum = MassSpectrum::new(vec![100.0, 200.0, 300.0], vec![1.0, 2.0]);
        assert_eq!(spectrum.len(), 2);
    }
}
