use indexmap::IndexMap;
use log::debug;

use super::traits::SpectralFile;

/**
A registry of the spectral data files known to a processing run, keyed by filename
stem. The registry owns the file handles; every consumer that resolves the same stem
shares the same stateful, lazily-opened instance.

Keys are matched case-sensitively. Resolving a name with no registered stem is not an
error, it simply returns `None`.
*/
#[derive(Default)]
pub struct SpectralFileRegistry {
    files: IndexMap<String, Box<dyn SpectralFile>>,
}

impl SpectralFileRegistry {
    pub fn new() -> SpectralFileRegistry {
        SpectralFileRegistry::default()
    }

    /// Register a file under its own stem, replacing any previous entry with the
    /// same stem
    pub fn insert(&mut self, file: Box<dyn SpectralFile>) {
        let stem = file.file_stem().to_string();
        self.insert_as(stem, file);
    }

    /// Register a file under an explicit key
    pub fn insert_as(&mut self, stem: String, file: Box<dyn SpectralFile>) {
        self.files.insert(stem, file);
    }

    pub fn get_mut(&mut self, stem: &str) -> Option<&mut (dyn SpectralFile + 'static)> {
        self.files.get_mut(stem).map(|f| f.as_mut())
    }

    /// Look up the file backing `file_name` by splitting on `.` and matching the
    /// first segment against the registered stems
    pub fn resolve_mut(&mut self, file_name: &str) -> Option<&mut (dyn SpectralFile + 'static)> {
        let stem = file_name.split('.').next().unwrap_or(file_name);
        let hit = self.files.get_mut(stem).map(|f| f.as_mut());
        if hit.is_none() {
            debug!("No spectral data file registered for {file_name:?} (stem {stem:?})");
        }
        hit
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.files.contains_key(stem)
    }

    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::agilent::test_support::synthetic_directory;

    #[test]
    fn test_resolve_by_stem() {
        let mut registry = SpectralFileRegistry::new();
        registry.insert(Box::new(synthetic_directory("test/data/sample1.d")));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("sample1"));

        assert!(registry.resolve_mut("sample1.raw.mzML").is_some());
        assert!(registry.resolve_mut("sample1").is_some());
        assert!(registry.resolve_mut("unknown.mzML").is_none());
        // stems are matched case-sensitively
        assert!(registry.resolve_mut("Sample1.raw.mzML").is_none());
    }

    #[test]
    fn test_shared_handle_keeps_its_state() {
        let mut registry = SpectralFileRegistry::new();
        registry.insert(Box::new(synthetic_directory("test/data/sample1.d")));

        let file = registry.resolve_mut("sample1.raw.mzML").unwrap();
        assert!(!file.is_open());
        file.open().unwrap();

        // a later resolution sees the already-open instance
        let again = registry.resolve_mut("sample1.d").unwrap();
        assert!(again.is_open());
    }
}
