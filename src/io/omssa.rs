/*!
Reader for OMSSA CSV search results.

[`OmssaCsvPsmReader`] streams peptide-spectrum matches out of an OMSSA result file,
resolving each record's modification codes against a [`ModificationDictionary`],
its protein defline against the caller's known proteins, and its source file name
against a [`SpectralFileRegistry`] so the originating scan can be attached.
*/
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use csv::StringRecord;
use indexmap::IndexMap;
use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use thiserror::Error;

use crate::identification::{
    FixedModificationSet, Modification, Peptide, PeptideSpectralMatch, Protein, ScoreType,
    DECOY_PREFIX,
};
use crate::io::registry::SpectralFileRegistry;
use crate::io::traits::SpectralFile;

/// The column names an OMSSA CSV result file binds by
pub mod columns {
    pub const SPECTRUM_NUMBER: &str = "Spectrum number";
    pub const E_VALUE: &str = "E-value";
    pub const MASS: &str = "Mass";
    pub const THEO_MASS: &str = "Theo Mass";
    pub const PEPTIDE: &str = "Peptide";
    pub const DEFLINE: &str = "Defline";
    pub const FILENAME: &str = "Filename/id";
    pub const ACCESSION: &str = "Accession";
    pub const P_VALUE: &str = "P-value";
    pub const MODS: &str = "Mods";
    pub const CHARGE: &str = "Charge";
    pub const START: &str = "Start";
    pub const STOP: &str = "Stop";
    pub const GI: &str = "gi";
    pub const NIST_SCORE: &str = "NIST score";
}

/// Errors that abort reading a result stream. Every variant is terminal: once a
/// record is malformed the whole file is considered untrustworthy.
#[derive(Debug, Error)]
pub enum PsmReaderError {
    #[error("Encountered an IO error: {0}")]
    IOError(
        #[from]
        #[source]
        io::Error,
    ),
    #[error("Failed to read a result record: {0}")]
    CsvError(
        #[from]
        #[source]
        csv::Error,
    ),
    #[error("Failed to parse an XML document: {0}")]
    XmlError(
        #[from]
        #[source]
        quick_xml::Error,
    ),
    #[error("The result file has no column named {0:?}")]
    MissingColumn(String),
    #[error("Could not parse the {column:?} value {value:?}")]
    MalformedField { column: String, value: String },
    #[error("Could not parse the residue position for the modification {0:?}")]
    ModificationParse(String),
    #[error("The modification dictionary is malformed: {0}")]
    ModificationDictionary(String),
}

/**
An immutable mapping from a modification name to its mass deltas, loaded once from
an OMSSA `mods.xml` (or `usermods.xml`) document and shared by reference among every
reader that needs it.
*/
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModificationDictionary {
    modifications: IndexMap<String, Modification>,
}

impl ModificationDictionary {
    pub fn from_xml_path(path: impl AsRef<Path>) -> Result<ModificationDictionary, PsmReaderError> {
        let document = fs::read_to_string(path)?;
        Self::from_xml(&document)
    }

    /// Parse an `MSModSpecSet` document. Each `MSModSpec` entry must carry a name,
    /// a monoisotopic mass, and an average mass.
    pub fn from_xml(document: &str) -> Result<ModificationDictionary, PsmReaderError> {
        let mut reader = XmlReader::from_str(document);
        reader.trim_text(true);
        let mut modifications = IndexMap::new();
        let mut current: Option<Vec<u8>> = None;
        let mut name: Option<String> = None;
        let mut monoisotopic: Option<f64> = None;
        let mut average: Option<f64> = None;
        loop {
            match reader.read_event()? {
                Event::Start(e) => current = Some(e.local_name().as_ref().to_vec()),
                Event::Text(t) => {
                    let text = t.unescape()?.into_owned();
                    match current.as_deref() {
                        Some(b"MSModSpec_name") => name = Some(text),
                        Some(b"MSModSpec_monomass") => monoisotopic = Some(parse_mass(&text)?),
                        Some(b"MSModSpec_averagemass") => average = Some(parse_mass(&text)?),
                        _ => {}
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"MSModSpec" => {
                    current = None;
                    match (name.take(), monoisotopic.take(), average.take()) {
                        (Some(name), Some(monoisotopic), Some(average)) => {
                            modifications.insert(
                                name.clone(),
                                Modification::new(name, monoisotopic, average),
                            );
                        }
                        (Some(name), _, _) => {
                            return Err(PsmReaderError::ModificationDictionary(format!(
                                "the modification {name:?} is missing a mass value"
                            )))
                        }
                        _ => {
                            return Err(PsmReaderError::ModificationDictionary(
                                "encountered a modification entry with no name".to_string(),
                            ))
                        }
                    }
                }
                Event::End(_) => current = None,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(ModificationDictionary { modifications })
    }

    pub fn get(&self, name: &str) -> Option<&Modification> {
        self.modifications.get(name)
    }

    pub fn len(&self) -> usize {
        self.modifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modification> {
        self.modifications.values()
    }
}

fn parse_mass(text: &str) -> Result<f64, PsmReaderError> {
    text.trim().parse().map_err(|_| {
        PsmReaderError::ModificationDictionary(format!("could not parse the mass value {text:?}"))
    })
}

/// Where the reader is in its record stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsmReaderState {
    Reading,
    Exhausted,
    Faulted,
}

/**
A lazy, pull-based reader over an OMSSA CSV result file, yielding one
[`PeptideSpectralMatch`] per record.

Binding is header-driven, so the column order in the file does not matter. The
caller configures known proteins, fixed-modification rules, extra columns to copy
verbatim, and the spectral data files to resolve against before iterating.

A malformed record faults the reader: the error is yielded once and the stream then
stays terminal. Registry misses and per-file open failures are not errors; the PSM
is emitted without a spectrum.
*/
pub struct OmssaCsvPsmReader<R: io::Read> {
    reader: csv::Reader<R>,
    columns: HashMap<String, usize>,
    record: StringRecord,
    state: PsmReaderState,
    modifications: Arc<ModificationDictionary>,
    user_modifications: Option<Arc<ModificationDictionary>>,
    fixed_modifications: FixedModificationSet,
    proteins: HashMap<String, Arc<Protein>>,
    files: SpectralFileRegistry,
    extra_columns: Vec<String>,
}

impl OmssaCsvPsmReader<fs::File> {
    pub fn from_path(
        path: impl AsRef<Path>,
        modifications: Arc<ModificationDictionary>,
    ) -> Result<Self, PsmReaderError> {
        let handle = fs::File::open(path)?;
        Self::new(handle, modifications)
    }
}

impl<R: io::Read> OmssaCsvPsmReader<R> {
    pub fn new(
        source: R,
        modifications: Arc<ModificationDictionary>,
    ) -> Result<Self, PsmReaderError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(source);
        let columns = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, header)| (header.to_string(), i))
            .collect();
        Ok(OmssaCsvPsmReader {
            reader,
            columns,
            record: StringRecord::new(),
            state: PsmReaderState::Reading,
            modifications,
            user_modifications: None,
            fixed_modifications: FixedModificationSet::new(),
            proteins: HashMap::new(),
            files: SpectralFileRegistry::new(),
            extra_columns: Vec::new(),
        })
    }

    pub fn state(&self) -> PsmReaderState {
        self.state
    }

    /// A second dictionary for user-defined modification codes, consulted before
    /// the built-in one
    pub fn set_user_modifications(&mut self, modifications: Arc<ModificationDictionary>) {
        self.user_modifications = Some(modifications);
    }

    pub fn set_fixed_modifications(&mut self, rules: FixedModificationSet) {
        self.fixed_modifications = rules;
    }

    /// Make a protein available for defline resolution
    pub fn add_protein(&mut self, protein: Arc<Protein>) {
        self.proteins.insert(protein.defline.clone(), protein);
    }

    /// Register a spectral data file to resolve PSMs against, keyed by its stem
    pub fn register_file(&mut self, file: Box<dyn SpectralFile>) {
        self.files.insert(file);
    }

    pub fn files_mut(&mut self) -> &mut SpectralFileRegistry {
        &mut self.files
    }

    /// Declare a column whose value should be copied verbatim onto each PSM
    pub fn add_extra_column(&mut self, name: impl Into<String>) {
        self.extra_columns.push(name.into());
    }

    fn field(&self, name: &str) -> Result<&str, PsmReaderError> {
        let index = *self
            .columns
            .get(name)
            .ok_or_else(|| PsmReaderError::MissingColumn(name.to_string()))?;
        Ok(self.record.get(index).unwrap_or(""))
    }

    fn parse_field<T: FromStr>(&self, name: &str) -> Result<T, PsmReaderError> {
        let value = self.field(name)?;
        value.trim().parse().map_err(|_| PsmReaderError::MalformedField {
            column: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Apply the record's `name:position` modification tokens to `peptide`. The
    /// outer delimiter may be `,` or `;`. A token whose position does not parse as
    /// an integer poisons the record: a silently mis-placed modification would
    /// change the PSM's identity.
    fn set_dynamic_modifications(
        &self,
        peptide: &mut Peptide,
        modifications: &str,
    ) -> Result<(), PsmReaderError> {
        for token in modifications.split(|c| c == ',' || c == ';') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let (name, position) = token
                .split_once(':')
                .ok_or_else(|| PsmReaderError::ModificationParse(token.to_string()))?;
            let name = name.trim();
            let position: usize = position
                .trim()
                .parse()
                .map_err(|_| PsmReaderError::ModificationParse(token.to_string()))?;
            let modification = self
                .user_modifications
                .as_ref()
                .and_then(|dictionary| dictionary.get(name))
                .or_else(|| self.modifications.get(name))
                .cloned()
                .unwrap_or_else(|| {
                    debug!("No dictionary entry for the modification {name:?}");
                    Modification::named(name)
                });
            peptide.set_modification(modification, position);
        }
        Ok(())
    }

    fn attach_spectrum(&mut self, psm: &mut PeptideSpectralMatch) {
        let spectrum_number = psm.spectrum_number;
        let Some(file) = self.files.resolve_mut(&psm.file_name) else {
            return;
        };
        if !file.is_open() {
            if let Err(e) = file.open() {
                warn!(
                    "Could not open the spectral data file backing {:?}: {e}",
                    psm.file_name
                );
                return;
            }
        }
        match file.spectrum(spectrum_number) {
            Ok(scan) => psm.spectrum = Some(scan),
            Err(e) => warn!(
                "Could not read spectrum {spectrum_number} out of {:?}: {e}",
                psm.file_name
            ),
        }
    }

    fn read_next_psm(&mut self) -> Result<Option<PeptideSpectralMatch>, PsmReaderError> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }

        let sequence = self.field(columns::PEPTIDE)?.to_string();
        let modifications = self.field(columns::MODS)?.to_string();
        let defline = self.field(columns::DEFLINE)?.to_string();
        let file_name = self.field(columns::FILENAME)?.to_string();
        let spectrum_number: usize = self.parse_field(columns::SPECTRUM_NUMBER)?;
        let score: f64 = self.parse_field(columns::E_VALUE)?;
        let charge: i32 = self.parse_field(columns::CHARGE)?;
        let start_residue: usize = self.parse_field(columns::START)?;
        let end_residue: usize = self.parse_field(columns::STOP)?;

        let mut peptide = Peptide::new(&sequence);
        self.fixed_modifications.apply(&mut peptide);
        self.set_dynamic_modifications(&mut peptide, &modifications)?;
        peptide.start_residue = start_residue;
        peptide.end_residue = end_residue;
        if let Some(protein) = self.proteins.get(&defline) {
            peptide.parent = Some(protein.clone());
        }

        let mut psm = PeptideSpectralMatch::new(peptide, score, charge);
        psm.score_type = ScoreType::EValue;
        psm.is_decoy = defline.starts_with(DECOY_PREFIX);
        psm.spectrum_number = spectrum_number;
        psm.file_name = file_name;
        for name in self.extra_columns.clone() {
            let value = self.field(&name)?.to_string();
            psm.add_extra_data(name, value);
        }

        self.attach_spectrum(&mut psm);
        Ok(Some(psm))
    }
}

impl<R: io::Read> Iterator for OmssaCsvPsmReader<R> {
    type Item = Result<PeptideSpectralMatch, PsmReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != PsmReaderState::Reading {
            return None;
        }
        match self.read_next_psm() {
            Ok(Some(psm)) => Some(Ok(psm)),
            Ok(None) => {
                self.state = PsmReaderState::Exhausted;
                None
            }
            Err(e) => {
                self.state = PsmReaderState::Faulted;
                Some(Err(e))
            }
        }
    }
}
