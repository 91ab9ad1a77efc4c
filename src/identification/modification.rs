use std::fmt;

/// A chemical modification of a peptide residue, with its monoisotopic and average
/// mass deltas in daltons
#[derive(Debug, Clone, PartialEq)]
pub struct Modification {
    pub name: String,
    pub monoisotopic_mass: f64,
    pub average_mass: f64,
}

impl Modification {
    pub fn new(name: impl Into<String>, monoisotopic_mass: f64, average_mass: f64) -> Modification {
        Modification {
            name: name.into(),
            monoisotopic_mass,
            average_mass,
        }
    }

    /// A modification known only by name, for result records whose modification
    /// code is absent from the loaded dictionary. Its mass deltas are zero.
    pub fn named(name: impl Into<String>) -> Modification {
        Modification::new(name, 0.0, 0.0)
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/**
A peptide-independent rule set applying a modification to every occurrence of a
residue identity. Application is idempotent: positional modifications are keyed by
position, so re-applying a rule overwrites the identical entry.
*/
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedModificationSet {
    rules: Vec<(char, Modification)>,
}

impl FixedModificationSet {
    pub fn new() -> FixedModificationSet {
        FixedModificationSet::default()
    }

    /// Add a rule applying `modification` to every `residue` in a sequence
    pub fn add(&mut self, residue: char, modification: Modification) {
        self.rules.push((residue.to_ascii_uppercase(), modification));
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = (char, &Modification)> {
        self.rules.iter().map(|(residue, m)| (*residue, m))
    }

    /// Apply every rule to `peptide`, setting the modification at each matching
    /// 1-based residue position
    pub fn apply(&self, peptide: &mut super::peptide::Peptide) {
        for (residue, modification) in self.rules.iter() {
            let positions: Vec<usize> = peptide
                .sequence()
                .chars()
                .enumerate()
                .filter(|(_, aa)| aa == residue)
                .map(|(i, _)| i + 1)
                .collect();
            for position in positions {
                peptide.set_modification(modification.clone(), position);
            }
        }
    }
}
