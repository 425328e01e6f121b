use crate::errors::PeptideParsingError;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

/// One occurrence of a modification on a peptide.
///
/// Positions are 1-based, `1` being the first residue.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModificationSite {
    pub name: String,
    pub position: usize,
}

/// An amino acid sequence with its modification occurrences.
///
/// Peptides are immutable once built and are shared between all the peptide
/// and spectrum matches that reference them. They serialize in their text
/// form, `ACDES[Phospho]TVK`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Peptide {
    sequence: String,
    modifications: Vec<ModificationSite>,
}

impl Peptide {
    /// Builds a peptide, sorting the modifications by position.
    ///
    /// Modifications pointing outside of the sequence are dropped.
    pub fn new(sequence: impl Into<String>, mut modifications: Vec<ModificationSite>) -> Self {
        let sequence: String = sequence.into();
        let len = sequence.len();
        modifications.retain(|m| m.position >= 1 && m.position <= len);
        modifications.sort();
        Self {
            sequence,
            modifications,
        }
    }

    pub fn unmodified(sequence: impl Into<String>) -> Self {
        Self::new(sequence, Vec::new())
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Residue at a 1-based position.
    pub fn residue(&self, position: usize) -> Option<char> {
        if position == 0 {
            return None;
        }
        self.sequence.as_bytes().get(position - 1).map(|&b| b as char)
    }

    pub fn modifications(&self) -> &[ModificationSite] {
        &self.modifications
    }

    pub fn modification_count(&self, name: &str) -> usize {
        self.modifications.iter().filter(|m| m.name == name).count()
    }

    pub fn modification_positions(&self, name: &str) -> BTreeSet<usize> {
        self.modifications
            .iter()
            .filter(|m| m.name == name)
            .map(|m| m.position)
            .collect()
    }

    pub fn modification_names(&self) -> BTreeSet<&str> {
        self.modifications.iter().map(|m| m.name.as_str()).collect()
    }
}

impl FromStr for Peptide {
    type Err = PeptideParsingError;

    /// Parses the bracket notation, e.g. `ACDES[Phospho]TVK`.
    ///
    /// A bracketed name modifies the residue right before it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut sequence = String::with_capacity(s.len());
        let mut modifications = Vec::new();
        let mut chars = s.char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '[' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == ']' {
                            closed = true;
                            break;
                        }
                        name.push(inner);
                    }
                    if !closed {
                        return Err(PeptideParsingError::UnclosedBracket { position: i });
                    }
                    if sequence.is_empty() {
                        return Err(PeptideParsingError::ModificationWithoutResidue { name });
                    }
                    modifications.push(ModificationSite {
                        name,
                        position: sequence.len(),
                    });
                }
                c if c.is_ascii_uppercase() => sequence.push(c),
                other => {
                    return Err(PeptideParsingError::UnexpectedCharacter {
                        character: other,
                        position: i,
                    });
                }
            }
        }

        if sequence.is_empty() {
            return Err(PeptideParsingError::EmptySequence);
        }
        Ok(Peptide::new(sequence, modifications))
    }
}

impl Display for Peptide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut mods = self.modifications.iter().peekable();
        for (i, residue) in self.sequence.chars().enumerate() {
            write!(f, "{}", residue)?;
            while let Some(m) = mods.next_if(|m| m.position == i + 1) {
                write!(f, "[{}]", m.name)?;
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for Peptide {
    type Error = PeptideParsingError;

    fn try_from(x: String) -> Result<Self, Self::Error> {
        x.parse()
    }
}

impl From<Peptide> for String {
    fn from(x: Peptide) -> Self {
        x.to_string()
    }
}
