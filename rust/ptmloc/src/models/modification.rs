use super::Peptide;
use crate::errors::ConfigError;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutralLoss {
    pub name: String,
    pub mass: f64,
}

/// A post-translational modification definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub name: String,
    pub short_name: String,
    /// Monoisotopic mass shift in Da.
    pub mass: f64,
    /// Residues (one letter codes) that can carry the modification.
    pub targets: Vec<char>,
    /// Neutral losses that are diagnostic for the modification.
    #[serde(default)]
    pub neutral_losses: Vec<NeutralLoss>,
}

impl Modification {
    pub fn targets_residue(&self, residue: char) -> bool {
        self.targets.contains(&residue)
    }

    /// 1-based positions on the peptide that could carry this modification.
    pub fn possible_sites(&self, peptide: &Peptide) -> Vec<usize> {
        peptide
            .sequence()
            .chars()
            .enumerate()
            .filter(|(_, c)| self.targets_residue(*c))
            .map(|(i, _)| i + 1)
            .collect()
    }
}

/// Name indexed collection of the known modifications.
///
/// Passed explicitly to whatever needs to resolve a modification by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModificationCatalog {
    modifications: BTreeMap<String, Arc<Modification>>,
}

impl ModificationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the usual suspects of a phospho/oxidation search.
    pub fn common() -> Self {
        let mut catalog = Self::new();
        catalog.insert(Modification {
            name: "Phospho".into(),
            short_name: "p".into(),
            mass: 79.966331,
            targets: vec!['S', 'T', 'Y'],
            neutral_losses: vec![NeutralLoss {
                name: "H3PO4".into(),
                mass: 97.976896,
            }],
        });
        catalog.insert(Modification {
            name: "Oxidation".into(),
            short_name: "ox".into(),
            mass: 15.994915,
            targets: vec!['M'],
            neutral_losses: vec![NeutralLoss {
                name: "CH4SO".into(),
                mass: 63.998285,
            }],
        });
        catalog.insert(Modification {
            name: "Acetyl".into(),
            short_name: "ac".into(),
            mass: 42.010565,
            targets: vec!['K'],
            neutral_losses: Vec::new(),
        });
        catalog.insert(Modification {
            name: "Deamidated".into(),
            short_name: "deam".into(),
            mass: 0.984016,
            targets: vec!['N', 'Q'],
            neutral_losses: Vec::new(),
        });
        catalog.insert(Modification {
            name: "Carbamidomethyl".into(),
            short_name: "cmm".into(),
            mass: 57.021464,
            targets: vec!['C'],
            neutral_losses: Vec::new(),
        });
        catalog
    }

    pub fn insert(&mut self, modification: Modification) {
        self.modifications
            .insert(modification.name.clone(), Arc::new(modification));
    }

    /// Looks up a modification by its name or its short name.
    pub fn get(&self, name: &str) -> Option<Arc<Modification>> {
        if let Some(x) = self.modifications.get(name) {
            return Some(x.clone());
        }
        self.modifications
            .values()
            .find(|m| m.short_name == name)
            .cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<Modification>, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownModification(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.modifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }
}
