use super::{
    Peptide,
    PtmScoring,
};
use crate::confidence::ConfidenceLevel;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::fmt::Display;
use std::sync::Arc;

macro_rules! match_key {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(x: &str) -> Self {
                Self(x.to_string())
            }
        }

        impl From<String> for $name {
            fn from(x: String) -> Self {
                Self(x)
            }
        }
    };
}

match_key!(PeptideKey);
match_key!(ProteinKey);
match_key!(SpectrumKey);

/// Key of any match kind, used to flag what a mutation touched.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchKey {
    Peptide(PeptideKey),
    Protein(ProteinKey),
    Spectrum(SpectrumKey),
}

/// Best peptide assumption of one spectrum (PSM).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumMatch {
    pub key: SpectrumKey,
    pub best_assumption: Arc<Peptide>,
    /// Localization score of the modification engine, per modification name
    /// and per 1-based site.
    #[serde(default)]
    pub localization_scores: BTreeMap<String, BTreeMap<usize, f64>>,
    #[serde(default)]
    pub ptm_scores: BTreeMap<String, PtmScoring>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeptideMatch {
    pub key: PeptideKey,
    pub peptide: Arc<Peptide>,
    #[serde(default)]
    pub spectrum_keys: Vec<SpectrumKey>,
    #[serde(default)]
    pub ptm_scores: BTreeMap<String, PtmScoring>,
}

/// Sites of one modification projected on the sequence of a protein.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinSiteSummary {
    /// 1-based protein position to the best confidence reported for it.
    pub main_sites: BTreeMap<usize, ConfidenceLevel>,
    pub secondary_sites: BTreeSet<usize>,
}

/// Protein level PTM score aggregate, keyed by modification name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinPtmScores {
    pub modifications: BTreeMap<String, ProteinSiteSummary>,
}

impl ProteinPtmScores {
    pub fn get(&self, modification: &str) -> Option<&ProteinSiteSummary> {
        self.modifications.get(modification)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProteinMatch {
    pub key: ProteinKey,
    pub accessions: BTreeSet<String>,
    /// Accession chosen as the representative identity of the group.
    pub main_match: String,
    #[serde(default)]
    pub peptide_keys: Vec<PeptideKey>,
    #[serde(default)]
    pub ptm_scores: ProteinPtmScores,
}

impl ProteinMatch {
    pub fn shares_accession(&self, accessions: &BTreeSet<String>) -> bool {
        !self.accessions.is_disjoint(accessions)
    }
}
