use crate::models::{
    PeptideKey,
    ProteinKey,
    SpectrumKey,
};
use std::fmt::Display;

/// Reasons a single spectrum could not contribute to the site evidence.
///
/// These never abort an aggregation, the spectrum is skipped and reported.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceError {
    AnnotationFailed {
        spectrum: SpectrumKey,
        reason: String,
    },
    SequenceLengthMismatch {
        spectrum: SpectrumKey,
        expected: usize,
        found: usize,
    },
    NonFiniteIntensity {
        spectrum: SpectrumKey,
        ion: String,
    },
}

impl Display for EvidenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvidenceError::AnnotationFailed { spectrum, reason } => {
                write!(f, "Unable to annotate spectrum {}: {}", spectrum, reason)
            }
            EvidenceError::SequenceLengthMismatch {
                spectrum,
                expected,
                found,
            } => write!(
                f,
                "Spectrum {} assumes a peptide of length {}, expected {}",
                spectrum, found, expected
            ),
            EvidenceError::NonFiniteIntensity { spectrum, ion } => {
                write!(f, "Non-finite intensity for {} in spectrum {}", ion, spectrum)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    PeptideNotFound(PeptideKey),
    PositionOutOfRange { position: usize, length: usize },
    UnknownModification(String),
}

impl Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::PeptideNotFound(key) => write!(f, "Peptide match {} not found", key),
            EditError::PositionOutOfRange { position, length } => write!(
                f,
                "Position {} is outside of the peptide (1..={})",
                position, length
            ),
            EditError::UnknownModification(name) => {
                write!(f, "Modification {} is not in the catalog", name)
            }
        }
    }
}

/// Failure to recompute the PTM scores of one protein match.
#[derive(Debug, Clone, PartialEq)]
pub enum RescoreError {
    PeptideNotFound(PeptideKey),
    ProteinNotFound(ProteinKey),
    SequenceUnavailable { accession: String },
    ScorerFailed { protein: ProteinKey, reason: String },
}

impl Display for RescoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RescoreError::PeptideNotFound(key) => write!(f, "Peptide match {} not found", key),
            RescoreError::ProteinNotFound(key) => write!(f, "Protein match {} not found", key),
            RescoreError::SequenceUnavailable { accession } => {
                write!(f, "No sequence available for protein {}", accession)
            }
            RescoreError::ScorerFailed { protein, reason } => {
                write!(f, "Scoring of protein match {} failed: {}", protein, reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidThresholds {
        doubtful: f64,
        confident: f64,
        very_confident: f64,
    },
    InvalidQuantile(f64),
    UnknownModification(String),
    InvalidModificationCount {
        n_ptm: usize,
        sequence_length: usize,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidThresholds {
                doubtful,
                confident,
                very_confident,
            } => write!(
                f,
                "Thresholds must be finite and increasing, \
                 got doubtful={} confident={} very_confident={}",
                doubtful, confident, very_confident
            ),
            ConfigError::InvalidQuantile(q) => write!(f, "Quantile {} is not within [0, 1]", q),
            ConfigError::UnknownModification(name) => {
                write!(f, "Modification {} is not in the catalog", name)
            }
            ConfigError::InvalidModificationCount {
                n_ptm,
                sequence_length,
            } => write!(
                f,
                "Cannot place {} modifications on a peptide of {} residues",
                n_ptm, sequence_length
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeptideParsingError {
    EmptySequence,
    UnclosedBracket { position: usize },
    UnexpectedCharacter { character: char, position: usize },
    ModificationWithoutResidue { name: String },
}

impl Display for PeptideParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug)]
pub enum PtmLocError {
    Evidence(EvidenceError),
    Edit(EditError),
    Rescore(RescoreError),
    Config(ConfigError),
    PeptideParsing(PeptideParsingError),
}

impl Display for PtmLocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PtmLocError::Evidence(e) => write!(f, "{}", e),
            PtmLocError::Edit(e) => write!(f, "{}", e),
            PtmLocError::Rescore(e) => write!(f, "{}", e),
            PtmLocError::Config(e) => write!(f, "{}", e),
            PtmLocError::PeptideParsing(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EvidenceError {}
impl std::error::Error for EditError {}
impl std::error::Error for RescoreError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for PeptideParsingError {}
impl std::error::Error for PtmLocError {}

pub type Result<T> = std::result::Result<T, PtmLocError>;

impl From<EvidenceError> for PtmLocError {
    fn from(x: EvidenceError) -> Self {
        Self::Evidence(x)
    }
}

impl From<EditError> for PtmLocError {
    fn from(x: EditError) -> Self {
        Self::Edit(x)
    }
}

impl From<RescoreError> for PtmLocError {
    fn from(x: RescoreError) -> Self {
        Self::Rescore(x)
    }
}

impl From<ConfigError> for PtmLocError {
    fn from(x: ConfigError) -> Self {
        Self::Config(x)
    }
}

impl From<PeptideParsingError> for PtmLocError {
    fn from(x: PeptideParsingError) -> Self {
        Self::PeptideParsing(x)
    }
}
