use super::IonType;
use crate::errors::EvidenceError;
use crate::models::{
    AnnotationParameters,
    Modification,
    Peptide,
    SpectrumKey,
    SpectrumMatch,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// Observed intensity of one theoretical fragment ion.
///
/// `modification_count` is the number of copies of the modification the
/// fragment carries under the hypothesis that matched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IonMatch {
    pub ion: IonType,
    pub ordinal: usize,
    #[serde(default)]
    pub modification_count: usize,
    pub intensity: f64,
}

/// Matches fragment ions of a peptide against a spectrum.
///
/// Fragment mass matching lives outside of this crate, implementations only
/// need to report what they matched. Unmatched ions can be omitted, they count
/// as zero intensity.
pub trait SpectrumAnnotator: Send + Sync {
    fn annotate(
        &self,
        spectrum: &SpectrumMatch,
        peptide: &Peptide,
        modification: &Modification,
        n_ptm: usize,
        parameters: &AnnotationParameters,
    ) -> Result<Vec<IonMatch>, EvidenceError>;
}

/// Annotator serving ion matches computed ahead of time, keyed by spectrum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrecomputedAnnotator {
    annotations: BTreeMap<SpectrumKey, Vec<IonMatch>>,
}

impl PrecomputedAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spectrum: SpectrumKey, matches: Vec<IonMatch>) {
        self.annotations.insert(spectrum, matches);
    }
}

impl SpectrumAnnotator for PrecomputedAnnotator {
    fn annotate(
        &self,
        spectrum: &SpectrumMatch,
        _peptide: &Peptide,
        _modification: &Modification,
        n_ptm: usize,
        parameters: &AnnotationParameters,
    ) -> Result<Vec<IonMatch>, EvidenceError> {
        let matches = self.annotations.get(&spectrum.key).ok_or_else(|| {
            EvidenceError::AnnotationFailed {
                spectrum: spectrum.key.clone(),
                reason: "no annotation available".to_string(),
            }
        })?;
        Ok(matches
            .iter()
            .filter(|m| m.modification_count <= n_ptm && parameters.ion_types.contains(&m.ion))
            .copied()
            .collect())
    }
}
