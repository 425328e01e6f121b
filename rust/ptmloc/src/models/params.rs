use crate::evidence::IonType;
use serde::{
    Deserialize,
    Serialize,
};

/// Settings handed to the spectrum annotator and the protein scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationParameters {
    pub ion_types: Vec<IonType>,
    pub fragment_tolerance_da: f64,
    pub include_neutral_losses: bool,
}

impl Default for AnnotationParameters {
    fn default() -> Self {
        Self {
            ion_types: vec![IonType::B, IonType::Y],
            fragment_tolerance_da: 0.02,
            include_neutral_losses: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParameters {
    pub fixed_modifications: Vec<String>,
    pub variable_modifications: Vec<String>,
}

impl SearchParameters {
    pub fn is_variable(&self, modification: &str) -> bool {
        self.variable_modifications.iter().any(|x| x == modification)
    }
}
