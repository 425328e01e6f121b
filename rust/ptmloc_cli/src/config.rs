use ptmloc::confidence::ClassifierThresholds;
use ptmloc::evidence::EvidenceConfig;
use ptmloc::models::{
    AnnotationParameters,
    SearchParameters,
};
use ptmloc::rescoring::RescoringConfig;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::Path;
use tracing::info;

use crate::errors::CliError;

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub classifier: ClassifierThresholds,
    pub annotation: AnnotationParameters,
    pub search: SearchParameters,
    pub evidence: EvidenceConfig,
    pub rescoring: RescoringConfig,
    pub edit: Option<EditConfig>,
}

/// Manual site changes applied by the `commit` subcommand, in order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditConfig {
    pub peptide_key: String,
    pub modification: String,
    #[serde(default)]
    pub toggle_main: Vec<usize>,
    #[serde(default)]
    pub toggle_secondary: Vec<usize>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let config: Config = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reads the configuration at `path`, or the defaults without one.
    pub fn from_optional_file(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                info!("No configuration given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), CliError> {
        self.classifier.validate()?;
        self.evidence.validate()?;
        Ok(())
    }

    pub fn template() -> Self {
        Self {
            search: SearchParameters {
                fixed_modifications: vec!["Carbamidomethyl".into()],
                variable_modifications: vec!["Phospho".into(), "Oxidation".into()],
            },
            edit: Some(EditConfig {
                peptide_key: "PEPTIDE_KEY".into(),
                modification: "Phospho".into(),
                toggle_main: vec![5],
                toggle_secondary: vec![6],
            }),
            ..Default::default()
        }
    }
}
