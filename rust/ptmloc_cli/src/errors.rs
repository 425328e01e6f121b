use ptmloc::errors::{
    ConfigError,
    EditError,
    PtmLocError,
    RescoreError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    #[error("Rescoring error: {0}")]
    Rescore(#[from] RescoreError),

    #[error(transparent)]
    PtmLoc(#[from] PtmLocError),

    #[error("Data reading error: {0}")]
    DataReading(String),
}
