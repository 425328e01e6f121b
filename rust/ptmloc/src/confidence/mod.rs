mod classifier;
pub mod inference;
mod level;

pub use classifier::{
    ClassifierThresholds,
    ConfidenceClassifier,
};
pub use inference::{
    infer_peptide_scoring,
    score_spectrum_sites,
};
pub use level::ConfidenceLevel;
