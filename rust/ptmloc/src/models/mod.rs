mod matches;
mod modification;
mod params;
mod peptide;
mod ptm_scoring;

pub use matches::{
    MatchKey,
    PeptideKey,
    PeptideMatch,
    ProteinKey,
    ProteinMatch,
    ProteinPtmScores,
    ProteinSiteSummary,
    SpectrumKey,
    SpectrumMatch,
};
pub use modification::{
    Modification,
    ModificationCatalog,
    NeutralLoss,
};
pub use params::{
    AnnotationParameters,
    SearchParameters,
};
pub use peptide::{
    ModificationSite,
    Peptide,
};
pub use ptm_scoring::PtmScoring;
