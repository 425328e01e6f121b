//! Propagation of peptide level site changes to the protein matches.

mod propagation;
mod scorer;

pub use propagation::{
    CandidateOutcome,
    HierarchicalRescorer,
    RescoreReport,
    RescoringConfig,
};
pub use scorer::{
    ProteinPtmScorer,
    ProteinSiteScorer,
};
