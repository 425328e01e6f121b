pub mod confidence;
pub mod editing;
pub mod errors;
pub mod evidence;
pub mod models;
pub mod rescoring;
pub mod store;

pub use confidence::{
    ConfidenceClassifier,
    ConfidenceLevel,
};
pub use editing::{
    CommitEditCommand,
    EditSession,
};
pub use errors::PtmLocError;
pub use evidence::{
    EvidenceAggregator,
    IonType,
    SiteEvidence,
};
pub use models::{
    ModificationCatalog,
    Peptide,
    PtmScoring,
};
pub use rescoring::HierarchicalRescorer;
pub use store::{
    MatchLookup,
    MatchStore,
};
