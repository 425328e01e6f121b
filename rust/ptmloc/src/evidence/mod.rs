mod aggregator;
mod annotator;
mod ions;
mod site_evidence;

pub use aggregator::{
    EvidenceAggregator,
    EvidenceConfig,
};
pub use annotator::{
    IonMatch,
    PrecomputedAnnotator,
    SpectrumAnnotator,
};
pub use ions::{
    IonSeriesTerminality,
    IonType,
    NUM_ION_TYPES,
};
pub use site_evidence::SiteEvidence;
