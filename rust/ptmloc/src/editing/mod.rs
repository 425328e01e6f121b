mod annotated;
mod command;
mod session;

pub use annotated::{
    AnnotatedResidue,
    AnnotatedSequence,
    SiteSelection,
};
pub use command::{
    CommitEditCommand,
    CommitReport,
};
pub use session::{
    CommitOutcome,
    EditSession,
};
