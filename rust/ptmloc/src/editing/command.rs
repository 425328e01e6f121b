use super::{
    CommitOutcome,
    EditSession,
};
use crate::errors::Result;
use crate::rescoring::{
    HierarchicalRescorer,
    RescoreReport,
};
use crate::store::MatchStore;

#[derive(Debug, Clone, PartialEq)]
pub struct CommitReport {
    pub outcome: CommitOutcome,
    /// `None` when the commit changed nothing and no protein was rescored.
    pub rescore: Option<RescoreReport>,
}

/// Commits an edit session and propagates the change to the proteins.
///
/// The selection is persisted before any rescoring happens, so rescoring
/// failures show up in the report but never undo the commit.
pub struct CommitEditCommand<'s, 'r> {
    session: &'s mut EditSession,
    rescorer: &'s HierarchicalRescorer<'r>,
}

impl<'s, 'r> CommitEditCommand<'s, 'r> {
    pub fn new(session: &'s mut EditSession, rescorer: &'s HierarchicalRescorer<'r>) -> Self {
        Self { session, rescorer }
    }

    pub fn execute<S: MatchStore>(self, store: &mut S) -> Result<CommitReport> {
        let outcome = self.session.commit(store)?;
        if !outcome.changed {
            return Ok(CommitReport {
                outcome,
                rescore: None,
            });
        }
        let rescore = self.rescorer.propagate(self.session.peptide_key(), store)?;
        Ok(CommitReport {
            outcome,
            rescore: Some(rescore),
        })
    }
}
