//! Access to the identification results the engine reads and mutates.
//!
//! The engine never creates or destroys matches. It borrows them from a
//! [`MatchStore`], mutates them in place and then flags what it touched with
//! [`MatchStore::mark_changed`].

mod in_memory;
mod sequences;

pub use in_memory::InMemoryMatchStore;
pub use sequences::{
    InMemorySequences,
    SequenceProvider,
};

use crate::models::{
    MatchKey,
    PeptideKey,
    PeptideMatch,
    ProteinKey,
    ProteinMatch,
    SpectrumKey,
    SpectrumMatch,
};

/// Read only view over the matches.
///
/// This is what collaborators that run concurrently (protein scorers) get to
/// see, so implementations must be shareable across threads.
pub trait MatchLookup: Send + Sync {
    fn peptide_match(&self, key: &PeptideKey) -> Option<&PeptideMatch>;
    fn protein_match(&self, key: &ProteinKey) -> Option<&ProteinMatch>;
    fn spectrum_match(&self, key: &SpectrumKey) -> Option<&SpectrumMatch>;

    /// Every protein match key in the store.
    fn protein_match_keys(&self) -> Box<dyn Iterator<Item = ProteinKey> + '_>;

    /// Spectrum matches of a peptide match, silently skipping dangling keys.
    fn spectrum_matches_of<'a>(&'a self, peptide: &'a PeptideMatch) -> Vec<&'a SpectrumMatch> {
        peptide
            .spectrum_keys
            .iter()
            .filter_map(|k| self.spectrum_match(k))
            .collect()
    }
}

/// Mutable access to the matches.
///
/// Mutations go through an explicit "borrow mutably, then mark changed" pair
/// of calls so that callers can tell exactly what a command touched.
pub trait MatchStore: MatchLookup {
    fn peptide_match_mut(&mut self, key: &PeptideKey) -> Option<&mut PeptideMatch>;
    fn protein_match_mut(&mut self, key: &ProteinKey) -> Option<&mut ProteinMatch>;
    fn spectrum_match_mut(&mut self, key: &SpectrumKey) -> Option<&mut SpectrumMatch>;
    fn mark_changed(&mut self, key: MatchKey);
}
