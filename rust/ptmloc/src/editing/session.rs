use super::{
    AnnotatedResidue,
    AnnotatedSequence,
    SiteSelection,
};
use crate::confidence::ConfidenceLevel;
use crate::errors::EditError;
use crate::models::{
    MatchKey,
    ModificationCatalog,
    Peptide,
    PeptideKey,
    PtmScoring,
};
use crate::store::{
    MatchLookup,
    MatchStore,
};
use serde::Serialize;
use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::sync::Arc;
use tracing::{
    debug,
    info,
};

/// What a commit changed on the persisted peptide record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    pub changed: bool,
    pub added_main: Vec<usize>,
    pub removed_main: Vec<usize>,
    pub added_secondary: Vec<usize>,
    pub removed_secondary: Vec<usize>,
}

/// Manual site assignment of one modification on one peptide match.
///
/// Opening a session copies the stored sites; toggles only touch the copy.
/// Nothing reaches the store until [`EditSession::commit`], so dropping the
/// session is how an edit gets cancelled. Only one session per peptide and
/// modification should be open at a time.
///
/// Every position holds a single [`SiteSelection`], so a site can never be
/// main and secondary at once.
#[derive(Debug, Clone)]
pub struct EditSession {
    peptide_key: PeptideKey,
    modification: String,
    peptide: Arc<Peptide>,
    // Index is position - 1.
    selection: Vec<SiteSelection>,
    // Stored sites of the other modifications, for display only.
    other_sites: BTreeMap<String, (BTreeSet<usize>, BTreeSet<usize>)>,
}

/// Stored main and secondary sites of a modification on a peptide.
///
/// Without a scoring record the peptide's own modification positions are the
/// main sites. Positions outside of the peptide are left out, a commit never
/// touches them.
fn stored_sites(
    peptide: &Peptide,
    record: Option<&PtmScoring>,
    modification: &str,
) -> (BTreeSet<usize>, BTreeSet<usize>) {
    let in_peptide = |x: &usize| *x >= 1 && *x <= peptide.len();
    match record {
        Some(x) => (
            x.main_sites().iter().copied().filter(in_peptide).collect(),
            x.secondary_sites().iter().copied().filter(in_peptide).collect(),
        ),
        None => (peptide.modification_positions(modification), BTreeSet::new()),
    }
}

impl EditSession {
    pub fn open(
        lookup: &dyn MatchLookup,
        catalog: &ModificationCatalog,
        peptide_key: &PeptideKey,
        modification: &str,
    ) -> Result<Self, EditError> {
        let modification = catalog
            .get(modification)
            .ok_or_else(|| EditError::UnknownModification(modification.to_string()))?
            .name
            .clone();
        let peptide_match = lookup
            .peptide_match(peptide_key)
            .ok_or_else(|| EditError::PeptideNotFound(peptide_key.clone()))?;
        let peptide = peptide_match.peptide.clone();

        let (main, secondary) = stored_sites(
            &peptide,
            peptide_match.ptm_scores.get(&modification),
            &modification,
        );
        let mut selection = vec![SiteSelection::Absent; peptide.len()];
        for pos in secondary {
            selection[pos - 1] = SiteSelection::Secondary;
        }
        for pos in main {
            selection[pos - 1] = SiteSelection::Main;
        }

        let mut other_names: BTreeSet<String> = peptide
            .modification_names()
            .into_iter()
            .map(|x| x.to_string())
            .collect();
        other_names.extend(peptide_match.ptm_scores.keys().cloned());
        other_names.remove(&modification);
        let other_sites = other_names
            .into_iter()
            .map(|name| {
                let sites = stored_sites(&peptide, peptide_match.ptm_scores.get(&name), &name);
                (name, sites)
            })
            .collect();

        debug!(
            "Opened edit session for {} on peptide {} ({})",
            modification, peptide_key, peptide
        );
        Ok(Self {
            peptide_key: peptide_key.clone(),
            modification,
            peptide,
            selection,
            other_sites,
        })
    }

    pub fn peptide_key(&self) -> &PeptideKey {
        &self.peptide_key
    }

    pub fn modification(&self) -> &str {
        &self.modification
    }

    pub fn peptide(&self) -> &Peptide {
        &self.peptide
    }

    fn slot(&mut self, position: usize) -> Result<&mut SiteSelection, EditError> {
        let length = self.selection.len();
        if position == 0 {
            return Err(EditError::PositionOutOfRange { position, length });
        }
        self.selection
            .get_mut(position - 1)
            .ok_or(EditError::PositionOutOfRange { position, length })
    }

    /// Flips `position` in or out of the main sites. A secondary site that
    /// becomes main stops being secondary.
    pub fn toggle_main(&mut self, position: usize) -> Result<(), EditError> {
        let slot = self.slot(position)?;
        *slot = match *slot {
            SiteSelection::Main => SiteSelection::Absent,
            SiteSelection::Absent | SiteSelection::Secondary => SiteSelection::Main,
        };
        Ok(())
    }

    /// Flips `position` in or out of the secondary sites. A main site that
    /// becomes secondary stops being main.
    pub fn toggle_secondary(&mut self, position: usize) -> Result<(), EditError> {
        let slot = self.slot(position)?;
        *slot = match *slot {
            SiteSelection::Secondary => SiteSelection::Absent,
            SiteSelection::Absent | SiteSelection::Main => SiteSelection::Secondary,
        };
        Ok(())
    }

    pub fn selection(&self, position: usize) -> Option<SiteSelection> {
        position
            .checked_sub(1)
            .and_then(|i| self.selection.get(i))
            .copied()
    }

    fn positions_with(&self, wanted: SiteSelection) -> BTreeSet<usize> {
        self.selection
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == wanted)
            .map(|(i, _)| i + 1)
            .collect()
    }

    pub fn main_selection(&self) -> BTreeSet<usize> {
        self.positions_with(SiteSelection::Main)
    }

    pub fn secondary_selection(&self) -> BTreeSet<usize> {
        self.positions_with(SiteSelection::Secondary)
    }

    /// Peptide with the stored sites of the other modifications and the
    /// in-progress selection of the edited one.
    pub fn render_annotated_sequence(&self) -> AnnotatedSequence {
        let residues = self
            .peptide
            .sequence()
            .chars()
            .enumerate()
            .map(|(i, residue)| {
                let position = i + 1;
                let mut sites = Vec::new();
                for (name, (main, secondary)) in self.other_sites.iter() {
                    if main.contains(&position) {
                        sites.push((name.clone(), SiteSelection::Main));
                    } else if secondary.contains(&position) {
                        sites.push((name.clone(), SiteSelection::Secondary));
                    }
                }
                if self.selection[i] != SiteSelection::Absent {
                    sites.push((self.modification.clone(), self.selection[i]));
                }
                AnnotatedResidue {
                    position,
                    residue,
                    sites,
                }
            })
            .collect();
        AnnotatedSequence { residues }
    }

    /// Writes the selection to the peptide match record.
    ///
    /// Only the positions that differ from the persisted record are applied.
    /// When nothing differs the store is left untouched and
    /// `changed == false`. Otherwise the peptide match is marked changed.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    pub fn commit<S: MatchStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<CommitOutcome, EditError> {
        let main = self.main_selection();
        let secondary = self.secondary_selection();
        assert!(
            main.is_disjoint(&secondary),
            "Invariant violation: sites {:?} are both main and secondary",
            main.intersection(&secondary).collect::<Vec<_>>()
        );

        let peptide_match = store
            .peptide_match_mut(&self.peptide_key)
            .ok_or_else(|| EditError::PeptideNotFound(self.peptide_key.clone()))?;
        let (persisted_main, persisted_secondary) = stored_sites(
            &self.peptide,
            peptide_match.ptm_scores.get(&self.modification),
            &self.modification,
        );

        let outcome = CommitOutcome {
            changed: false,
            added_main: main.difference(&persisted_main).copied().collect(),
            removed_main: persisted_main.difference(&main).copied().collect(),
            added_secondary: secondary.difference(&persisted_secondary).copied().collect(),
            removed_secondary: persisted_secondary.difference(&secondary).copied().collect(),
        };
        let changed = !(outcome.added_main.is_empty()
            && outcome.removed_main.is_empty()
            && outcome.added_secondary.is_empty()
            && outcome.removed_secondary.is_empty());
        if !changed {
            debug!(
                "Nothing to commit for {} on peptide {}",
                self.modification, self.peptide_key
            );
            return Ok(outcome);
        }

        let record = peptide_match
            .ptm_scores
            .entry(self.modification.clone())
            .or_insert_with(|| {
                PtmScoring::with_sites(
                    persisted_main.iter().copied(),
                    persisted_secondary.iter().copied(),
                    ConfidenceLevel::NotFound,
                )
            });
        // Removals first so that no position is ever in both sets.
        for pos in &outcome.removed_main {
            record.remove_main_site(*pos);
        }
        for pos in &outcome.removed_secondary {
            record.remove_secondary_site(*pos);
        }
        for pos in &outcome.added_main {
            record.add_main_site(*pos);
        }
        for pos in &outcome.added_secondary {
            record.add_secondary_site(*pos);
        }
        assert!(
            record.is_consistent(),
            "Invariant violation after commit on peptide {}",
            self.peptide_key
        );
        store.mark_changed(MatchKey::Peptide(self.peptide_key.clone()));

        info!(
            "Committed {} sites on peptide {}: +main {:?} -main {:?} \
             +secondary {:?} -secondary {:?}",
            self.modification,
            self.peptide_key,
            outcome.added_main,
            outcome.removed_main,
            outcome.added_secondary,
            outcome.removed_secondary
        );
        Ok(CommitOutcome {
            changed: true,
            ..outcome
        })
    }
}
