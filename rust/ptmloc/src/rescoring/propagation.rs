use super::ProteinPtmScorer;
use crate::errors::RescoreError;
use crate::models::{
    AnnotationParameters,
    MatchKey,
    PeptideKey,
    ProteinKey,
    ProteinPtmScores,
    SearchParameters,
};
use crate::store::{
    MatchLookup,
    MatchStore,
    SequenceProvider,
};
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{
    debug,
    info,
    warn,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RescoringConfig {
    /// Rescore the candidate proteins on the rayon pool.
    pub parallel: bool,
}

impl Default for RescoringConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// What happened to one candidate protein match during a propagation.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    /// Rescored, `changed` tells whether the stored scores differ now.
    Rescored { changed: bool },
    /// Shares an accession with the peptide but its main match is not one of
    /// the peptide's parent proteins.
    NotMainMatch,
    Failed(RescoreError),
}

/// Outcome of every candidate protein of one propagation, in scan order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RescoreReport {
    pub parent_proteins: BTreeSet<String>,
    pub outcomes: Vec<(ProteinKey, CandidateOutcome)>,
}

impl RescoreReport {
    pub fn candidates(&self) -> impl Iterator<Item = &ProteinKey> {
        self.outcomes.iter().map(|(k, _)| k)
    }

    pub fn candidate_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of proteins that were successfully rescored.
    pub fn updated_protein_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, CandidateOutcome::Rescored { .. }))
            .count()
    }

    pub fn failures(&self) -> Vec<(&ProteinKey, &RescoreError)> {
        self.outcomes
            .iter()
            .filter_map(|(k, o)| match o {
                CandidateOutcome::Failed(e) => Some((k, e)),
                _ => None,
            })
            .collect()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures().is_empty()
    }
}

/// Pushes a peptide level change up to the protein matches that report it.
pub struct HierarchicalRescorer<'a> {
    sequences: &'a dyn SequenceProvider,
    scorer: &'a dyn ProteinPtmScorer,
    search: &'a SearchParameters,
    annotation: &'a AnnotationParameters,
    config: RescoringConfig,
}

impl<'a> HierarchicalRescorer<'a> {
    pub fn new(
        sequences: &'a dyn SequenceProvider,
        scorer: &'a dyn ProteinPtmScorer,
        search: &'a SearchParameters,
        annotation: &'a AnnotationParameters,
        config: RescoringConfig,
    ) -> Self {
        Self {
            sequences,
            scorer,
            search,
            annotation,
            config,
        }
    }

    fn rescore(
        &self,
        lookup: &dyn MatchLookup,
        key: &ProteinKey,
    ) -> Result<ProteinPtmScores, RescoreError> {
        let protein = lookup
            .protein_match(key)
            .ok_or_else(|| RescoreError::ProteinNotFound(key.clone()))?;
        self.scorer
            .score_ptms(protein, lookup, self.search, self.annotation)
    }

    /// Rescores every protein match whose main match is a parent protein of
    /// the peptide.
    ///
    /// All protein matches in the store are scanned. The scores are computed
    /// against a read only view of the store (concurrently when configured)
    /// and written back afterwards, one protein at a time. A failing protein
    /// never stops the others: it is logged and listed in the report. The
    /// only error is a peptide key missing from the store.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    pub fn propagate<S: MatchStore>(
        &self,
        peptide_key: &PeptideKey,
        store: &mut S,
    ) -> Result<RescoreReport, RescoreError> {
        let st = Instant::now();
        let peptide = store
            .peptide_match(peptide_key)
            .ok_or_else(|| RescoreError::PeptideNotFound(peptide_key.clone()))?
            .peptide
            .clone();
        let parent_proteins = self.sequences.parent_proteins(peptide.sequence());
        if parent_proteins.is_empty() {
            warn!("Peptide {} maps to no protein, nothing to rescore", peptide);
        }

        let mut candidates = Vec::new();
        let mut to_rescore = Vec::new();
        for key in store.protein_match_keys() {
            let Some(protein) = store.protein_match(&key) else {
                continue;
            };
            if !protein.shares_accession(&parent_proteins) {
                continue;
            }
            if parent_proteins.contains(&protein.main_match) {
                to_rescore.push(key.clone());
            }
            candidates.push(key);
        }
        debug!(
            "Peptide {} has {} candidate proteins, {} to rescore",
            peptide_key,
            candidates.len(),
            to_rescore.len()
        );

        let lookup: &dyn MatchLookup = &*store;
        let computed: Vec<Result<ProteinPtmScores, RescoreError>> = if self.config.parallel {
            to_rescore
                .par_iter()
                .map(|key| self.rescore(lookup, key))
                .collect()
        } else {
            to_rescore
                .iter()
                .map(|key| self.rescore(lookup, key))
                .collect()
        };

        // Rescored keys are a subsequence of the candidates, in the same order.
        let mut results = to_rescore.into_iter().zip(computed).peekable();
        let mut outcomes = Vec::with_capacity(candidates.len());
        for key in candidates {
            let outcome = match results.next_if(|(rescored, _)| *rescored == key) {
                Some((_, result)) => self.write_back(store, &key, result),
                None => CandidateOutcome::NotMainMatch,
            };
            outcomes.push((key, outcome));
        }

        let report = RescoreReport {
            parent_proteins,
            outcomes,
        };
        info!(
            "Propagated peptide {} to {} proteins ({} candidates, {} failed) in {:?}",
            peptide_key,
            report.updated_protein_count(),
            report.candidate_count(),
            report.failures().len(),
            st.elapsed()
        );
        Ok(report)
    }

    fn write_back<S: MatchStore>(
        &self,
        store: &mut S,
        key: &ProteinKey,
        result: Result<ProteinPtmScores, RescoreError>,
    ) -> CandidateOutcome {
        let scores = match result {
            Ok(x) => x,
            Err(e) => {
                warn!("Rescoring of protein {} failed: {}", key, e);
                return CandidateOutcome::Failed(e);
            }
        };
        let Some(protein) = store.protein_match_mut(key) else {
            let e = RescoreError::ProteinNotFound(key.clone());
            warn!("Rescoring of protein {} failed: {}", key, e);
            return CandidateOutcome::Failed(e);
        };
        let changed = protein.ptm_scores != scores;
        if changed {
            protein.ptm_scores = scores;
            store.mark_changed(MatchKey::Protein(key.clone()));
        }
        CandidateOutcome::Rescored { changed }
    }
}
