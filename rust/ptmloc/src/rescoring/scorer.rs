use crate::confidence::ConfidenceLevel;
use crate::errors::RescoreError;
use crate::models::{
    AnnotationParameters,
    PeptideMatch,
    ProteinMatch,
    ProteinPtmScores,
    PtmScoring,
    SearchParameters,
};
use crate::store::{
    MatchLookup,
    SequenceProvider,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Recomputes the protein level PTM scores of a protein match.
///
/// Implementations only read the store, the rescorer writes the returned
/// scores back. They may be called concurrently for different proteins.
pub trait ProteinPtmScorer: Send + Sync {
    fn score_ptms(
        &self,
        protein: &ProteinMatch,
        lookup: &dyn MatchLookup,
        search: &SearchParameters,
        annotation: &AnnotationParameters,
    ) -> Result<ProteinPtmScores, RescoreError>;
}

/// Projects the peptide level sites of a protein match onto the sequence of
/// its main match accession.
///
/// Every occurrence of a peptide in the protein contributes. A protein site
/// keeps the best confidence any peptide reported for it, and a site that is
/// main for one peptide is never listed as secondary.
pub struct ProteinSiteScorer<'a> {
    sequences: &'a dyn SequenceProvider,
}

impl<'a> ProteinSiteScorer<'a> {
    pub fn new(sequences: &'a dyn SequenceProvider) -> Self {
        Self { sequences }
    }
}

/// Scored modifications of a peptide, with the sequence modifications of the
/// ones that were never scored standing in as main sites.
fn peptide_sites(
    peptide_match: &PeptideMatch,
    search: &SearchParameters,
) -> BTreeMap<String, PtmScoring> {
    let mut out: BTreeMap<String, PtmScoring> = peptide_match
        .ptm_scores
        .iter()
        .filter(|(name, _)| search.is_variable(name))
        .map(|(name, scoring)| (name.clone(), scoring.clone()))
        .collect();
    for name in peptide_match.peptide.modification_names() {
        if !search.is_variable(name) || out.contains_key(name) {
            continue;
        }
        out.insert(
            name.to_string(),
            PtmScoring::with_sites(
                peptide_match.peptide.modification_positions(name),
                [],
                ConfidenceLevel::NotFound,
            ),
        );
    }
    out
}

impl ProteinPtmScorer for ProteinSiteScorer<'_> {
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    fn score_ptms(
        &self,
        protein: &ProteinMatch,
        lookup: &dyn MatchLookup,
        search: &SearchParameters,
        _annotation: &AnnotationParameters,
    ) -> Result<ProteinPtmScores, RescoreError> {
        let accession = protein.main_match.as_str();
        if self.sequences.protein_sequence(accession).is_none() {
            return Err(RescoreError::SequenceUnavailable {
                accession: accession.to_string(),
            });
        }

        let mut scores = ProteinPtmScores::default();
        for peptide_key in protein.peptide_keys.iter() {
            let peptide_match = lookup
                .peptide_match(peptide_key)
                .ok_or_else(|| RescoreError::PeptideNotFound(peptide_key.clone()))?;
            let starts = self
                .sequences
                .peptide_starts(accession, peptide_match.peptide.sequence())
                .unwrap_or_default();
            if starts.is_empty() {
                debug!(
                    "Peptide {} does not map to {}, ignored for {}",
                    peptide_match.peptide, accession, protein.key
                );
                continue;
            }

            for (name, scoring) in peptide_sites(peptide_match, search) {
                let summary = scores.modifications.entry(name).or_default();
                for start in starts.iter() {
                    for pos in scoring.main_sites() {
                        let level = scoring.site_confidence(*pos);
                        let site = summary.main_sites.entry(start + pos).or_default();
                        *site = (*site).max(level);
                    }
                    for pos in scoring.secondary_sites() {
                        summary.secondary_sites.insert(start + pos);
                    }
                }
            }
        }

        for summary in scores.modifications.values_mut() {
            let main_sites = &summary.main_sites;
            summary.secondary_sites.retain(|x| !main_sites.contains_key(x));
        }
        Ok(scores)
    }
}
