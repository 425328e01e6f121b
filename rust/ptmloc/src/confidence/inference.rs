//! Automatic site assignment from the modification engine scores.
//!
//! PSM level records are built from the per-site localization scores of one
//! spectrum. Peptide level records are built from the PSM level records of all
//! the spectra supporting the peptide.

use super::{
    ConfidenceClassifier,
    ConfidenceLevel,
};
use crate::models::{
    PeptideMatch,
    PtmScoring,
    SpectrumMatch,
};
use crate::store::MatchLookup;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// PSM level site assignment of `modification` for one spectrum.
///
/// The `n` best scored sites become main sites, `n` being the number of
/// occurrences on the best assumption. Remaining sites that classify as at
/// least doubtful become secondary sites. Without any localization score the
/// assumption's own positions are kept, as a random pick.
///
/// Returns `None` when the assumption does not carry the modification.
pub fn score_spectrum_sites(
    spectrum: &SpectrumMatch,
    modification: &str,
    classifier: &ConfidenceClassifier,
) -> Option<PtmScoring> {
    let peptide = &spectrum.best_assumption;
    let n_ptm = peptide.modification_count(modification);
    if n_ptm == 0 {
        return None;
    }
    let assumed = peptide.modification_positions(modification);

    let scores = match spectrum.localization_scores.get(modification) {
        Some(x) if !x.is_empty() => x,
        _ => {
            debug!(
                "No localization scores for {} in spectrum {}",
                modification, spectrum.key
            );
            return Some(PtmScoring::with_sites(assumed, [], ConfidenceLevel::Random));
        }
    };

    let mut ranked: Vec<(usize, f64)> = scores
        .iter()
        .filter(|(pos, _)| **pos >= 1 && **pos <= peptide.len())
        .map(|(pos, score)| (*pos, *score))
        .collect();
    // Best score first, ties go to the assumed position and then the N-terminal one.
    ranked.sort_by(|a, b| {
        cmp_desc_nan_last(a.1, b.1)
            .then_with(|| assumed.contains(&b.0).cmp(&assumed.contains(&a.0)))
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut scoring = PtmScoring::new();
    let mut weakest = None;
    for (i, (pos, score)) in ranked.iter().enumerate() {
        let level = classifier.classify_score(Some(*score));
        if i < n_ptm {
            scoring.add_main_site(*pos);
            scoring.set_site_confidence(*pos, level);
            weakest = Some(weakest.map_or(level, |w: ConfidenceLevel| w.min(level)));
        } else if level >= ConfidenceLevel::Doubtful {
            scoring.add_secondary_site(*pos);
        }
    }
    // Fewer scored sites than occurrences, complete with the assumption.
    for pos in assumed.iter() {
        if scoring.main_sites().len() >= n_ptm {
            break;
        }
        if !scoring.is_main(*pos) {
            scoring.add_main_site(*pos);
            scoring.set_site_confidence(*pos, ConfidenceLevel::Random);
            weakest = Some(ConfidenceLevel::Random);
        }
    }
    scoring.confidence = weakest.unwrap_or(ConfidenceLevel::Random);
    Some(scoring)
}

/// Peptide level site assignment of `modification` from its supporting PSMs.
///
/// PSM records stored on the spectrum matches are used when present, otherwise
/// they are computed on the fly with [`score_spectrum_sites`]. Each site gets
/// the peptide level classification of the levels its PSMs reported.
///
/// Returns `None` when the peptide does not carry the modification.
pub fn infer_peptide_scoring(
    peptide_match: &PeptideMatch,
    lookup: &dyn MatchLookup,
    modification: &str,
    classifier: &ConfidenceClassifier,
) -> Option<PtmScoring> {
    let peptide = &peptide_match.peptide;
    let n_ptm = peptide.modification_count(modification);
    if n_ptm == 0 {
        return None;
    }

    let mut site_levels: BTreeMap<usize, Vec<ConfidenceLevel>> = BTreeMap::new();
    for spectrum in lookup.spectrum_matches_of(peptide_match) {
        let psm_scoring = match spectrum.ptm_scores.get(modification) {
            Some(x) => Some(x.clone()),
            None => score_spectrum_sites(spectrum, modification, classifier),
        };
        let Some(psm_scoring) = psm_scoring else {
            continue;
        };
        for pos in psm_scoring.main_sites() {
            site_levels
                .entry(*pos)
                .or_default()
                .push(psm_scoring.site_confidence(*pos));
        }
        for pos in psm_scoring.secondary_sites() {
            site_levels
                .entry(*pos)
                .or_default()
                .push(ConfidenceLevel::Doubtful);
        }
    }

    let mut ranked: Vec<(usize, ConfidenceLevel, usize)> = site_levels
        .iter()
        .filter(|(pos, _)| **pos >= 1 && **pos <= peptide.len())
        .map(|(pos, levels)| {
            let level = classifier.classify_levels(levels.iter().copied());
            (*pos, level, levels.len())
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut scoring = PtmScoring::new();
    let mut weakest: Option<ConfidenceLevel> = None;
    for (i, (pos, level, _)) in ranked.iter().enumerate() {
        if i < n_ptm && *level > ConfidenceLevel::NotFound {
            scoring.add_main_site(*pos);
            scoring.set_site_confidence(*pos, *level);
            weakest = Some(weakest.map_or(*level, |w| w.min(*level)));
        } else if *level >= ConfidenceLevel::Doubtful {
            scoring.add_secondary_site(*pos);
        }
    }
    for pos in peptide.modification_positions(modification) {
        if scoring.main_sites().len() >= n_ptm {
            break;
        }
        if !scoring.is_main(pos) {
            scoring.add_main_site(pos);
            scoring.set_site_confidence(pos, ConfidenceLevel::NotFound);
            weakest = Some(ConfidenceLevel::NotFound);
        }
    }
    scoring.confidence = weakest.unwrap_or(ConfidenceLevel::NotFound);
    Some(scoring)
}

fn cmp_desc_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Peptide,
        SpectrumKey,
    };
    use crate::store::InMemoryMatchStore;
    use std::sync::Arc;

    fn psm(key: &str, peptide: &str, scores: &[(usize, f64)]) -> SpectrumMatch {
        let mut localization_scores = BTreeMap::new();
        localization_scores.insert("Phospho".to_string(), scores.iter().copied().collect());
        SpectrumMatch {
            key: SpectrumKey::from(key),
            best_assumption: Arc::new(peptide.parse::<Peptide>().unwrap()),
            localization_scores,
            ptm_scores: BTreeMap::new(),
        }
    }

    #[test]
    fn test_spectrum_sites_follow_scores() {
        let classifier = ConfidenceClassifier::default();
        let spectrum = psm("s1", "ACDES[Phospho]TVK", &[(5, 10.0), (6, 97.0)]);
        let scoring = score_spectrum_sites(&spectrum, "Phospho", &classifier).unwrap();
        assert_eq!(scoring.main_sites().iter().copied().collect::<Vec<_>>(), vec![6]);
        assert!(scoring.secondary_sites().is_empty());
        assert_eq!(scoring.site_confidence(6), ConfidenceLevel::Confident);
        assert_eq!(scoring.confidence, ConfidenceLevel::Confident);

        assert!(score_spectrum_sites(&spectrum, "Oxidation", &classifier).is_none());
    }

    #[test]
    fn test_spectrum_sites_secondary_and_ties() {
        let classifier = ConfidenceClassifier::default();
        let spectrum = psm("s1", "ACDES[Phospho]TVK", &[(5, 50.0), (6, 50.0)]);
        let scoring = score_spectrum_sites(&spectrum, "Phospho", &classifier).unwrap();
        // Tie goes to the assumed site.
        assert!(scoring.is_main(5));
        assert!(scoring.is_secondary(6));
        assert_eq!(scoring.confidence, ConfidenceLevel::Doubtful);
    }

    #[test]
    fn test_spectrum_sites_without_scores() {
        let classifier = ConfidenceClassifier::default();
        let spectrum = psm("s1", "ACDES[Phospho]TVK", &[]);
        let scoring = score_spectrum_sites(&spectrum, "Phospho", &classifier).unwrap();
        assert!(scoring.is_main(5));
        assert_eq!(scoring.confidence, ConfidenceLevel::Random);
    }

    #[test]
    fn test_peptide_scoring_from_psms() {
        let classifier = ConfidenceClassifier::default();
        let mut store = InMemoryMatchStore::new();
        store.insert_spectrum_match(psm("s1", "ACDES[Phospho]TVK", &[(5, 96.0), (6, 4.0)]));
        store.insert_spectrum_match(psm("s2", "ACDES[Phospho]TVK", &[(5, 98.0), (6, 2.0)]));
        store.insert_spectrum_match(psm("s3", "ACDEST[Phospho]VK", &[(5, 30.0), (6, 70.0)]));
        let peptide_match = PeptideMatch {
            key: "pep".into(),
            peptide: Arc::new("ACDES[Phospho]TVK".parse().unwrap()),
            spectrum_keys: vec!["s1".into(), "s2".into(), "s3".into()],
            ptm_scores: BTreeMap::new(),
        };

        let scoring =
            infer_peptide_scoring(&peptide_match, &store, "Phospho", &classifier).unwrap();
        assert!(scoring.is_main(5));
        assert_eq!(scoring.site_confidence(5), ConfidenceLevel::VeryConfident);
        assert!(scoring.is_secondary(6));
        assert_eq!(scoring.confidence, ConfidenceLevel::VeryConfident);
        assert!(scoring.is_consistent());
    }

    #[test]
    fn test_peptide_scoring_without_psms() {
        let classifier = ConfidenceClassifier::default();
        let store = InMemoryMatchStore::new();
        let peptide_match = PeptideMatch {
            key: "pep".into(),
            peptide: Arc::new("ACDES[Phospho]TVK".parse().unwrap()),
            spectrum_keys: vec![],
            ptm_scores: BTreeMap::new(),
        };
        let scoring =
            infer_peptide_scoring(&peptide_match, &store, "Phospho", &classifier).unwrap();
        assert!(scoring.is_main(5));
        assert_eq!(scoring.confidence, ConfidenceLevel::NotFound);
    }
}
