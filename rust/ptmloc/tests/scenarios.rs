use ptmloc::confidence::ConfidenceLevel;
use ptmloc::editing::{
    CommitEditCommand,
    EditSession,
    SiteSelection,
};
use ptmloc::errors::RescoreError;
use ptmloc::evidence::{
    EvidenceAggregator,
    EvidenceConfig,
    IonMatch,
    IonType,
    PrecomputedAnnotator,
};
use ptmloc::models::{
    AnnotationParameters,
    MatchKey,
    ModificationCatalog,
    PeptideKey,
    PeptideMatch,
    ProteinKey,
    ProteinMatch,
    ProteinPtmScores,
    SearchParameters,
    SpectrumMatch,
};
use ptmloc::rescoring::{
    CandidateOutcome,
    HierarchicalRescorer,
    ProteinPtmScorer,
    ProteinSiteScorer,
    RescoringConfig,
};
use ptmloc::store::{
    InMemoryMatchStore,
    InMemorySequences,
    MatchLookup,
};
use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::sync::Arc;
use std::sync::Mutex;

/// Scorer that records which proteins it was asked about.
#[derive(Default)]
struct RecordingScorer {
    calls: Mutex<Vec<ProteinKey>>,
    failing: BTreeSet<ProteinKey>,
}

impl RecordingScorer {
    fn failing_for(keys: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: keys.iter().map(|x| ProteinKey::from(*x)).collect(),
        }
    }

    fn calls(&self) -> Vec<ProteinKey> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

impl ProteinPtmScorer for RecordingScorer {
    fn score_ptms(
        &self,
        protein: &ProteinMatch,
        _lookup: &dyn MatchLookup,
        _search: &SearchParameters,
        _annotation: &AnnotationParameters,
    ) -> Result<ProteinPtmScores, RescoreError> {
        self.calls.lock().unwrap().push(protein.key.clone());
        if self.failing.contains(&protein.key) {
            return Err(RescoreError::ScorerFailed {
                protein: protein.key.clone(),
                reason: "boom".into(),
            });
        }
        Ok(ProteinPtmScores::default())
    }
}

fn sequences() -> InMemorySequences {
    [
        ("P1", "MKACDESTVKR"),
        ("P2", "GGACDESTVKGG"),
        ("P3", "MLLPPKR"),
        ("P9", "MSSSSSSK"),
    ]
    .into_iter()
    .map(|(a, s)| (a.to_string(), s.to_string()))
    .collect()
}

fn protein(key: &str, accessions: &[&str], main_match: &str) -> ProteinMatch {
    ProteinMatch {
        key: key.into(),
        accessions: accessions.iter().map(|x| x.to_string()).collect(),
        main_match: main_match.into(),
        peptide_keys: vec!["pep".into()],
        ptm_scores: Default::default(),
    }
}

fn store_with_proteins(proteins: Vec<ProteinMatch>) -> InMemoryMatchStore {
    let mut store = InMemoryMatchStore::new();
    store.insert_peptide_match(PeptideMatch {
        key: "pep".into(),
        peptide: Arc::new("ACDESTVK".parse().unwrap()),
        spectrum_keys: vec![],
        ptm_scores: BTreeMap::new(),
    });
    for p in proteins {
        store.insert_protein_match(p);
    }
    store
}

fn search() -> SearchParameters {
    SearchParameters {
        fixed_modifications: vec![],
        variable_modifications: vec!["Phospho".into()],
    }
}

fn open(store: &InMemoryMatchStore) -> EditSession {
    EditSession::open(
        store,
        &ModificationCatalog::common(),
        &PeptideKey::from("pep"),
        "Phospho",
    )
    .unwrap()
}

#[test]
fn test_scenario_a_dominant_position() {
    let catalog = ModificationCatalog::common();
    let params = AnnotationParameters::default();
    let mut annotator = PrecomputedAnnotator::new();
    let ion = |ion, ordinal, k, intensity| IonMatch {
        ion,
        ordinal,
        modification_count: k,
        intensity,
    };
    annotator.insert(
        "s1".into(),
        vec![
            ion(IonType::B, 3, 1, 1000.0),
            ion(IonType::Y, 5, 1, 800.0),
            ion(IonType::B, 2, 1, 50.0),
            ion(IonType::Y, 2, 1, 20.0),
            ion(IonType::B, 2, 0, 400.0),
        ],
    );
    let spectrum = SpectrumMatch {
        key: "s1".into(),
        best_assumption: Arc::new("ACDESTVK".parse().unwrap()),
        localization_scores: BTreeMap::new(),
        ptm_scores: BTreeMap::new(),
    };

    let aggregator =
        EvidenceAggregator::new(&annotator, &catalog, &params, EvidenceConfig::default()).unwrap();
    let evidence = aggregator
        .aggregate(&spectrum.best_assumption, "Phospho", 1, &[&spectrum])
        .unwrap();

    let at_three = evidence.quantile(1, IonType::B, 3, 0.75);
    assert!(at_three > 0.0);
    for pos in 1..=8 {
        for ion in [IonType::B, IonType::Y] {
            if (pos, ion) != (3, IonType::B) {
                assert!(evidence.quantile(1, ion, pos, 0.75) < at_three);
            }
        }
    }
    // y5 of an 8 residue peptide breaks after residue 3 as well.
    assert!(evidence.quantile(1, IonType::Y, 3, 0.75) > 0.0);
    assert_eq!(
        evidence.dominant_position(1, &[IonType::B, IonType::Y], 0.75),
        Some((3, IonType::B, at_three))
    );
}

#[test]
fn test_scenario_b_secondary_demotes_main() {
    let store = store_with_proteins(vec![]);
    let mut session = open(&store);
    session.toggle_main(3).unwrap();
    session.toggle_secondary(3).unwrap();
    assert!(!session.main_selection().contains(&3));
    assert!(session.secondary_selection().contains(&3));
    assert_eq!(session.selection(3), Some(SiteSelection::Secondary));
}

#[test]
fn test_scenario_c_noop_commit_skips_rescoring() {
    let sequences = sequences();
    let scorer = RecordingScorer::default();
    let search = search();
    let annotation = AnnotationParameters::default();
    let rescorer = HierarchicalRescorer::new(
        &sequences,
        &scorer,
        &search,
        &annotation,
        RescoringConfig::default(),
    );
    let mut store = store_with_proteins(vec![protein("prot1", &["P1"], "P1")]);
    let mut session = open(&store);

    let report = CommitEditCommand::new(&mut session, &rescorer)
        .execute(&mut store)
        .unwrap();
    assert!(!report.outcome.changed);
    assert!(report.rescore.is_none());
    assert!(scorer.calls().is_empty());
    assert!(store.changed().is_empty());
}

#[test]
fn test_scenario_d_only_main_match_proteins_are_rescored() {
    let sequences = sequences();
    let scorer = RecordingScorer::default();
    let search = search();
    let annotation = AnnotationParameters::default();
    let rescorer = HierarchicalRescorer::new(
        &sequences,
        &scorer,
        &search,
        &annotation,
        RescoringConfig::default(),
    );
    let mut store = store_with_proteins(vec![
        protein("prot1", &["P1"], "P1"),
        protein("prot2", &["P2", "P9"], "P9"),
        protein("prot3", &["P3"], "P3"),
    ]);
    let mut session = open(&store);
    assert_eq!(session.selection(5), Some(SiteSelection::Absent));
    session.toggle_main(5).unwrap();

    let report = CommitEditCommand::new(&mut session, &rescorer)
        .execute(&mut store)
        .unwrap();
    assert!(report.outcome.changed);
    assert_eq!(report.outcome.added_main, vec![5]);
    assert_eq!(scorer.calls(), vec![ProteinKey::from("prot1")]);

    let rescore = report.rescore.unwrap();
    assert_eq!(
        rescore.parent_proteins,
        BTreeSet::from(["P1".to_string(), "P2".to_string()])
    );
    assert_eq!(
        rescore.outcomes,
        vec![
            (
                ProteinKey::from("prot1"),
                CandidateOutcome::Rescored { changed: false }
            ),
            (ProteinKey::from("prot2"), CandidateOutcome::NotMainMatch),
        ]
    );
    assert_eq!(rescore.updated_protein_count(), 1);
    assert!(store.is_changed(&MatchKey::Peptide("pep".into())));
}

#[test]
fn test_propagation_reports_every_candidate_under_partial_failure() {
    let sequences = sequences();
    let scorer = RecordingScorer::failing_for(&["prot2"]);
    let search = search();
    let annotation = AnnotationParameters::default();
    let rescorer = HierarchicalRescorer::new(
        &sequences,
        &scorer,
        &search,
        &annotation,
        RescoringConfig { parallel: false },
    );
    let mut store = store_with_proteins(vec![
        protein("prot1", &["P1"], "P1"),
        protein("prot2", &["P2"], "P2"),
        protein("prot3", &["P1", "P2"], "P2"),
    ]);
    let mut session = open(&store);
    session.toggle_secondary(7).unwrap();

    let report = CommitEditCommand::new(&mut session, &rescorer)
        .execute(&mut store)
        .unwrap();
    let rescore = report.rescore.unwrap();
    assert_eq!(rescore.candidate_count(), 3);
    assert_eq!(rescore.updated_protein_count(), 2);
    let failures = rescore.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, &ProteinKey::from("prot2"));
    assert!(!rescore.is_complete_success());
    assert_eq!(scorer.calls().len(), 3);

    // The selection is persisted regardless of the failure.
    let record = &store.peptide_match(&"pep".into()).unwrap().ptm_scores["Phospho"];
    assert_eq!(record.secondary_sites(), &BTreeSet::from([7]));
}

#[test]
fn test_commit_propagates_sites_to_protein_coordinates() {
    let sequences = sequences();
    let scorer = ProteinSiteScorer::new(&sequences);
    let search = search();
    let annotation = AnnotationParameters::default();
    let rescorer = HierarchicalRescorer::new(
        &sequences,
        &scorer,
        &search,
        &annotation,
        RescoringConfig::default(),
    );
    let mut store = store_with_proteins(vec![
        protein("prot1", &["P1"], "P1"),
        protein("prot2", &["P2"], "P2"),
    ]);
    let mut session = open(&store);
    session.toggle_main(5).unwrap();
    session.toggle_secondary(6).unwrap();

    let report = CommitEditCommand::new(&mut session, &rescorer)
        .execute(&mut store)
        .unwrap();
    assert_eq!(report.rescore.unwrap().updated_protein_count(), 2);
    assert!(store.is_changed(&MatchKey::Protein("prot1".into())));
    assert!(store.is_changed(&MatchKey::Protein("prot2".into())));

    // ACDESTVK starts after MK in P1 and after GG in P2.
    for key in ["prot1", "prot2"] {
        let protein = store.protein_match(&key.into()).unwrap();
        let phospho = protein.ptm_scores.get("Phospho").unwrap();
        assert_eq!(
            phospho.main_sites,
            BTreeMap::from([(7, ConfidenceLevel::NotFound)])
        );
        assert_eq!(phospho.secondary_sites, BTreeSet::from([8]));
    }

    // Rescoring again with the same sites changes nothing.
    store.take_changed();
    let again = rescorer.propagate(&"pep".into(), &mut store).unwrap();
    assert_eq!(again.updated_protein_count(), 2);
    assert!(store.changed().is_empty());
}

#[test]
fn test_toggles_never_overlap_and_commit_is_idempotent() {
    let mut store = store_with_proteins(vec![]);
    let mut session = open(&store);

    // Fixed pseudo random walk over the positions and both toggles.
    let mut state: u64 = 42;
    for _ in 0..500 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let position = ((state >> 33) % 8) as usize + 1;
        if (state >> 17) & 1 == 0 {
            session.toggle_main(position).unwrap();
        } else {
            session.toggle_secondary(position).unwrap();
        }
        assert!(session
            .main_selection()
            .is_disjoint(&session.secondary_selection()));
        let annotated = session.render_annotated_sequence();
        for pos in 1..=8 {
            assert_eq!(
                annotated.selection(pos, "Phospho"),
                session.selection(pos).unwrap()
            );
        }
    }

    let has_sites =
        !(session.main_selection().is_empty() && session.secondary_selection().is_empty());
    let first = session.commit(&mut store).unwrap();
    assert_eq!(first.changed, has_sites);
    let second = session.commit(&mut store).unwrap();
    assert!(!second.changed);

    // A fresh session sees exactly what was committed.
    let reopened = open(&store);
    assert_eq!(reopened.main_selection(), session.main_selection());
    assert_eq!(reopened.secondary_selection(), session.secondary_selection());
}
