use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{
    self,
    BufWriter,
    Write,
};
use std::path::Path;
use std::time::Instant;

use ptmloc::confidence::{
    ConfidenceClassifier,
    infer_peptide_scoring,
    score_spectrum_sites,
};
use ptmloc::editing::{
    CommitEditCommand,
    CommitOutcome,
    EditSession,
};
use ptmloc::evidence::{
    EvidenceAggregator,
    IonType,
    PrecomputedAnnotator,
    SiteEvidence,
};
use ptmloc::models::{
    MatchKey,
    ModificationCatalog,
    PeptideKey,
};
use ptmloc::rescoring::{
    CandidateOutcome,
    HierarchicalRescorer,
    ProteinSiteScorer,
    RescoreReport,
};
use ptmloc::store::{
    InMemoryMatchStore,
    InMemorySequences,
    MatchLookup,
    MatchStore,
};
use tracing::{
    info,
    instrument,
    warn,
};

use crate::cli::{
    CommitArgs,
    EvidenceArgs,
    InferArgs,
    WriteTemplateArgs,
};
use crate::config::Config;
use crate::errors::CliError;

fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), CliError> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            info!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

fn load_store(path: &Path) -> Result<InMemoryMatchStore, CliError> {
    InMemoryMatchStore::from_file(path).map_err(|e| {
        CliError::DataReading(format!(
            "Failed to read matches from {}: {}",
            path.display(),
            e
        ))
    })
}

#[derive(Debug, Serialize)]
struct SkippedSpectrum {
    spectrum: String,
    reason: String,
}

#[derive(Debug, Serialize)]
struct EvidenceRow {
    k: usize,
    ion: IonType,
    /// Indexed by position - 1.
    quantiles: Vec<f64>,
    nonzero_counts: Vec<usize>,
    histograms: Vec<Vec<usize>>,
}

#[derive(Debug, Serialize)]
struct DominantSite {
    k: usize,
    position: usize,
    ion: IonType,
    value: f64,
}

#[derive(Debug, Serialize)]
struct EvidenceOutput {
    peptide: String,
    modification: String,
    n_ptm: usize,
    n_spectra: usize,
    quantile: f64,
    skipped: Vec<SkippedSpectrum>,
    dominant: Vec<DominantSite>,
    rows: Vec<EvidenceRow>,
}

impl EvidenceOutput {
    fn new(
        evidence: &SiteEvidence,
        peptide: String,
        modification: String,
        ion_types: &[IonType],
        quantile: f64,
        n_bins: usize,
    ) -> Self {
        let positions = evidence.positions();
        let mut rows = Vec::new();
        let mut dominant = Vec::new();
        for k in 0..=evidence.n_ptm() {
            for ion in ion_types {
                rows.push(EvidenceRow {
                    k,
                    ion: *ion,
                    quantiles: evidence.quantile_row(k, *ion, quantile),
                    nonzero_counts: positions
                        .clone()
                        .map(|p| evidence.nonzero_count(k, *ion, p))
                        .collect(),
                    histograms: positions
                        .clone()
                        .map(|p| evidence.histogram(k, *ion, p, n_bins))
                        .collect(),
                });
            }
            let best = evidence.dominant_position(k, ion_types, quantile);
            if let Some((position, ion, value)) = best {
                dominant.push(DominantSite {
                    k,
                    position,
                    ion,
                    value,
                });
            }
        }
        Self {
            peptide,
            modification,
            n_ptm: evidence.n_ptm(),
            n_spectra: evidence.n_spectra(),
            quantile,
            skipped: evidence
                .skipped()
                .iter()
                .map(|(k, e)| SkippedSpectrum {
                    spectrum: k.to_string(),
                    reason: e.to_string(),
                })
                .collect(),
            dominant,
            rows,
        }
    }
}

/// Main function for the 'evidence' subcommand.
#[instrument(skip_all)]
pub fn main_evidence(args: EvidenceArgs) -> Result<(), CliError> {
    let mut config = Config::from_optional_file(args.config.as_deref())?;
    if let Some(q) = args.quantile {
        config.evidence.quantile = q;
    }
    let store = load_store(&args.store_path)?;
    let annotator: PrecomputedAnnotator =
        serde_json::from_str(&std::fs::read_to_string(&args.annotations_path)?)?;
    let catalog = ModificationCatalog::common();
    let modification = catalog.require(&args.modification)?;

    let key = PeptideKey::from(args.peptide_key);
    let peptide_match = store.peptide_match(&key).ok_or_else(|| {
        CliError::DataReading(format!("Peptide match {} is not in the store", key))
    })?;
    let n_ptm = args
        .n_ptm
        .unwrap_or_else(|| peptide_match.peptide.modification_count(&modification.name));
    let spectra = store.spectrum_matches_of(peptide_match);
    if spectra.len() < peptide_match.spectrum_keys.len() {
        warn!(
            "{} spectrum keys of {} are not in the store",
            peptide_match.spectrum_keys.len() - spectra.len(),
            key
        );
    }

    let aggregator = EvidenceAggregator::new(
        &annotator,
        &catalog,
        &config.annotation,
        config.evidence.clone(),
    )?;
    let evidence =
        aggregator.aggregate(&peptide_match.peptide, &modification.name, n_ptm, &spectra)?;
    let output = EvidenceOutput::new(
        &evidence,
        peptide_match.peptide.to_string(),
        modification.name.clone(),
        &config.annotation.ion_types,
        config.evidence.quantile,
        config.evidence.histogram_bins,
    );
    write_json(&output, args.output_path.as_deref())
}

/// Main function for the 'infer' subcommand.
#[instrument(skip_all)]
pub fn main_infer(args: InferArgs) -> Result<(), CliError> {
    let st = Instant::now();
    let config = Config::from_optional_file(args.config.as_deref())?;
    let classifier = ConfidenceClassifier::new(config.classifier)?;
    let mut store = load_store(&args.store_path)?;

    let peptide_keys: Vec<PeptideKey> = store.peptide_match_keys().cloned().collect();
    let mut n_psm_records = 0;
    let mut n_peptide_records = 0;
    for key in peptide_keys.iter() {
        let Some(peptide_match) = store.peptide_match(key).cloned() else {
            continue;
        };
        let modifications: Vec<String> = peptide_match
            .peptide
            .modification_names()
            .into_iter()
            .filter(|name| config.search.is_variable(name))
            .map(|name| name.to_string())
            .collect();

        for modification in modifications.iter() {
            for spectrum_key in peptide_match.spectrum_keys.iter() {
                let scoring = match store.spectrum_match(spectrum_key) {
                    Some(s) if args.overwrite || !s.ptm_scores.contains_key(modification) => {
                        score_spectrum_sites(s, modification, &classifier)
                    }
                    _ => None,
                };
                let Some(scoring) = scoring else {
                    continue;
                };
                if let Some(s) = store.spectrum_match_mut(spectrum_key) {
                    s.ptm_scores.insert(modification.clone(), scoring);
                    store.mark_changed(MatchKey::Spectrum(spectrum_key.clone()));
                    n_psm_records += 1;
                }
            }

            if !args.overwrite && peptide_match.ptm_scores.contains_key(modification) {
                continue;
            }
            let Some(scoring) =
                infer_peptide_scoring(&peptide_match, &store, modification, &classifier)
            else {
                continue;
            };
            if let Some(p) = store.peptide_match_mut(key) {
                p.ptm_scores.insert(modification.clone(), scoring);
                store.mark_changed(MatchKey::Peptide(key.clone()));
                n_peptide_records += 1;
            }
        }
    }

    info!(
        "Scored {} PSM and {} peptide records, {} matches changed in {:?}",
        n_psm_records,
        n_peptide_records,
        store.changed().len(),
        st.elapsed()
    );
    write_json(&store, Some(args.output_path.as_path()))
}

#[derive(Debug, Serialize)]
struct CandidateView {
    protein: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    changed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RescoreView {
    parent_proteins: BTreeSet<String>,
    updated_protein_count: usize,
    failure_count: usize,
    candidates: Vec<CandidateView>,
}

impl From<&RescoreReport> for RescoreView {
    fn from(report: &RescoreReport) -> Self {
        let candidates = report
            .outcomes
            .iter()
            .map(|(key, outcome)| {
                let (status, changed, error) = match outcome {
                    CandidateOutcome::Rescored { changed } => ("rescored", Some(*changed), None),
                    CandidateOutcome::NotMainMatch => ("not_main_match", None, None),
                    CandidateOutcome::Failed(e) => ("failed", None, Some(e.to_string())),
                };
                CandidateView {
                    protein: key.to_string(),
                    status,
                    changed,
                    error,
                }
            })
            .collect();
        Self {
            parent_proteins: report.parent_proteins.clone(),
            updated_protein_count: report.updated_protein_count(),
            failure_count: report.failures().len(),
            candidates,
        }
    }
}

#[derive(Debug, Serialize)]
struct CommitView<'a> {
    peptide_key: &'a str,
    modification: &'a str,
    annotated_sequence: String,
    outcome: &'a CommitOutcome,
    rescore: Option<RescoreView>,
}

/// Main function for the 'commit' subcommand.
#[instrument(skip_all)]
pub fn main_commit(args: CommitArgs) -> Result<(), CliError> {
    let mut config = Config::from_file(&args.config)?;
    if args.sequential {
        config.rescoring.parallel = false;
    }
    let edit = config.edit.clone().ok_or_else(|| {
        CliError::DataReading(format!(
            "Configuration {} has no edit section",
            args.config.display()
        ))
    })?;
    let mut store = load_store(&args.store_path)?;
    let sequences: InMemorySequences =
        serde_json::from_str(&std::fs::read_to_string(&args.sequences_path)?)?;
    info!("Loaded {} protein sequences", sequences.len());
    let catalog = ModificationCatalog::common();

    let key = PeptideKey::from(edit.peptide_key.as_str());
    let mut session = EditSession::open(&store, &catalog, &key, &edit.modification)?;
    for position in edit.toggle_main.iter() {
        session.toggle_main(*position)?;
    }
    for position in edit.toggle_secondary.iter() {
        session.toggle_secondary(*position)?;
    }
    let annotated_sequence = session.render_annotated_sequence().to_string();
    info!("Committing {}", annotated_sequence);

    let scorer = ProteinSiteScorer::new(&sequences);
    let rescorer = HierarchicalRescorer::new(
        &sequences,
        &scorer,
        &config.search,
        &config.annotation,
        config.rescoring.clone(),
    );
    let report = CommitEditCommand::new(&mut session, &rescorer).execute(&mut store)?;
    if let Some(rescore) = report.rescore.as_ref() {
        for (protein, e) in rescore.failures() {
            warn!("Protein {} keeps its previous scores: {}", protein, e);
        }
    }

    std::fs::create_dir_all(&args.output_dir)?;
    let view = CommitView {
        peptide_key: key.as_str(),
        modification: session.modification(),
        annotated_sequence,
        outcome: &report.outcome,
        rescore: report.rescore.as_ref().map(RescoreView::from),
    };
    write_json(&view, Some(args.output_dir.join("commit_report.json").as_path()))?;
    if report.outcome.changed {
        write_json(&store, Some(args.output_dir.join("matches.json").as_path()))?;
    } else {
        info!("Nothing changed, the snapshot is not rewritten");
    }
    Ok(())
}

const SEQUENCES_TEMPLATE: &str = r#"{
  "P1": "MKACDESTVKR",
  "P2": "GGACDESTVKGG"
}"#;

const MATCHES_TEMPLATE: &str = r#"{
  "peptide_matches": {
    "PEPTIDE_KEY": {
      "key": "PEPTIDE_KEY",
      "peptide": "ACDES[Phospho]TVK",
      "spectrum_keys": ["scan_1"],
      "ptm_scores": {}
    }
  },
  "protein_matches": {
    "PROTEIN_KEY": {
      "key": "PROTEIN_KEY",
      "accessions": ["P1"],
      "main_match": "P1",
      "peptide_keys": ["PEPTIDE_KEY"]
    }
  },
  "spectrum_matches": {
    "scan_1": {
      "key": "scan_1",
      "best_assumption": "ACDES[Phospho]TVK",
      "localization_scores": { "Phospho": { "5": 97.5, "6": 12.0 } }
    }
  }
}"#;

/// Main function for the 'write-template' subcommand.
pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let target_dir = args.output_path;
    std::fs::create_dir_all(&target_dir)?;

    let config_path = target_dir.join("config_template.json");
    write_json(&Config::template(), Some(config_path.as_path()))?;

    let sequences_path = target_dir.join("sequences_template.json");
    let matches_path = target_dir.join("matches_template.json");
    std::fs::write(&sequences_path, SEQUENCES_TEMPLATE)?;
    std::fs::write(&matches_path, MATCHES_TEMPLATE)?;
    println!(
        "Wrote templates to:\n- {}\n- {}\n- {}",
        config_path.display(),
        sequences_path.display(),
        matches_path.display()
    );
    Ok(())
}
