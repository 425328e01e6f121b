//! Aggregation of per-spectrum fragment evidence.
//!
//! Annotating a spectrum is independent of every other spectrum, so that step
//! runs on the rayon pool. Each spectrum yields its own normalized cell buffer
//! and the buffers are then merged into one [`SiteEvidence`] on the calling
//! thread, in input order.

use super::site_evidence::CellLayout;
use super::{
    SiteEvidence,
    SpectrumAnnotator,
};
use crate::errors::{
    ConfigError,
    EvidenceError,
};
use crate::models::{
    AnnotationParameters,
    Modification,
    ModificationCatalog,
    Peptide,
    SpectrumKey,
    SpectrumMatch,
};
use indicatif::{
    ParallelProgressIterator,
    ProgressBar,
    ProgressIterator,
    ProgressStyle,
};
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::time::Instant;
use tracing::{
    debug,
    info,
    warn,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Quantile used for the single representative value of a cell.
    pub quantile: f64,
    pub histogram_bins: usize,
    /// Annotate spectra on the rayon pool.
    pub parallel: bool,
    pub show_progress: bool,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            quantile: 0.75,
            histogram_bins: 10,
            parallel: true,
            show_progress: false,
        }
    }
}

impl EvidenceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.quantile) {
            return Err(ConfigError::InvalidQuantile(self.quantile));
        }
        Ok(())
    }
}

/// Normalized evidence of a single spectrum.
struct SpectrumContribution {
    cells: Vec<f64>,
}

/// Builds [`SiteEvidence`] from the spectra supporting a peptide.
pub struct EvidenceAggregator<'a> {
    annotator: &'a dyn SpectrumAnnotator,
    catalog: &'a ModificationCatalog,
    parameters: &'a AnnotationParameters,
    config: EvidenceConfig,
}

impl<'a> EvidenceAggregator<'a> {
    pub fn new(
        annotator: &'a dyn SpectrumAnnotator,
        catalog: &'a ModificationCatalog,
        parameters: &'a AnnotationParameters,
        config: EvidenceConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            annotator,
            catalog,
            parameters,
            config,
        })
    }

    pub fn config(&self) -> &EvidenceConfig {
        &self.config
    }

    /// Aggregates the evidence for `modification` on `peptide`, considering
    /// `0..=n_ptm` modification copies per fragment.
    ///
    /// Spectra that cannot be annotated are skipped and listed in
    /// [`SiteEvidence::skipped`]. The only error is an unknown modification.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    pub fn aggregate(
        &self,
        peptide: &Peptide,
        modification: &str,
        n_ptm: usize,
        spectra: &[&SpectrumMatch],
    ) -> Result<SiteEvidence, ConfigError> {
        let modification = self.catalog.require(modification)?;
        if n_ptm > peptide.len() {
            return Err(ConfigError::InvalidModificationCount {
                n_ptm,
                sequence_length: peptide.len(),
            });
        }
        let st = Instant::now();
        let mut evidence = SiteEvidence::new(peptide.len(), n_ptm);
        let layout = evidence.layout();

        let bar = if self.config.show_progress {
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar());
            ProgressBar::new(spectra.len() as u64).with_style(style)
        } else {
            ProgressBar::hidden()
        };

        let contributions: Vec<(SpectrumKey, Result<SpectrumContribution, EvidenceError>)> =
            if self.config.parallel {
                spectra
                    .par_iter()
                    .progress_with(bar)
                    .map(|s| (s.key.clone(), self.contribution(layout, &modification, s)))
                    .collect()
            } else {
                spectra
                    .iter()
                    .progress_with(bar)
                    .map(|s| (s.key.clone(), self.contribution(layout, &modification, s)))
                    .collect()
            };

        for (key, contribution) in contributions {
            match contribution {
                Ok(x) => evidence.add_spectrum(&x.cells, &self.parameters.ion_types),
                Err(e) => {
                    warn!("Skipping spectrum {}: {}", key, e);
                    evidence.add_skipped(key, e);
                }
            }
        }

        let evidence = evidence.finalize();
        info!(
            "Aggregated {} spectra ({} skipped) for {} on {} in {:?}",
            evidence.n_spectra(),
            evidence.skipped_count(),
            modification.name,
            peptide,
            st.elapsed()
        );
        Ok(evidence)
    }

    fn contribution(
        &self,
        layout: CellLayout,
        modification: &Modification,
        spectrum: &SpectrumMatch,
    ) -> Result<SpectrumContribution, EvidenceError> {
        let assumption = &spectrum.best_assumption;
        if assumption.len() != layout.sequence_length {
            return Err(EvidenceError::SequenceLengthMismatch {
                spectrum: spectrum.key.clone(),
                expected: layout.sequence_length,
                found: assumption.len(),
            });
        }

        let matches = self.annotator.annotate(
            spectrum,
            assumption,
            modification,
            layout.n_ptm,
            self.parameters,
        )?;

        let mut cells = vec![0.0; layout.num_cells()];
        for m in matches {
            if !m.intensity.is_finite() {
                return Err(EvidenceError::NonFiniteIntensity {
                    spectrum: spectrum.key.clone(),
                    ion: format!("{}{}", m.ion, m.ordinal),
                });
            }
            if !self.parameters.ion_types.contains(&m.ion) {
                continue;
            }
            let idx = m
                .ion
                .position(m.ordinal, layout.sequence_length)
                .and_then(|pos| layout.index(m.modification_count, m.ion, pos));
            match idx {
                // Several charge states of one ion add up.
                Some(idx) => cells[idx] += m.intensity.max(0.0),
                None => debug!(
                    "Ignoring {}{} (k={}) outside of {} in spectrum {}",
                    m.ion, m.ordinal, m.modification_count, assumption, spectrum.key
                ),
            }
        }

        let max = cells.iter().copied().fold(0.0, f64::max);
        if max > 0.0 {
            cells.iter_mut().for_each(|x| *x /= max);
        }
        Ok(SpectrumContribution { cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{
        IonMatch,
        IonType,
        PrecomputedAnnotator,
    };
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn spectrum(key: &str, peptide: &str) -> SpectrumMatch {
        SpectrumMatch {
            key: key.into(),
            best_assumption: Arc::new(peptide.parse().unwrap()),
            localization_scores: BTreeMap::new(),
            ptm_scores: BTreeMap::new(),
        }
    }

    fn ion(ion: IonType, ordinal: usize, k: usize, intensity: f64) -> IonMatch {
        IonMatch {
            ion,
            ordinal,
            modification_count: k,
            intensity,
        }
    }

    #[test]
    fn test_normalizes_per_spectrum() {
        let catalog = ModificationCatalog::common();
        let params = AnnotationParameters::default();
        let mut annotator = PrecomputedAnnotator::new();
        annotator.insert(
            "loud".into(),
            vec![ion(IonType::B, 2, 0, 1e6), ion(IonType::B, 3, 1, 5e5)],
        );
        annotator.insert(
            "quiet".into(),
            vec![ion(IonType::B, 2, 0, 10.0), ion(IonType::B, 3, 1, 10.0)],
        );
        let loud = spectrum("loud", "ACDES[Phospho]TVK");
        let quiet = spectrum("quiet", "ACDES[Phospho]TVK");

        let config = EvidenceConfig {
            parallel: false,
            ..Default::default()
        };
        let aggregator = EvidenceAggregator::new(&annotator, &catalog, &params, config).unwrap();
        let evidence = aggregator
            .aggregate(&loud.best_assumption, "Phospho", 1, &[&loud, &quiet])
            .unwrap();
        assert_eq!(evidence.n_spectra(), 2);
        assert_eq!(evidence.quantile(0, IonType::B, 2, 0.0), 1.0);
        assert_eq!(evidence.quantile(1, IonType::B, 3, 0.0), 0.5);
        assert_eq!(evidence.quantile(1, IonType::B, 3, 1.0), 1.0);
        // Ion types outside of the parameters collect nothing.
        assert_eq!(evidence.observation_count(1, IonType::C, 3), 0);
        assert_eq!(evidence.observation_count(1, IonType::Y, 3), 2);
    }

    #[test]
    fn test_skips_unannotated_spectra() {
        let catalog = ModificationCatalog::common();
        let params = AnnotationParameters::default();
        let mut annotator = PrecomputedAnnotator::new();
        annotator.insert("ok".into(), vec![ion(IonType::Y, 5, 1, 3.0)]);
        annotator.insert("nan".into(), vec![ion(IonType::Y, 5, 1, f64::NAN)]);
        let ok = spectrum("ok", "ACDES[Phospho]TVK");
        let missing = spectrum("missing", "ACDES[Phospho]TVK");
        let nan = spectrum("nan", "ACDES[Phospho]TVK");
        let short = spectrum("short", "PEPS[Phospho]K");

        let aggregator =
            EvidenceAggregator::new(&annotator, &catalog, &params, EvidenceConfig::default())
                .unwrap();
        let evidence = aggregator
            .aggregate(&ok.best_assumption, "Phospho", 1, &[&ok, &missing, &nan, &short])
            .unwrap();
        assert_eq!(evidence.n_spectra(), 1);
        assert_eq!(evidence.skipped_count(), 3);
        assert_eq!(evidence.quantile(1, IonType::Y, 3, 0.75), 1.0);
        let skipped: Vec<_> = evidence.skipped().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(skipped, vec!["missing", "nan", "short"]);
    }

    #[test]
    fn test_unknown_modification_and_bad_config() {
        let catalog = ModificationCatalog::common();
        let params = AnnotationParameters::default();
        let annotator = PrecomputedAnnotator::new();
        let aggregator =
            EvidenceAggregator::new(&annotator, &catalog, &params, EvidenceConfig::default())
                .unwrap();
        let peptide: Peptide = "PEPTIDE".parse().unwrap();
        assert!(aggregator.aggregate(&peptide, "Nope", 1, &[]).is_err());
        let empty = aggregator.aggregate(&peptide, "Phospho", 0, &[]).unwrap();
        assert_eq!(empty.n_spectra(), 0);

        let bad = EvidenceConfig {
            quantile: 1.5,
            ..Default::default()
        };
        assert!(EvidenceAggregator::new(&annotator, &catalog, &params, bad).is_err());
    }

    #[test]
    fn test_modification_count_bounded_by_length() {
        let catalog = ModificationCatalog::common();
        let params = AnnotationParameters::default();
        let annotator = PrecomputedAnnotator::new();
        let aggregator =
            EvidenceAggregator::new(&annotator, &catalog, &params, EvidenceConfig::default())
                .unwrap();
        let peptide: Peptide = "PEPTIDE".parse().unwrap();
        assert_eq!(
            aggregator.aggregate(&peptide, "Phospho", 100, &[]).unwrap_err(),
            ConfigError::InvalidModificationCount {
                n_ptm: 100,
                sequence_length: 7,
            }
        );
        let full = aggregator.aggregate(&peptide, "Phospho", 7, &[]).unwrap();
        assert_eq!(full.n_ptm(), 7);
    }
}
