use super::{
    IonType,
    NUM_ION_TYPES,
};
use crate::errors::EvidenceError;
use crate::models::SpectrumKey;
use serde::Serialize;

/// Per (modification count, ion type, position) layout of a flat buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(super) struct CellLayout {
    pub(super) sequence_length: usize,
    pub(super) n_ptm: usize,
}

impl CellLayout {
    pub(super) fn num_cells(&self) -> usize {
        (self.n_ptm + 1) * NUM_ION_TYPES * (self.sequence_length + 1)
    }

    pub(super) fn index(&self, k: usize, ion: IonType, position: usize) -> Option<usize> {
        if k > self.n_ptm || position > self.sequence_length {
            return None;
        }
        Some((k * NUM_ION_TYPES + ion.index()) * (self.sequence_length + 1) + position)
    }

    /// Positions that a backbone fragment can break after.
    pub(super) fn positions(&self) -> std::ops::Range<usize> {
        1..self.sequence_length.max(1)
    }
}

/// Aggregated fragment ion evidence for one peptide and modification.
///
/// Holds, per (modification count `k`, ion type, position), the multiset of
/// normalized intensities observed over all the annotated spectra (zeros for
/// unmatched ions included). It is a transient view, rebuilt for every
/// localization pass and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SiteEvidence {
    layout: CellLayout,
    // Sorted ascending once aggregation is done.
    observations: Vec<Vec<f64>>,
    n_spectra: usize,
    #[serde(skip)]
    skipped: Vec<(SpectrumKey, EvidenceError)>,
}

impl SiteEvidence {
    pub(super) fn new(sequence_length: usize, n_ptm: usize) -> Self {
        let layout = CellLayout {
            sequence_length,
            n_ptm,
        };
        Self {
            layout,
            observations: vec![Vec::new(); layout.num_cells()],
            n_spectra: 0,
            skipped: Vec::new(),
        }
    }

    pub(super) fn layout(&self) -> CellLayout {
        self.layout
    }

    /// Merges the normalized cells of one spectrum, for the given ion types.
    pub(super) fn add_spectrum(&mut self, cells: &[f64], ion_types: &[IonType]) {
        debug_assert_eq!(cells.len(), self.observations.len());
        for k in 0..=self.layout.n_ptm {
            for ion in ion_types {
                for position in self.layout.positions() {
                    if let Some(idx) = self.layout.index(k, *ion, position) {
                        self.observations[idx].push(cells[idx]);
                    }
                }
            }
        }
        self.n_spectra += 1;
    }

    pub(super) fn add_skipped(&mut self, spectrum: SpectrumKey, error: EvidenceError) {
        self.skipped.push((spectrum, error));
    }

    pub(super) fn finalize(mut self) -> Self {
        for obs in self.observations.iter_mut() {
            obs.sort_unstable_by(|a, b| a.total_cmp(b));
        }
        self
    }

    fn cell(&self, k: usize, ion: IonType, position: usize) -> &[f64] {
        match self.layout.index(k, ion, position) {
            Some(idx) => &self.observations[idx],
            None => &[],
        }
    }

    pub fn sequence_length(&self) -> usize {
        self.layout.sequence_length
    }

    /// Positions a fragment can break after, `1..sequence_length`.
    pub fn positions(&self) -> std::ops::Range<usize> {
        self.layout.positions()
    }

    pub fn n_ptm(&self) -> usize {
        self.layout.n_ptm
    }

    /// Number of spectra that contributed.
    pub fn n_spectra(&self) -> usize {
        self.n_spectra
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Spectra that could not be annotated and why.
    pub fn skipped(&self) -> &[(SpectrumKey, EvidenceError)] {
        &self.skipped
    }

    pub fn observation_count(&self, k: usize, ion: IonType, position: usize) -> usize {
        self.cell(k, ion, position).len()
    }

    pub fn nonzero_count(&self, k: usize, ion: IonType, position: usize) -> usize {
        self.cell(k, ion, position)
            .iter()
            .filter(|x| **x > 0.0)
            .count()
    }

    /// Quantile `q` of the observed intensities, linearly interpolated.
    ///
    /// `q` is clamped to `[0, 1]` (NaN reads as 0). A cell without
    /// observations reads as 0.
    pub fn quantile(&self, k: usize, ion: IonType, position: usize, q: f64) -> f64 {
        let obs = self.cell(k, ion, position);
        if obs.is_empty() {
            return 0.0;
        }
        let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
        let h = q * (obs.len() - 1) as f64;
        let lo = h.floor() as usize;
        let hi = h.ceil() as usize;
        obs[lo] + (h - lo as f64) * (obs[hi] - obs[lo])
    }

    /// Histogram of the non-zero intensities over `n_bins` equal bins on `(0, 1]`.
    ///
    /// Bin counts always sum to [`SiteEvidence::nonzero_count`].
    pub fn histogram(&self, k: usize, ion: IonType, position: usize, n_bins: usize) -> Vec<usize> {
        let mut bins = vec![0; n_bins];
        if n_bins == 0 {
            return bins;
        }
        for v in self.cell(k, ion, position).iter().filter(|x| **x > 0.0) {
            let bin = ((v * n_bins as f64) as usize).min(n_bins - 1);
            bins[bin] += 1;
        }
        bins
    }

    /// Mean normalized intensity, the area under the evidence curve of a cell.
    pub fn normalized_area(&self, k: usize, ion: IonType, position: usize) -> f64 {
        let obs = self.cell(k, ion, position);
        if obs.is_empty() {
            return 0.0;
        }
        obs.iter().sum::<f64>() / obs.len() as f64
    }

    /// Quantile `q` for every position a fragment can break after, in order.
    pub fn quantile_row(&self, k: usize, ion: IonType, q: f64) -> Vec<f64> {
        self.positions()
            .map(|pos| self.quantile(k, ion, pos, q))
            .collect()
    }

    /// Position with the highest non-zero quantile for `k` over the given ion
    /// types, first position wins ties.
    pub fn dominant_position(
        &self,
        k: usize,
        ion_types: &[IonType],
        q: f64,
    ) -> Option<(usize, IonType, f64)> {
        let mut best: Option<(usize, IonType, f64)> = None;
        for position in self.positions() {
            for ion in ion_types {
                let value = self.quantile(k, *ion, position, q);
                if value <= 0.0 {
                    continue;
                }
                if best.map_or(true, |(_, _, b)| value > b) {
                    best = Some((position, *ion, value));
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence_with(values: &[f64]) -> SiteEvidence {
        let mut evidence = SiteEvidence::new(8, 1);
        let layout = evidence.layout();
        for v in values {
            let mut cells = vec![0.0; layout.num_cells()];
            cells[layout.index(1, IonType::B, 3).unwrap()] = *v;
            evidence.add_spectrum(&cells, &[IonType::B, IonType::Y]);
        }
        evidence.finalize()
    }

    #[test]
    fn test_empty_cell_reads_as_zero() {
        let evidence = SiteEvidence::new(8, 1).finalize();
        assert_eq!(evidence.quantile(1, IonType::B, 3, 0.75), 0.0);
        assert_eq!(evidence.histogram(1, IonType::B, 3, 4), vec![0; 4]);
        assert_eq!(evidence.normalized_area(1, IonType::B, 3), 0.0);
        // Out of range lookups are not errors either.
        assert_eq!(evidence.quantile(5, IonType::B, 3, 0.75), 0.0);
        assert_eq!(evidence.quantile(1, IonType::B, 42, 0.75), 0.0);
        assert!(evidence.histogram(1, IonType::B, 3, 0).is_empty());
    }

    #[test]
    fn test_quantile_interpolates() {
        let evidence = evidence_with(&[0.0, 0.5, 1.0, 0.25]);
        assert_eq!(evidence.quantile(1, IonType::B, 3, 0.0), 0.0);
        assert_eq!(evidence.quantile(1, IonType::B, 3, 1.0), 1.0);
        // sorted: 0, .25, .5, 1 -> h = 1.5
        assert!((evidence.quantile(1, IonType::B, 3, 0.5) - 0.375).abs() < 1e-12);
        assert_eq!(evidence.quantile(1, IonType::B, 3, f64::NAN), 0.0);
        assert_eq!(evidence.quantile(1, IonType::B, 3, 7.0), 1.0);
    }

    #[test]
    fn test_quantile_is_monotonic_in_q() {
        let evidence = evidence_with(&[0.1, 0.9, 0.3, 0.0, 0.7, 0.7, 0.2]);
        let mut last = f64::NEG_INFINITY;
        for i in 0..=100 {
            let q = i as f64 / 100.0;
            let value = evidence.quantile(1, IonType::B, 3, q);
            assert!(value >= last, "q={} gave {} after {}", q, value, last);
            last = value;
        }
    }

    #[test]
    fn test_histogram_conserves_mass() {
        let values = [0.0, 0.05, 0.5, 1.0, 0.999, 0.0, 0.3];
        let evidence = evidence_with(&values);
        for n_bins in [1, 3, 10, 50] {
            let hist = evidence.histogram(1, IonType::B, 3, n_bins);
            assert_eq!(hist.iter().sum::<usize>(), 5);
            assert_eq!(hist.iter().sum::<usize>(), evidence.nonzero_count(1, IonType::B, 3));
        }
        assert_eq!(evidence.histogram(1, IonType::B, 3, 2), vec![2, 3]);
        assert_eq!(evidence.observation_count(1, IonType::B, 3), values.len());
    }

    #[test]
    fn test_dominant_position() {
        let evidence = evidence_with(&[1.0]);
        assert_eq!(
            evidence.dominant_position(1, &[IonType::B, IonType::Y], 0.75),
            Some((3, IonType::B, 1.0))
        );
        assert_eq!(evidence.dominant_position(0, &[IonType::B], 0.75), None);
        assert_eq!(evidence.quantile_row(1, IonType::B, 0.75)[2], 1.0);
    }

    #[test]
    fn test_quantile_row_stops_before_last_residue() {
        let evidence = evidence_with(&[1.0]);
        assert_eq!(evidence.positions(), 1..8);
        let row = evidence.quantile_row(1, IonType::B, 0.75);
        assert_eq!(row.len(), 7);
        assert_eq!(row.len(), evidence.positions().len());
        assert!(SiteEvidence::new(1, 0).finalize().quantile_row(0, IonType::Y, 0.5).is_empty());
    }
}
