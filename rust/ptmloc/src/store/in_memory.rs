use super::{
    MatchLookup,
    MatchStore,
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
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Arena of matches addressed by their keys.
///
/// Serializes as a plain snapshot, the set of changed keys is runtime only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryMatchStore {
    #[serde(default)]
    peptide_matches: BTreeMap<PeptideKey, PeptideMatch>,
    #[serde(default)]
    protein_matches: BTreeMap<ProteinKey, ProteinMatch>,
    #[serde(default)]
    spectrum_matches: BTreeMap<SpectrumKey, SpectrumMatch>,
    #[serde(skip)]
    changed: BTreeSet<MatchKey>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let store = Self::from_reader(std::io::BufReader::new(file))?;
        debug!(
            "Loaded store from {} with {} peptide, {} protein and {} spectrum matches",
            path.display(),
            store.peptide_matches.len(),
            store.protein_matches.len(),
            store.spectrum_matches.len()
        );
        Ok(store)
    }

    pub fn insert_peptide_match(&mut self, x: PeptideMatch) {
        self.peptide_matches.insert(x.key.clone(), x);
    }

    pub fn insert_protein_match(&mut self, x: ProteinMatch) {
        self.protein_matches.insert(x.key.clone(), x);
    }

    pub fn insert_spectrum_match(&mut self, x: SpectrumMatch) {
        self.spectrum_matches.insert(x.key.clone(), x);
    }

    pub fn peptide_match_keys(&self) -> impl Iterator<Item = &PeptideKey> {
        self.peptide_matches.keys()
    }

    pub fn is_changed(&self, key: &MatchKey) -> bool {
        self.changed.contains(key)
    }

    pub fn changed(&self) -> &BTreeSet<MatchKey> {
        &self.changed
    }

    /// Returns and clears the set of changed keys.
    pub fn take_changed(&mut self) -> BTreeSet<MatchKey> {
        std::mem::take(&mut self.changed)
    }
}

impl MatchLookup for InMemoryMatchStore {
    fn peptide_match(&self, key: &PeptideKey) -> Option<&PeptideMatch> {
        self.peptide_matches.get(key)
    }

    fn protein_match(&self, key: &ProteinKey) -> Option<&ProteinMatch> {
        self.protein_matches.get(key)
    }

    fn spectrum_match(&self, key: &SpectrumKey) -> Option<&SpectrumMatch> {
        self.spectrum_matches.get(key)
    }

    fn protein_match_keys(&self) -> Box<dyn Iterator<Item = ProteinKey> + '_> {
        Box::new(self.protein_matches.keys().cloned())
    }
}

impl MatchStore for InMemoryMatchStore {
    fn peptide_match_mut(&mut self, key: &PeptideKey) -> Option<&mut PeptideMatch> {
        self.peptide_matches.get_mut(key)
    }

    fn protein_match_mut(&mut self, key: &ProteinKey) -> Option<&mut ProteinMatch> {
        self.protein_matches.get_mut(key)
    }

    fn spectrum_match_mut(&mut self, key: &SpectrumKey) -> Option<&mut SpectrumMatch> {
        self.spectrum_matches.get_mut(key)
    }

    fn mark_changed(&mut self, key: MatchKey) {
        self.changed.insert(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Peptide;
    use std::sync::Arc;

    #[test]
    fn test_snapshot_roundtrip_drops_changed_flags() {
        let mut store = InMemoryMatchStore::new();
        store.insert_peptide_match(PeptideMatch {
            key: "pep1".into(),
            peptide: Arc::new("PEPS[Phospho]TIDE".parse::<Peptide>().unwrap()),
            spectrum_keys: vec!["s1".into()],
            ptm_scores: Default::default(),
        });
        store.mark_changed(MatchKey::Peptide("pep1".into()));

        let json = serde_json::to_string(&store).unwrap();
        let back = InMemoryMatchStore::from_reader(json.as_bytes()).unwrap();
        assert!(back.peptide_match(&"pep1".into()).is_some());
        assert!(back.changed().is_empty());

        assert_eq!(store.take_changed().len(), 1);
        assert!(store.changed().is_empty());
    }

    #[test]
    fn test_dangling_spectrum_keys_are_skipped() {
        let mut store = InMemoryMatchStore::new();
        let peptide = Arc::new(Peptide::unmodified("PEPTIDE"));
        store.insert_spectrum_match(SpectrumMatch {
            key: "s1".into(),
            best_assumption: peptide.clone(),
            localization_scores: Default::default(),
            ptm_scores: Default::default(),
        });
        let pm = PeptideMatch {
            key: "pep1".into(),
            peptide,
            spectrum_keys: vec!["s1".into(), "missing".into()],
            ptm_scores: Default::default(),
        };
        assert_eq!(store.spectrum_matches_of(&pm).len(), 1);
    }
}
