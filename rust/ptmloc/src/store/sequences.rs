use serde::{
    Deserialize,
    Serialize,
};
use std::collections::{
    BTreeMap,
    BTreeSet,
};

/// Resolves protein sequences and peptide to protein membership.
pub trait SequenceProvider: Send + Sync {
    fn protein_sequence(&self, accession: &str) -> Option<&str>;

    /// Accessions of every protein that contains the peptide sequence.
    fn parent_proteins(&self, peptide_sequence: &str) -> BTreeSet<String>;

    /// 0-based start offsets of the peptide in a protein (overlaps included).
    fn peptide_starts(&self, accession: &str, peptide_sequence: &str) -> Option<Vec<usize>> {
        let protein = self.protein_sequence(accession)?;
        if peptide_sequence.is_empty() {
            return Some(Vec::new());
        }
        let starts = (0..protein.len())
            .filter(|&i| protein.as_bytes()[i..].starts_with(peptide_sequence.as_bytes()))
            .collect();
        Some(starts)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemorySequences {
    proteins: BTreeMap<String, String>,
}

impl InMemorySequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, accession: impl Into<String>, sequence: impl Into<String>) {
        self.proteins.insert(accession.into(), sequence.into());
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }
}

impl FromIterator<(String, String)> for InMemorySequences {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            proteins: iter.into_iter().collect(),
        }
    }
}

impl SequenceProvider for InMemorySequences {
    fn protein_sequence(&self, accession: &str) -> Option<&str> {
        self.proteins.get(accession).map(|x| x.as_str())
    }

    fn parent_proteins(&self, peptide_sequence: &str) -> BTreeSet<String> {
        if peptide_sequence.is_empty() {
            return BTreeSet::new();
        }
        self.proteins
            .iter()
            .filter(|(_, seq)| seq.contains(peptide_sequence))
            .map(|(acc, _)| acc.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_proteins_and_starts() {
        let mut seqs = InMemorySequences::new();
        seqs.insert("P1", "MKACDESTVKLLACDESTVK");
        seqs.insert("P2", "GGACDESTVKGG");
        seqs.insert("P3", "PEPTIDEPINK");

        let parents = seqs.parent_proteins("ACDESTVK");
        assert_eq!(
            parents,
            BTreeSet::from(["P1".to_string(), "P2".to_string()])
        );
        assert_eq!(seqs.peptide_starts("P1", "ACDESTVK"), Some(vec![2, 12]));
        assert_eq!(seqs.peptide_starts("P3", "ACDESTVK"), Some(vec![]));
        assert_eq!(seqs.peptide_starts("P9", "ACDESTVK"), None);
        assert!(seqs.parent_proteins("").is_empty());
    }
}
