use crate::confidence::ConfidenceLevel;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::{
    BTreeMap,
    BTreeSet,
};

/// Site assignment of one modification on one match (PSM or peptide).
///
/// A position is never both a main and a secondary site, every mutator keeps
/// it that way and deserialization rejects records that break it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PtmScoringRepr", into = "PtmScoringRepr")]
pub struct PtmScoring {
    main_sites: BTreeSet<usize>,
    secondary_sites: BTreeSet<usize>,
    site_confidence: BTreeMap<usize, ConfidenceLevel>,
    pub confidence: ConfidenceLevel,
}

impl PtmScoring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record, positions present in both sets are kept as main sites.
    pub fn with_sites(
        main_sites: impl IntoIterator<Item = usize>,
        secondary_sites: impl IntoIterator<Item = usize>,
        confidence: ConfidenceLevel,
    ) -> Self {
        let main_sites: BTreeSet<usize> = main_sites.into_iter().collect();
        let secondary_sites = secondary_sites
            .into_iter()
            .filter(|x| !main_sites.contains(x))
            .collect();
        Self {
            main_sites,
            secondary_sites,
            site_confidence: BTreeMap::new(),
            confidence,
        }
    }

    pub fn main_sites(&self) -> &BTreeSet<usize> {
        &self.main_sites
    }

    pub fn secondary_sites(&self) -> &BTreeSet<usize> {
        &self.secondary_sites
    }

    pub fn is_main(&self, position: usize) -> bool {
        self.main_sites.contains(&position)
    }

    pub fn is_secondary(&self, position: usize) -> bool {
        self.secondary_sites.contains(&position)
    }

    /// Adds a main site, demoting it from the secondary sites if needed.
    /// Returns whether the record changed.
    pub fn add_main_site(&mut self, position: usize) -> bool {
        let demoted = self.secondary_sites.remove(&position);
        self.main_sites.insert(position) || demoted
    }

    pub fn remove_main_site(&mut self, position: usize) -> bool {
        self.site_confidence.remove(&position);
        self.main_sites.remove(&position)
    }

    /// Adds a secondary site, removing it from the main sites if needed.
    /// Returns whether the record changed.
    pub fn add_secondary_site(&mut self, position: usize) -> bool {
        let removed = self.remove_main_site(position);
        self.secondary_sites.insert(position) || removed
    }

    pub fn remove_secondary_site(&mut self, position: usize) -> bool {
        self.secondary_sites.remove(&position)
    }

    pub fn set_site_confidence(&mut self, position: usize, level: ConfidenceLevel) {
        self.site_confidence.insert(position, level);
    }

    /// Confidence of a single site.
    ///
    /// Main sites without an explicit level inherit the overall confidence,
    /// any other position is [`ConfidenceLevel::NotFound`].
    pub fn site_confidence(&self, position: usize) -> ConfidenceLevel {
        match self.site_confidence.get(&position) {
            Some(x) => *x,
            None if self.is_main(position) => self.confidence,
            None => ConfidenceLevel::NotFound,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.main_sites.is_disjoint(&self.secondary_sites)
    }
}

#[derive(Serialize, Deserialize)]
struct PtmScoringRepr {
    #[serde(default)]
    main_sites: BTreeSet<usize>,
    #[serde(default)]
    secondary_sites: BTreeSet<usize>,
    #[serde(default)]
    site_confidence: BTreeMap<usize, ConfidenceLevel>,
    #[serde(default)]
    confidence: ConfidenceLevel,
}

impl TryFrom<PtmScoringRepr> for PtmScoring {
    type Error = String;

    fn try_from(x: PtmScoringRepr) -> Result<Self, Self::Error> {
        let out = PtmScoring {
            main_sites: x.main_sites,
            secondary_sites: x.secondary_sites,
            site_confidence: x.site_confidence,
            confidence: x.confidence,
        };
        if !out.is_consistent() {
            let both: Vec<_> = out
                .main_sites
                .intersection(&out.secondary_sites)
                .collect();
            return Err(format!(
                "Sites {:?} are both main and secondary sites",
                both
            ));
        }
        Ok(out)
    }
}

impl From<PtmScoring> for PtmScoringRepr {
    fn from(x: PtmScoring) -> Self {
        PtmScoringRepr {
            main_sites: x.main_sites,
            secondary_sites: x.secondary_sites,
            site_confidence: x.site_confidence,
            confidence: x.confidence,
        }
    }
}
