use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;

/// Assignment state of one position for one modification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteSelection {
    #[default]
    Absent,
    Secondary,
    Main,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedResidue {
    pub position: usize,
    pub residue: char,
    /// Modifications assigned to this position, absent ones are left out.
    pub sites: Vec<(String, SiteSelection)>,
}

/// Display view of a peptide with its main and secondary sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedSequence {
    pub residues: Vec<AnnotatedResidue>,
}

impl AnnotatedSequence {
    pub fn selection(&self, position: usize, modification: &str) -> SiteSelection {
        if position == 0 {
            return SiteSelection::Absent;
        }
        self.residues
            .get(position - 1)
            .and_then(|r| r.sites.iter().find(|(name, _)| name == modification))
            .map(|(_, s)| *s)
            .unwrap_or_default()
    }
}

impl Display for AnnotatedSequence {
    /// Main sites as `[name]`, secondary sites as `{name}`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for residue in &self.residues {
            write!(f, "{}", residue.residue)?;
            for (name, selection) in &residue.sites {
                match selection {
                    SiteSelection::Main => write!(f, "[{}]", name)?,
                    SiteSelection::Secondary => write!(f, "{{{}}}", name)?,
                    SiteSelection::Absent => {}
                }
            }
        }
        Ok(())
    }
}
