use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;

/// Discrete localization confidence.
///
/// The declaration order is the ordering: `NotFound < Random < Doubtful <
/// Confident < VeryConfident`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    #[default]
    NotFound,
    Random,
    Doubtful,
    Confident,
    VeryConfident,
}

impl ConfidenceLevel {
    pub const ALL: [ConfidenceLevel; 5] = [
        ConfidenceLevel::NotFound,
        ConfidenceLevel::Random,
        ConfidenceLevel::Doubtful,
        ConfidenceLevel::Confident,
        ConfidenceLevel::VeryConfident,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::NotFound => "Not Found",
            ConfidenceLevel::Random => "Random",
            ConfidenceLevel::Doubtful => "Doubtful",
            ConfidenceLevel::Confident => "Confident",
            ConfidenceLevel::VeryConfident => "Very Confident",
        }
    }

    /// Whether a site at this level should be reported as localized.
    pub fn is_localized(&self) -> bool {
        *self >= ConfidenceLevel::Confident
    }
}

impl Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
