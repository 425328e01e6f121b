use super::ConfidenceLevel;
use crate::errors::ConfigError;
use serde::{
    Deserialize,
    Serialize,
};

/// Score cut-offs of the classifier.
///
/// Scores are localization probabilities expressed in percent, as reported
/// by the modification engine for a single spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Lowest score that is better than a random site pick.
    pub doubtful: f64,
    pub confident: f64,
    pub very_confident: f64,
    /// Number of confident PSMs that promote a peptide site to very confident.
    pub min_confident_psms: usize,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            doubtful: 25.0,
            confident: 95.0,
            very_confident: 99.0,
            min_confident_psms: 2,
        }
    }
}

impl ClassifierThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = self.doubtful.is_finite()
            && self.confident.is_finite()
            && self.very_confident.is_finite();
        let ordered = self.doubtful <= self.confident && self.confident <= self.very_confident;
        if !finite || !ordered || self.min_confident_psms == 0 {
            return Err(ConfigError::InvalidThresholds {
                doubtful: self.doubtful,
                confident: self.confident,
                very_confident: self.very_confident,
            });
        }
        Ok(())
    }
}

/// Maps localization evidence to a [`ConfidenceLevel`].
///
/// Both mappings are total and monotonic: more evidence never yields a lower
/// level. The classifier holds no mutable state and can be shared freely
/// between threads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfidenceClassifier {
    thresholds: ClassifierThresholds,
}

impl ConfidenceClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Result<Self, ConfigError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    /// PSM level classification of one site.
    ///
    /// `None` means no score was reported for the site. A NaN score was
    /// reported but carries no information, so it is no better than random.
    pub fn classify_score(&self, score: Option<f64>) -> ConfidenceLevel {
        let score = match score {
            None => return ConfidenceLevel::NotFound,
            Some(x) if x.is_nan() => return ConfidenceLevel::Random,
            Some(x) => x,
        };
        let t = &self.thresholds;
        if score >= t.very_confident {
            ConfidenceLevel::VeryConfident
        } else if score >= t.confident {
            ConfidenceLevel::Confident
        } else if score >= t.doubtful {
            ConfidenceLevel::Doubtful
        } else {
            ConfidenceLevel::Random
        }
    }

    /// Peptide level classification of one site from the levels its PSMs got.
    ///
    /// The best PSM level wins, and enough confident PSMs agreeing on the site
    /// promote it to very confident. No PSM at all is `NotFound`.
    pub fn classify_levels<I>(&self, levels: I) -> ConfidenceLevel
    where
        I: IntoIterator<Item = ConfidenceLevel>,
    {
        let mut best = ConfidenceLevel::NotFound;
        let mut n_confident = 0;
        for level in levels {
            best = best.max(level);
            if level >= ConfidenceLevel::Confident {
                n_confident += 1;
            }
        }
        if best >= ConfidenceLevel::Confident && n_confident >= self.thresholds.min_confident_psms
        {
            ConfidenceLevel::VeryConfident
        } else {
            best
        }
    }
}
