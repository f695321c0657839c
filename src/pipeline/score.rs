//! Probability scoring and priority tiers.
use std::fmt;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use super::reconcile::FeatureMatrix;
use crate::model::{ConversionModel, ModelError};

/// Probabilities below this are [`Tier::Low`].
pub const MEDIUM_TIER_FLOOR: f64 = 0.40;
/// Probabilities at or above this are [`Tier::High`].
pub const HIGH_TIER_FLOOR: f64 = 0.55;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Tier {
    #[serde(rename = "Alto")]
    High,
    #[serde(rename = "Medio")]
    Medium,
    #[serde(rename = "Bajo")]
    Low,
}

impl Tier {
    /// Export order.
    pub const ALL: [Tier; 3] = [Self::High, Self::Medium, Self::Low];

    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability < MEDIUM_TIER_FLOOR {
            Self::Low
        } else if probability < HIGH_TIER_FLOOR {
            Self::Medium
        } else {
            Self::High
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "Alto",
            Self::Medium => "Medio",
            Self::Low => "Bajo",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub row_index: usize,
    pub probability: f64,
    pub tier: Tier,
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("model failed on record {row_index}: {source}")]
    Model {
        row_index: usize,
        #[source]
        source: ModelError,
    },
    #[error("model returned {probability} for record {row_index}, outside [0, 1]")]
    OutOfRange { row_index: usize, probability: f64 },
}

/// Scores every matrix row. Any failure aborts the whole batch.
///
/// # Errors
/// Returns the [`ScoringError`] of the first failing row.
pub fn score_matrix(
    model: &dyn ConversionModel,
    matrix: &FeatureMatrix,
) -> Result<Vec<Score>, ScoringError> {
    matrix
        .rows()
        .par_iter()
        .zip(matrix.row_ids().par_iter())
        .map(|(row, &row_index)| {
            let probability = model
                .predict_probability(row)
                .map_err(|source| ScoringError::Model { row_index, source })?;
            if !(0.0..=1.0).contains(&probability) {
                return Err(ScoringError::OutOfRange {
                    row_index,
                    probability,
                });
            }
            Ok(Score {
                row_index,
                probability,
                tier: Tier::from_probability(probability),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierCounts {
    #[must_use]
    pub fn from_tiers(tiers: impl IntoIterator<Item = Tier>) -> Self {
        let mut counts = Self::default();
        for tier in tiers {
            match tier {
                Tier::High => counts.high += 1,
                Tier::Medium => counts.medium += 1,
                Tier::Low => counts.low += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn get(&self, tier: Tier) -> usize {
        match tier {
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, Tier::Low)]
    #[case(0.399_999, Tier::Low)]
    #[case(0.40, Tier::Medium)]
    #[case(0.549_999, Tier::Medium)]
    #[case(0.55, Tier::High)]
    #[case(1.0, Tier::High)]
    fn tier_boundaries(#[case] probability: f64, #[case] expected: Tier) {
        assert_eq!(Tier::from_probability(probability), expected);
    }

    #[test]
    fn tiers_are_monotonic() {
        let mut previous = Tier::from_probability(0.0);
        for step in 0..=1000 {
            let tier = Tier::from_probability(f64::from(step) / 1000.0);
            assert!(tier <= previous, "tier went down at step {step}");
            previous = tier;
        }
    }

    #[test]
    fn labels_are_spanish() {
        assert_eq!(Tier::Low.to_string(), "Bajo");
        assert_eq!(
            serde_json::to_string(&Tier::High).expect("serializes"),
            "\"Alto\""
        );
    }

    #[test]
    fn counts_by_tier() {
        let counts = TierCounts::from_tiers([Tier::High, Tier::Low, Tier::Low]);
        assert_eq!(counts.get(Tier::Low), 2);
        assert_eq!(counts.total(), 3);
    }
}
