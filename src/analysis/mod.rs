//! Advisory diagnostics: population distributions, drift and score summaries.
//! Nothing here fails a run; empty populations report insufficient data.
use serde::Serialize;

use crate::error::RunError;

pub mod distribution;
pub mod drift;
pub mod scores;

pub use distribution::{ConversionRate, DistributionSnapshot, LabelOverlap, ShareEntry, ShareGap};
pub use drift::{DriftPolicy, DriftReport, DriftVerdict, RecentWindowComparison};
pub use scores::ScoreSummary;

/// A diagnostic value, or the reason it could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Diagnostic<T> {
    Ready(T),
    InsufficientData { population: String, reason: String },
}

impl<T> Diagnostic<T> {
    pub(crate) fn insufficient(population: &str, reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            population: population.to_string(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::InsufficientData { .. } => None,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Pretty JSON rendering of a report for stdout.
///
/// # Errors
/// Returns [`RunError::Report`] if serialization fails.
pub fn render_json<T: Serialize>(report: &T) -> Result<String, RunError> {
    Ok(serde_json::to_string_pretty(report)?)
}
