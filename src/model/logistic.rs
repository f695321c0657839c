//! Frozen logistic conversion model.
use std::fmt::Debug;

use serde::Deserialize;
use thiserror::Error;

use super::contract::fingerprint_columns;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("feature row has {actual} values but the model expects {expected}")]
    WidthMismatch { expected: usize, actual: usize },
    #[error("model produced a non-finite probability")]
    NonFinite,
}

/// Scoring capability of a fitted model. Implementations are pure: the same
/// row always yields the same probability.
pub trait ConversionModel: Send + Sync + Debug {
    /// Probability of conversion in `[0, 1]` for one reconciled feature row.
    ///
    /// # Errors
    /// Returns [`ModelError`] when the row cannot be scored.
    fn predict_probability(&self, row: &[f64]) -> Result<f64, ModelError>;

    fn input_width(&self) -> usize;

    fn training_run(&self) -> Option<&str>;

    /// Fingerprint of the column list the model was fitted on, when the
    /// artifact records it.
    fn column_fingerprint(&self) -> Option<u64>;
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LogisticWeights {
    #[serde(default)]
    pub(crate) training_run: Option<String>,
    #[serde(default)]
    pub(crate) columns: Option<Vec<String>>,
    pub(crate) intercept: f64,
    pub(crate) coefficients: Vec<f64>,
}

impl LogisticWeights {
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.coefficients.is_empty(), "model has no coefficients");
        anyhow::ensure!(self.intercept.is_finite(), "intercept is not finite");
        anyhow::ensure!(
            self.coefficients.iter().all(|weight| weight.is_finite()),
            "coefficients must be finite"
        );
        if let Some(columns) = &self.columns {
            anyhow::ensure!(
                columns.len() == self.coefficients.len(),
                "model lists {} columns for {} coefficients",
                columns.len(),
                self.coefficients.len()
            );
        }
        Ok(())
    }
}

/// `sigmoid(intercept + coefficients · row)`.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    training_run: Option<String>,
    fingerprint: Option<u64>,
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LogisticModel {
    #[must_use]
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            training_run: None,
            fingerprint: None,
            intercept,
            coefficients,
        }
    }

    #[must_use]
    pub fn with_training_run(mut self, run: impl Into<String>) -> Self {
        self.training_run = Some(run.into());
        self
    }

    #[must_use]
    pub fn with_columns(mut self, columns: &[String]) -> Self {
        self.fingerprint = Some(fingerprint_columns(columns));
        self
    }

    pub(crate) fn from_weights(weights: LogisticWeights) -> Self {
        let fingerprint = weights.columns.as_deref().map(fingerprint_columns);
        Self {
            training_run: weights.training_run,
            fingerprint,
            intercept: weights.intercept,
            coefficients: weights.coefficients,
        }
    }
}

impl ConversionModel for LogisticModel {
    fn predict_probability(&self, row: &[f64]) -> Result<f64, ModelError> {
        if row.len() != self.coefficients.len() {
            return Err(ModelError::WidthMismatch {
                expected: self.coefficients.len(),
                actual: row.len(),
            });
        }
        let logit = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(weight, value)| weight * value)
                .sum::<f64>();
        let probability = 1.0 / (1.0 + (-logit).exp());
        if probability.is_finite() {
            Ok(probability)
        } else {
            Err(ModelError::NonFinite)
        }
    }

    fn input_width(&self) -> usize {
        self.coefficients.len()
    }

    fn training_run(&self) -> Option<&str> {
        self.training_run.as_deref()
    }

    fn column_fingerprint(&self) -> Option<u64> {
        self.fingerprint
    }
}
