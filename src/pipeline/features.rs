//! Per-record feature derivation.
use chrono::Datelike;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::{
    store::models::AssignmentRecord,
    taxonomy::{CategoryLabels, Taxonomy, TaxonomySet, vacancies::VACANCY_BUCKET_FEATURE},
};

pub const MANAGEMENT_TYPE_FEATURE: &str = "tipo_de_gestion";

/// Categorical inputs of the model, expanded into indicator columns.
pub const CATEGORICAL_FEATURES: [&str; 7] = [
    MANAGEMENT_TYPE_FEATURE,
    VACANCY_BUCKET_FEATURE,
    "categoria_cargo",
    "categoria_empresa",
    "categoria_requisito",
    "franja_hora_entrevista",
    "categoria_documentacion",
];

/// Numeric inputs of the model, passed through as-is.
pub const NUMERIC_FEATURES: [&str; 4] = [
    "tiene_contacto_empresa",
    "dia_semana",
    "mes",
    "es_fin_semana",
];

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
pub enum FeatureDerivationError {
    #[error("record {row_index} has no usable interview date")]
    MissingInterviewDate { row_index: usize },
}

impl FeatureDerivationError {
    #[must_use]
    pub fn row_index(&self) -> usize {
        match self {
            Self::MissingInterviewDate { row_index } => *row_index,
        }
    }
}

/// Derived features of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub row_index: usize,
    pub labels: CategoryLabels,
    pub management_type: Option<String>,
    pub has_company_contact: u8,
    /// Monday is 0.
    pub weekday: u32,
    pub month: u32,
    pub is_weekend: u8,
}

impl FeatureRow {
    /// `(feature, value)` pairs in [`CATEGORICAL_FEATURES`] order. An absent
    /// management type produces no indicator.
    #[must_use]
    pub fn categorical(&self) -> [(&'static str, Option<&str>); 7] {
        [
            (MANAGEMENT_TYPE_FEATURE, self.management_type.as_deref()),
            (VACANCY_BUCKET_FEATURE, Some(self.labels.vacancy_bucket)),
            (Taxonomy::JobTitle.feature_name(), Some(self.labels.job_title)),
            (Taxonomy::Company.feature_name(), Some(self.labels.company)),
            (Taxonomy::Requirement.feature_name(), Some(self.labels.requirement)),
            (
                Taxonomy::InterviewSlot.feature_name(),
                Some(self.labels.interview_slot),
            ),
            (
                Taxonomy::Documentation.feature_name(),
                Some(self.labels.documentation),
            ),
        ]
    }

    /// `(feature, value)` pairs in [`NUMERIC_FEATURES`] order.
    #[must_use]
    pub fn numeric(&self) -> [(&'static str, f64); 4] {
        [
            (NUMERIC_FEATURES[0], f64::from(self.has_company_contact)),
            (NUMERIC_FEATURES[1], f64::from(self.weekday)),
            (NUMERIC_FEATURES[2], f64::from(self.month)),
            (NUMERIC_FEATURES[3], f64::from(self.is_weekend)),
        ]
    }
}

/// Derives the features of one classified record.
///
/// # Errors
/// Returns [`FeatureDerivationError::MissingInterviewDate`] when the
/// calendar fields cannot be computed.
pub fn derive_features(
    record: &AssignmentRecord,
    labels: CategoryLabels,
) -> Result<FeatureRow, FeatureDerivationError> {
    let date = record
        .interview_date
        .ok_or(FeatureDerivationError::MissingInterviewDate {
            row_index: record.row_index,
        })?;
    let weekday = date.weekday().num_days_from_monday();
    Ok(FeatureRow {
        row_index: record.row_index,
        labels,
        management_type: record.management_type.clone(),
        has_company_contact: u8::from(record.company_contact.is_some()),
        weekday,
        month: date.month(),
        is_weekend: u8::from(weekday >= 5),
    })
}

/// A record ready for reconciliation.
#[derive(Debug, Clone)]
pub struct PreparedRecord {
    pub record: AssignmentRecord,
    pub features: FeatureRow,
}

/// A record excluded from scoring, with its labels for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct WithheldRecord {
    pub row_index: usize,
    pub vacancy_code: Option<String>,
    pub labels: CategoryLabels,
    pub reason: FeatureDerivationError,
}

#[derive(Debug, Default)]
pub struct FeatureTable {
    pub prepared: Vec<PreparedRecord>,
    pub withheld: Vec<WithheldRecord>,
}

/// Classifies and derives features for a batch, row-parallel. Output keeps
/// input order.
#[must_use]
pub fn build_features(taxonomies: &TaxonomySet, records: Vec<AssignmentRecord>) -> FeatureTable {
    let outcomes: Vec<_> = records
        .into_par_iter()
        .map(|record| {
            let labels = taxonomies.classify_record(&record);
            match derive_features(&record, labels) {
                Ok(features) => Ok(PreparedRecord { record, features }),
                Err(reason) => Err(WithheldRecord {
                    row_index: record.row_index,
                    vacancy_code: record.vacancy_code.clone(),
                    labels,
                    reason,
                }),
            }
        })
        .collect();

    let mut table = FeatureTable::default();
    for outcome in outcomes {
        match outcome {
            Ok(prepared) => table.prepared.push(prepared),
            Err(withheld) => table.withheld.push(withheld),
        }
    }
    table
}
