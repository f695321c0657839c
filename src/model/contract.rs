//! Expected-column contract of a fitted model.
//!
//! The contract is the ordered list of feature columns the model was fitted
//! on. Indicator columns are named `{feature}_{value}`; the first value of
//! every categorical feature was dropped at fitting time and is recorded as
//! that feature's reference category, so observing it is not a schema
//! problem.
//!
//! The artifact comes in two shapes:
//!
//! ```json
//! ["tiene_contacto_empresa", "dia_semana", "mes"]
//! ```
//!
//! or, with pairing metadata,
//!
//! ```json
//! {"version": "2", "training_run": "2025-01-07-precontacto",
//!  "columns": ["..."], "reference_categories": {"tipo_de_gestion": "Especial"}}
//! ```
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xxhash_rust::xxh3::Xxh3;

use super::artifacts::ArtifactError;

#[derive(Debug, Error)]
pub enum SchemaMismatchError {
    #[error("expected-column artifact is unavailable: {0}")]
    ColumnsUnavailable(#[source] ArtifactError),
    #[error("expected-column list is empty")]
    EmptyContract,
    #[error("expected-column list repeats `{0}`")]
    DuplicateColumn(String),
    #[error("reference category column `{0}` must not be part of the expected columns")]
    ReferenceColumnListed(String),
    #[error("model was fitted in run `{model}` but the columns come from run `{columns}`")]
    TrainingRunMismatch { model: String, columns: String },
    #[error("model expects {model} inputs but the contract lists {columns} columns")]
    WidthMismatch { model: usize, columns: usize },
    #[error("model column fingerprint {model:016x} differs from contract {columns:016x}")]
    FingerprintMismatch { model: u64, columns: u64 },
}

/// Ordered list of feature columns frozen at fitting time, plus the
/// reference category dropped from each categorical feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaContract {
    version: Option<String>,
    training_run: Option<String>,
    columns: Vec<String>,
    reference_categories: BTreeMap<String, String>,
}

impl SchemaContract {
    /// # Errors
    /// Returns [`SchemaMismatchError`] when the list is empty or repeats a
    /// column.
    pub fn new(columns: Vec<String>) -> Result<Self, SchemaMismatchError> {
        if columns.is_empty() {
            return Err(SchemaMismatchError::EmptyContract);
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(SchemaMismatchError::DuplicateColumn(column.clone()));
            }
        }
        Ok(Self {
            version: None,
            training_run: None,
            columns,
            reference_categories: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_training_run(mut self, run: impl Into<String>) -> Self {
        self.training_run = Some(run.into());
        self
    }

    /// Records the dropped reference category of each categorical feature.
    ///
    /// # Errors
    /// Returns [`SchemaMismatchError::ReferenceColumnListed`] if a reference
    /// indicator is also an expected column.
    pub fn with_reference_categories(
        mut self,
        references: BTreeMap<String, String>,
    ) -> Result<Self, SchemaMismatchError> {
        for (feature, value) in &references {
            let indicator = indicator_name(feature, value);
            if self.columns.contains(&indicator) {
                return Err(SchemaMismatchError::ReferenceColumnListed(indicator));
            }
        }
        self.reference_categories = references;
        Ok(self)
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[must_use]
    pub fn training_run(&self) -> Option<&str> {
        self.training_run.as_deref()
    }

    #[must_use]
    pub fn reference_category(&self, feature: &str) -> Option<&str> {
        self.reference_categories.get(feature).map(String::as_str)
    }

    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        fingerprint_columns(&self.columns)
    }
}

/// Indicator column name for one value of a categorical feature.
#[must_use]
pub fn indicator_name(feature: &str, value: &str) -> String {
    format!("{feature}_{value}")
}

/// Order-sensitive xxh3 fingerprint of a column list.
#[must_use]
pub fn fingerprint_columns(columns: &[String]) -> u64 {
    let mut hasher = Xxh3::new();
    for column in columns {
        hasher.update(column.as_bytes());
        hasher.update(&[0]);
    }
    hasher.digest()
}

/// On-disk shape of the expected-column artifact: a bare list or a
/// versioned document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ColumnsDocument {
    Versioned {
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        training_run: Option<String>,
        columns: Vec<String>,
        #[serde(default)]
        reference_categories: BTreeMap<String, String>,
    },
    Bare(Vec<String>),
}

impl ColumnsDocument {
    pub(crate) fn into_contract(self) -> Result<SchemaContract, SchemaMismatchError> {
        match self {
            Self::Bare(columns) => SchemaContract::new(columns),
            Self::Versioned {
                version,
                training_run,
                columns,
                reference_categories,
            } => {
                let mut contract =
                    SchemaContract::new(columns)?.with_reference_categories(reference_categories)?;
                contract.version = version;
                contract.training_run = training_run;
                Ok(contract)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn empty_and_duplicate_lists_are_rejected() {
        assert!(matches!(
            SchemaContract::new(Vec::new()),
            Err(SchemaMismatchError::EmptyContract)
        ));
        assert!(matches!(
            SchemaContract::new(names(&["mes", "mes"])),
            Err(SchemaMismatchError::DuplicateColumn(column)) if column == "mes"
        ));
    }

    #[test]
    fn fingerprint_depends_on_order() {
        let forward = fingerprint_columns(&names(&["a", "b"]));
        let reverse = fingerprint_columns(&names(&["b", "a"]));
        let joined = fingerprint_columns(&names(&["ab"]));
        assert_ne!(forward, reverse);
        assert_ne!(forward, joined);
    }

    #[test]
    fn reference_indicator_cannot_be_expected() {
        let contract = SchemaContract::new(names(&["categoria_cargo_otros"])).expect("contract");
        let references =
            BTreeMap::from([("categoria_cargo".to_string(), "otros".to_string())]);
        assert!(matches!(
            contract.with_reference_categories(references),
            Err(SchemaMismatchError::ReferenceColumnListed(_))
        ));
    }

    #[test]
    fn parses_both_document_shapes() {
        let bare: ColumnsDocument = serde_json::from_str(r#"["mes", "dia_semana"]"#).expect("bare");
        let contract = bare.into_contract().expect("valid");
        assert_eq!(contract.len(), 2);
        assert!(contract.training_run().is_none());

        let versioned: ColumnsDocument = serde_json::from_str(
            r#"{"version": "2", "training_run": "r-7", "columns": ["mes"],
                "reference_categories": {"categoria_cargo": "administrativo"}}"#,
        )
        .expect("versioned");
        let contract = versioned.into_contract().expect("valid");
        assert_eq!(contract.training_run(), Some("r-7"));
        assert_eq!(contract.version(), Some("2"));
        assert_eq!(
            contract.reference_category("categoria_cargo"),
            Some("administrativo")
        );
    }
}
