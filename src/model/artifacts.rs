//! Loading of the frozen model and its expected-column list.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;

use super::{
    contract::{ColumnsDocument, SchemaContract, SchemaMismatchError},
    logistic::{ConversionModel, LogisticModel, LogisticWeights},
};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artifact {path} is invalid: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Source of the two artifacts of one fitting run.
pub trait ArtifactStore: Send + Sync {
    /// # Errors
    /// Returns [`ArtifactError`] if the model cannot be read or parsed.
    fn load_model(&self) -> Result<Arc<dyn ConversionModel>, ArtifactError>;

    /// # Errors
    /// Returns [`SchemaMismatchError`] if the list cannot be loaded or is empty.
    fn load_columns(&self) -> Result<SchemaContract, SchemaMismatchError>;
}

/// JSON artifacts on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    model_path: PathBuf,
    columns_path: PathBuf,
}

impl FileArtifactStore {
    #[must_use]
    pub fn new(model_path: impl Into<PathBuf>, columns_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            columns_path: columns_path.into(),
        }
    }
}

impl ArtifactStore for FileArtifactStore {
    fn load_model(&self) -> Result<Arc<dyn ConversionModel>, ArtifactError> {
        let raw = read_artifact(&self.model_path)?;
        let weights: LogisticWeights =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
                path: self.model_path.clone(),
                source,
            })?;
        weights.validate().map_err(|source| ArtifactError::Invalid {
            path: self.model_path.clone(),
            source,
        })?;
        Ok(Arc::new(LogisticModel::from_weights(weights)))
    }

    fn load_columns(&self) -> Result<SchemaContract, SchemaMismatchError> {
        let raw =
            read_artifact(&self.columns_path).map_err(SchemaMismatchError::ColumnsUnavailable)?;
        let document: ColumnsDocument = serde_json::from_str(&raw).map_err(|source| {
            SchemaMismatchError::ColumnsUnavailable(ArtifactError::Parse {
                path: self.columns_path.clone(),
                source,
            })
        })?;
        document.into_contract()
    }
}

fn read_artifact(path: &Path) -> Result<String, ArtifactError> {
    fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).expect("write artifact");
        path
    }

    #[test]
    fn loads_model_and_columns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model = write(
            dir.path(),
            "model.json",
            r#"{"training_run": "r1", "intercept": -0.2, "coefficients": [0.5, 0.1]}"#,
        );
        let columns = write(dir.path(), "columns.json", r#"["mes", "dia_semana"]"#);
        let store = FileArtifactStore::new(model, columns);

        let model = store.load_model().expect("model loads");
        assert_eq!(model.input_width(), 2);
        assert_eq!(model.training_run(), Some("r1"));
        assert_eq!(store.load_columns().expect("columns load").len(), 2);
    }

    #[test]
    fn missing_columns_artifact_is_a_schema_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileArtifactStore::new(dir.path().join("m.json"), dir.path().join("c.json"));
        assert!(matches!(
            store.load_columns(),
            Err(SchemaMismatchError::ColumnsUnavailable(ArtifactError::Read { .. }))
        ));
        assert!(matches!(store.load_model(), Err(ArtifactError::Read { .. })));
    }

    #[test]
    fn empty_columns_artifact_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let columns = write(dir.path(), "columns.json", "[]");
        let store = FileArtifactStore::new(dir.path().join("m.json"), columns);
        assert!(matches!(
            store.load_columns(),
            Err(SchemaMismatchError::EmptyContract)
        ));
    }

    #[test]
    fn invalid_model_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model = write(
            dir.path(),
            "model.json",
            r#"{"intercept": 0.0, "coefficients": []}"#,
        );
        let store = FileArtifactStore::new(model, dir.path().join("c.json"));
        assert!(matches!(store.load_model(), Err(ArtifactError::Invalid { .. })));
    }
}
