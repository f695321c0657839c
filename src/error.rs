//! Fatal run errors and their classification.
use thiserror::Error;

use crate::{
    model::{ArtifactError, SchemaMismatchError},
    pipeline::{export::ExportError, score::ScoringError},
    store::{RecordValidationError, SourceError},
    taxonomy::TaxonomyError,
};

/// How an error propagates: input-data problems are recovered per field
/// except record-set shape, everything else aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputData,
    /// The source answered but a cell could not be decoded as text.
    SourceData,
    SchemaContract,
    Connectivity,
    /// A local resource named by the configuration is unusable.
    Configuration,
    Diagnostic,
    Output,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InputData => "input_data",
            Self::SourceData => "source_data",
            Self::SchemaContract => "schema_contract",
            Self::Connectivity => "connectivity",
            Self::Configuration => "configuration",
            Self::Diagnostic => "diagnostic",
            Self::Output => "output",
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Validation(#[from] RecordValidationError),
    #[error(transparent)]
    Schema(#[from] SchemaMismatchError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("failed to render diagnostic report: {0}")]
    Report(#[from] serde_json::Error),
}

impl RunError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Source(SourceError::Query { .. }) => ErrorKind::Connectivity,
            Self::Source(SourceError::Decode { .. }) => ErrorKind::SourceData,
            Self::Source(SourceError::QueryFile { .. }) => ErrorKind::Configuration,
            Self::Validation(_) => ErrorKind::InputData,
            Self::Schema(_) | Self::Artifact(_) | Self::Taxonomy(_) | Self::Scoring(_) => {
                ErrorKind::SchemaContract
            }
            Self::Export(_) => ErrorKind::Output,
            Self::Report(_) => ErrorKind::Diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_propagation_policy() {
        let missing: RunError = RecordValidationError::MissingColumn("cargo").into();
        assert_eq!(missing.kind(), ErrorKind::InputData);

        let empty: RunError = SchemaMismatchError::EmptyContract.into();
        assert_eq!(empty.kind(), ErrorKind::SchemaContract);
    }

    #[test]
    fn source_failures_are_split_by_cause() {
        let unreachable: RunError = SourceError::Query {
            query: "SELECT 1".to_string(),
            source: sqlx::Error::PoolTimedOut,
        }
        .into();
        assert_eq!(unreachable.kind(), ErrorKind::Connectivity);
        assert_eq!(unreachable.kind().as_str(), "connectivity");

        let undecodable: RunError = SourceError::Decode {
            column: "fecha_entrevista".to_string(),
            source: sqlx::Error::ColumnNotFound("fecha_entrevista".to_string()),
        }
        .into();
        assert_eq!(undecodable.kind(), ErrorKind::SourceData);
        assert_eq!(undecodable.kind().as_str(), "source_data");

        let unreadable: RunError = SourceError::QueryFile {
            path: "q.sql".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert_eq!(unreadable.kind(), ErrorKind::Configuration);
    }
}
