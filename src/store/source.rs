//! Record source: runs one query and returns a tabular record set.
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    Column, MySqlPool, Row,
    mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow},
};
use thiserror::Error;
use tracing::{debug, info};

use super::models::RecordSet;

/// Connectivity or query failure. Always fatal for a run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("record source query `{query}` failed: {source}")]
    Query {
        query: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to decode column `{column}`: {source}")]
    Decode {
        column: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to read query file {path}: {source}")]
    QueryFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Executes `query` once and returns every row.
    async fn fetch(&self, query: &str) -> Result<RecordSet, SourceError>;
}

/// MySQL-backed record source. Queries are expected to cast every selected
/// column to text so malformed cells surface as data, not decode errors.
#[derive(Debug, Clone)]
pub struct MySqlRecordSource {
    pool: MySqlPool,
}

impl MySqlRecordSource {
    #[must_use]
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Builds a lazily connecting pool; the first query opens the connection.
    #[must_use]
    pub fn connect_lazy(
        options: MySqlConnectOptions,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy_with(options);
        Self::new(pool)
    }
}

#[async_trait]
impl RecordSource for MySqlRecordSource {
    async fn fetch(&self, query: &str) -> Result<RecordSet, SourceError> {
        let rows: Vec<MySqlRow> =
            sqlx::query(query)
                .fetch_all(&self.pool)
                .await
                .map_err(|source| SourceError::Query {
                    query: summarize_query(query),
                    source,
                })?;

        let Some(first) = rows.first() else {
            debug!("record source returned no rows");
            return Ok(RecordSet::default());
        };
        let columns: Vec<String> = first
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect();

        let mut set = RecordSet::new(columns);
        for row in &rows {
            let mut cells = Vec::with_capacity(set.columns.len());
            for (idx, column) in set.columns.iter().enumerate() {
                let value: Option<String> =
                    row.try_get(idx).map_err(|source| SourceError::Decode {
                        column: column.clone(),
                        source,
                    })?;
                cells.push(value);
            }
            set.rows.push(cells);
        }

        info!(rows = set.len(), columns = set.columns.len(), "record source query completed");
        Ok(set)
    }
}

fn summarize_query(query: &str) -> String {
    let compact = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() > 80 {
        let head: String = compact.chars().take(80).collect();
        format!("{head}...")
    } else {
        compact
    }
}

/// Query text bundled with the crate, optionally overridden by a file.
#[derive(Debug, Clone)]
pub struct QueryText {
    name: &'static str,
    text: String,
}

impl QueryText {
    #[must_use]
    pub fn bundled(name: &'static str, text: &str) -> Self {
        Self {
            name,
            text: text.to_string(),
        }
    }

    /// Loads the query from `path` when given, otherwise keeps the bundled text.
    ///
    /// # Errors
    /// Returns [`SourceError::QueryFile`] if the override cannot be read.
    pub fn with_override(self, path: Option<&str>) -> Result<Self, SourceError> {
        let Some(path) = path else {
            return Ok(self);
        };
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::QueryFile {
            path: path.to_string(),
            source,
        })?;
        Ok(Self {
            name: self.name,
            text,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

pub const DAILY_ASSIGNMENTS_SQL: &str = include_str!("../../sql/daily_assignments.sql");
pub const REFERENCE_POPULATION_SQL: &str = include_str!("../../sql/reference_population.sql");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_queries_are_summarized() {
        let query = format!("SELECT {} FROM t", "a, ".repeat(60));
        let summary = summarize_query(&query);
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), 83);
    }

    #[test]
    fn bundled_queries_select_text_columns() {
        assert!(DAILY_ASSIGNMENTS_SQL.contains("fecha_entrevista"));
        assert!(REFERENCE_POPULATION_SQL.contains("conversion"));
    }

    #[test]
    fn override_replaces_bundled_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("q.sql");
        std::fs::write(&path, "SELECT 1").expect("write query");
        let query = QueryText::bundled("daily", "SELECT 2")
            .with_override(path.to_str())
            .expect("override loads");
        assert_eq!(query.as_str(), "SELECT 1");
        assert_eq!(query.name(), "daily");
    }
}
