use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::{
    config::Config,
    error::RunError,
    model::{ArtifactStore, FileArtifactStore},
    observability::Telemetry,
    pipeline::{DailyRun, Exporter, RunSummary, ScoringPipeline},
    store::{
        AssignmentRecord, MySqlRecordSource, QueryText, RecordSource, ReferenceRecord,
        source::{DAILY_ASSIGNMENTS_SQL, REFERENCE_POPULATION_SQL},
    },
};

/// Shared components of every entry point, built once from [`Config`].
pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    source: Arc<dyn RecordSource>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl ComponentRegistry {
    /// Connects the record source lazily and points the artifact store at the
    /// configured files.
    ///
    /// # Errors
    /// Returns an error if the database options are invalid.
    pub fn build(config: Config, telemetry: Telemetry) -> Result<Self> {
        let options = config
            .database()
            .connect_options()
            .context("failed to build database options")?;
        let source = MySqlRecordSource::connect_lazy(
            options,
            config.db_max_connections(),
            config.db_acquire_timeout(),
        );
        let artifacts = FileArtifactStore::new(config.model_path(), config.columns_path());
        Ok(Self::with_components(
            config,
            telemetry,
            Arc::new(source),
            Arc::new(artifacts),
        ))
    }

    /// Assembles a registry from explicit components.
    #[must_use]
    pub fn with_components(
        config: Config,
        telemetry: Telemetry,
        source: Arc<dyn RecordSource>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            telemetry,
            source,
            artifacts,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// # Errors
    /// Returns an error if the configured override file cannot be read.
    pub fn daily_query(&self) -> Result<QueryText> {
        QueryText::bundled("daily_assignments", DAILY_ASSIGNMENTS_SQL)
            .with_override(self.config.daily_query_path())
            .context("failed to load daily assignments query")
    }

    /// # Errors
    /// Returns an error if the configured override file cannot be read.
    pub fn reference_query(&self) -> Result<QueryText> {
        QueryText::bundled("reference_population", REFERENCE_POPULATION_SQL)
            .with_override(self.config.reference_query_path())
            .context("failed to load reference population query")
    }

    /// # Errors
    /// Returns an error if the daily query cannot be loaded.
    pub fn daily_run(&self) -> Result<DailyRun> {
        Ok(DailyRun::new(
            Arc::clone(&self.source),
            Arc::clone(&self.artifacts),
            self.daily_query()?,
            self.config.ruleset(),
            Exporter::new(self.config.export().clone()),
            self.telemetry.metrics(),
        ))
    }

    /// # Errors
    /// Returns an error if the rule tables or the artifacts are unusable.
    pub fn scoring_pipeline(&self) -> Result<ScoringPipeline> {
        ScoringPipeline::load(self.config.ruleset(), self.artifacts.as_ref())
            .context("failed to load scoring pipeline")
    }

    /// Fetches and validates today's assignments.
    ///
    /// # Errors
    /// Returns an error on query or validation failure. An empty result is
    /// not an error.
    pub async fn fetch_assignments(&self) -> Result<Vec<AssignmentRecord>> {
        let query = self.daily_query()?;
        let set = self.source.fetch(query.as_str()).await?;
        if set.is_empty() {
            return Ok(Vec::new());
        }
        let records = AssignmentRecord::from_record_set(&set)?;
        info!(rows = records.len(), "assignments loaded");
        Ok(records)
    }

    /// Fetches the population the model was fitted on.
    ///
    /// # Errors
    /// Returns an error on query or validation failure.
    pub async fn fetch_reference(&self) -> Result<Vec<ReferenceRecord>> {
        let query = self.reference_query()?;
        let set = self.source.fetch(query.as_str()).await?;
        if set.is_empty() {
            return Ok(Vec::new());
        }
        let records = ReferenceRecord::from_record_set(&set)?;
        info!(rows = records.len(), "reference population loaded");
        Ok(records)
    }

    /// Publishes metrics to the textfile collector when configured.
    ///
    /// # Errors
    /// Returns an error if the metrics file cannot be written.
    pub fn flush_metrics(&self) -> Result<()> {
        if let Some(path) = self.config.metrics_textfile() {
            self.telemetry.write_textfile(path)?;
            info!(path = %path.display(), "metrics written");
        }
        Ok(())
    }

    /// Logs the outcome of a daily run, then publishes the metrics. A failed
    /// metrics flush is only logged; it never replaces the run's result.
    ///
    /// # Errors
    /// Returns the run's own error, with context.
    pub fn conclude(&self, outcome: Result<RunSummary, RunError>) -> Result<RunSummary> {
        let result = match outcome {
            Ok(summary) => {
                info!(
                    run_id = %summary.run_id,
                    fetched = summary.fetched,
                    alto = summary.scored.high,
                    medio = summary.scored.medium,
                    bajo = summary.scored.low,
                    withheld = summary.withheld,
                    files = summary.files.len(),
                    "daily scoring finished"
                );
                Ok(summary)
            }
            Err(run_error) => {
                error!(
                    kind = run_error.kind().as_str(),
                    error = %run_error,
                    "daily scoring aborted"
                );
                Err(run_error).context("daily scoring run failed")
            }
        };

        if let Err(flush_error) = self.flush_metrics() {
            warn!(error = %format!("{flush_error:#}"), "failed to write run metrics");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::{
        error::ErrorKind,
        pipeline::TierCounts,
        store::{InMemoryRecordSource, RecordValidationError},
    };

    /// A registry whose metrics textfile lives in a directory that does not
    /// exist, so every flush fails.
    fn registry_with_broken_textfile(root: &std::path::Path) -> ComponentRegistry {
        let textfile = root.join("missing").join("placement.prom");
        let config = temp_env::with_vars(
            [
                ("PLACEMENT_DB_DSN", Some("mysql://u:p@localhost:3306/agencia")),
                ("PLACEMENT_METRICS_TEXTFILE", textfile.to_str()),
            ],
            || Config::from_env().expect("config loads"),
        );
        ComponentRegistry::with_components(
            config,
            Telemetry::without_tracing().expect("telemetry"),
            Arc::new(InMemoryRecordSource::new()),
            Arc::new(FileArtifactStore::new(
                root.join("model.json"),
                root.join("columns.json"),
            )),
        )
    }

    #[test]
    fn run_error_survives_a_failed_metrics_flush() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_with_broken_textfile(dir.path());
        assert!(registry.flush_metrics().is_err());

        let outcome = Err(RunError::from(RecordValidationError::MissingColumn("cargo")));
        let error = registry.conclude(outcome).expect_err("run error is returned");

        let run_error = error.downcast_ref::<RunError>().expect("run error kept");
        assert_eq!(run_error.kind(), ErrorKind::InputData);
    }

    #[test]
    fn successful_run_is_not_failed_by_metrics_flush() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry_with_broken_textfile(dir.path());
        let summary = RunSummary {
            run_id: Uuid::now_v7(),
            run_date: NaiveDate::from_ymd_opt(2025, 1, 15).expect("date"),
            fetched: 0,
            scored: TierCounts::default(),
            withheld: 0,
            unexpected_columns: 0,
            files: Vec::new(),
        };

        let concluded = registry.conclude(Ok(summary)).expect("run succeeds");
        assert_eq!(concluded.fetched, 0);
    }
}
