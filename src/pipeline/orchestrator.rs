//! Batch scoring shared by every entry point, and the daily run.
use std::{collections::BTreeSet, path::PathBuf, sync::Arc, time::Instant};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::{
    export::{Exporter, ScoredRecord},
    features::{WithheldRecord, build_features},
    reconcile::reconcile,
    score::{ScoringError, Tier, TierCounts, score_matrix},
};
use crate::{
    error::RunError,
    model::{ArtifactStore, ConversionModel, SchemaContract, load_matched_pair},
    observability::metrics::Metrics,
    store::{AssignmentRecord, QueryText, RecordSource},
    taxonomy::{RuleSetVersion, TaxonomySet},
};

/// Outcome of scoring one batch.
#[derive(Debug, Default, Serialize)]
pub struct ScoredBatch {
    pub scored: Vec<ScoredRecord>,
    pub withheld: Vec<WithheldRecord>,
    pub unexpected_columns: BTreeSet<String>,
}

impl ScoredBatch {
    #[must_use]
    pub fn tier_counts(&self) -> TierCounts {
        TierCounts::from_tiers(self.scored.iter().map(|record| record.score.tier))
    }
}

/// Classify, derive, reconcile and score with one rule-table version and
/// one matched model/contract pair.
#[derive(Debug)]
pub struct ScoringPipeline {
    taxonomies: TaxonomySet,
    model: Arc<dyn ConversionModel>,
    contract: SchemaContract,
}

impl ScoringPipeline {
    #[must_use]
    pub fn new(
        taxonomies: TaxonomySet,
        model: Arc<dyn ConversionModel>,
        contract: SchemaContract,
    ) -> Self {
        Self {
            taxonomies,
            model,
            contract,
        }
    }

    /// Compiles the rule tables of `version` and loads the artifact pair.
    ///
    /// # Errors
    /// Returns [`RunError`] if the tables or the artifacts are unusable.
    pub fn load(version: RuleSetVersion, artifacts: &dyn ArtifactStore) -> Result<Self, RunError> {
        let taxonomies = TaxonomySet::compile(version)?;
        let (model, contract) = load_matched_pair(artifacts)?;
        Ok(Self::new(taxonomies, model, contract))
    }

    #[must_use]
    pub fn taxonomies(&self) -> &TaxonomySet {
        &self.taxonomies
    }

    #[must_use]
    pub fn contract(&self) -> &SchemaContract {
        &self.contract
    }

    /// # Errors
    /// Returns [`ScoringError`] if the model fails on any record; no partial
    /// batch is returned.
    pub fn score_batch(&self, records: Vec<AssignmentRecord>) -> Result<ScoredBatch, ScoringError> {
        let table = build_features(&self.taxonomies, records);
        for withheld in &table.withheld {
            warn!(
                row_index = withheld.row_index,
                vacancy_code = withheld.vacancy_code.as_deref().unwrap_or(""),
                reason = %withheld.reason,
                "record withheld from scoring"
            );
        }

        let reconciliation = reconcile(
            table.prepared.iter().map(|prepared| &prepared.features),
            &self.contract,
        );
        if !reconciliation.unexpected_columns.is_empty() {
            info!(
                count = reconciliation.unexpected_columns.len(),
                columns = ?reconciliation.unexpected_columns,
                "observed indicator columns dropped by the contract"
            );
        }

        let scores = score_matrix(self.model.as_ref(), &reconciliation.matrix)?;
        let scored: Vec<ScoredRecord> = table
            .prepared
            .into_iter()
            .zip(scores)
            .map(|(prepared, score)| ScoredRecord {
                labels: prepared.features.labels,
                record: prepared.record,
                score,
            })
            .collect();

        let batch = ScoredBatch {
            scored,
            withheld: table.withheld,
            unexpected_columns: reconciliation.unexpected_columns,
        };
        let counts = batch.tier_counts();
        info!(
            alto = counts.high,
            medio = counts.medium,
            bajo = counts.low,
            withheld = batch.withheld.len(),
            "batch scored"
        );
        Ok(batch)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub run_date: NaiveDate,
    pub fetched: usize,
    pub scored: TierCounts,
    pub withheld: usize,
    pub unexpected_columns: usize,
    pub files: Vec<PathBuf>,
}

/// The daily job: fetch today's assignments, score them and publish the
/// tier files.
pub struct DailyRun {
    source: Arc<dyn RecordSource>,
    artifacts: Arc<dyn ArtifactStore>,
    query: QueryText,
    ruleset: RuleSetVersion,
    exporter: Exporter,
    metrics: Arc<Metrics>,
}

impl DailyRun {
    #[must_use]
    pub fn new(
        source: Arc<dyn RecordSource>,
        artifacts: Arc<dyn ArtifactStore>,
        query: QueryText,
        ruleset: RuleSetVersion,
        exporter: Exporter,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            source,
            artifacts,
            query,
            ruleset,
            exporter,
            metrics,
        }
    }

    /// Runs the job for `run_date`. Either every output file is published
    /// or none is.
    ///
    /// # Errors
    /// Returns [`RunError`] on any fatal failure; see [`RunError::kind`].
    pub async fn execute(&self, run_date: NaiveDate) -> Result<RunSummary, RunError> {
        let run_id = Uuid::now_v7();
        let span = info_span!("daily_run", %run_id, %run_date, ruleset = %self.ruleset);
        let started = Instant::now();

        let result = self.run(run_id, run_date).instrument(span).await;
        self.metrics
            .run_duration
            .observe(started.elapsed().as_secs_f64());
        if let Err(error) = &result {
            self.metrics
                .runs_failed
                .with_label_values(&[error.kind().as_str()])
                .inc();
        }
        result
    }

    async fn run(&self, run_id: Uuid, run_date: NaiveDate) -> Result<RunSummary, RunError> {
        let pipeline = ScoringPipeline::load(self.ruleset, self.artifacts.as_ref())?;

        let set = self.source.fetch(self.query.as_str()).await?;
        info!(query = self.query.name(), rows = set.len(), "assignments fetched");
        self.metrics.records_fetched.inc_by(set.len() as f64);

        let mut summary = RunSummary {
            run_id,
            run_date,
            fetched: set.len(),
            scored: TierCounts::default(),
            withheld: 0,
            unexpected_columns: 0,
            files: Vec::new(),
        };
        if set.is_empty() {
            warn!("no assignments for the run date; nothing exported");
            return Ok(summary);
        }

        let records = AssignmentRecord::from_record_set(&set)?;
        let batch = pipeline.score_batch(records)?;

        for tier in Tier::ALL {
            self.metrics
                .records_scored
                .with_label_values(&[tier.as_str()])
                .inc_by(batch.tier_counts().get(tier) as f64);
        }
        self.metrics
            .records_withheld
            .inc_by(batch.withheld.len() as f64);
        self.metrics
            .unexpected_columns
            .set(batch.unexpected_columns.len() as f64);

        summary.files = self
            .exporter
            .export(run_date, &batch.scored, &batch.withheld)?;
        summary.scored = batch.tier_counts();
        summary.withheld = batch.withheld.len();
        summary.unexpected_columns = batch.unexpected_columns.len();

        info!(
            files = summary.files.len(),
            scored = summary.scored.total(),
            withheld = summary.withheld,
            "daily run completed"
        );
        Ok(summary)
    }
}
