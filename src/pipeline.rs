//! Daily scoring pipeline.
//!
//! A batch moves through the stages in this order:
//!
//! 1. [`features`] classifies each assignment and derives its calendar and
//!    contact features. Records whose features cannot be derived are
//!    withheld and reported, never silently dropped.
//! 2. [`reconcile`] expands categorical features into indicator columns and
//!    aligns them to the model's expected-column contract.
//! 3. [`score`] evaluates the model row by row and maps each probability to a
//!    priority [`Tier`]. Any model failure aborts the whole batch.
//! 4. [`export`] publishes the tier files, the consolidated file and the
//!    withheld report as one unit.
//!
//! [`orchestrator`] wires the stages together for the daily job and for the
//! diagnostic binary, which stops after scoring.
pub mod export;
pub mod features;
pub mod orchestrator;
pub mod reconcile;
pub mod score;

pub use export::{ExportLayout, Exporter, ScoredRecord};
pub use features::{FeatureRow, WithheldRecord};
pub use orchestrator::{DailyRun, RunSummary, ScoredBatch, ScoringPipeline};
pub use score::{Score, Tier, TierCounts};
