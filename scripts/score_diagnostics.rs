//! Scores today's assignments without exporting and prints a summary of
//! the probabilities and category mix as JSON.
use anyhow::Context;
use tracing::warn;

use placement_score::{
    analysis::{Diagnostic, ScoreSummary, render_json},
    app::ComponentRegistry,
    config::Config,
    observability::{Telemetry, tracing::install_panic_hook},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    install_panic_hook();
    let telemetry = Telemetry::new().context("failed to initialize telemetry")?;
    let config = Config::from_env().context("failed to load configuration")?;
    let registry =
        ComponentRegistry::build(config, telemetry).context("failed to build component registry")?;

    let pipeline = registry.scoring_pipeline()?;
    let records = registry.fetch_assignments().await?;
    let summary = if records.is_empty() {
        warn!("no assignments to diagnose");
        Diagnostic::InsufficientData {
            population: "scored_batch".to_string(),
            reason: "no assignments".to_string(),
        }
    } else {
        let batch = pipeline
            .score_batch(records)
            .context("failed to score assignments")?;
        ScoreSummary::from_scored(&batch.scored, registry.config().reference_mean_probability())
    };

    let rendered = render_json(&summary)?;
    println!("{rendered}");
    Ok(())
}
