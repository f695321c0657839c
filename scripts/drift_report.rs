//! Compares today's assignments with the population the model was fitted
//! on and prints the drift report as JSON.
use anyhow::Context;
use chrono::Local;
use tracing::{info, warn};

use placement_score::{
    analysis::{DriftReport, render_json},
    app::ComponentRegistry,
    config::Config,
    observability::{Telemetry, tracing::install_panic_hook},
    taxonomy::TaxonomySet,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    install_panic_hook();
    let telemetry = Telemetry::new().context("failed to initialize telemetry")?;
    let config = Config::from_env().context("failed to load configuration")?;
    let registry =
        ComponentRegistry::build(config, telemetry).context("failed to build component registry")?;

    let taxonomies = TaxonomySet::compile(registry.config().ruleset())?;
    let reference = registry.fetch_reference().await?;
    let candidate = registry.fetch_assignments().await?;

    let report = DriftReport::build(
        &taxonomies,
        &reference,
        &candidate,
        Local::now().date_naive(),
        registry.config().drift(),
    );
    match report.verdict.ready() {
        Some(verdict) if verdict.drift_detected => warn!(
            category = %verdict.designated_category,
            gap_pct = verdict.designated_gap_pct,
            threshold_pct = verdict.threshold_pct,
            "candidate batch has drifted from the fitting population"
        ),
        Some(verdict) => info!(
            gap_pct = verdict.designated_gap_pct,
            "candidate composition is similar to the fitting population"
        ),
        None => warn!("not enough data to evaluate drift"),
    }

    let rendered = render_json(&report)?;
    println!("{rendered}");
    Ok(())
}
