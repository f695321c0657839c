use anyhow::Context;
use chrono::Local;

use placement_score::{
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

    let run_date = Local::now().date_naive();
    let outcome = registry.daily_run()?.execute(run_date).await;
    registry.conclude(outcome)?;
    Ok(())
}
