pub mod metrics;
pub mod tracing;

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use prometheus::{Registry, TextEncoder};

use self::metrics::Metrics;

/// Process-wide telemetry: tracing subscriber plus the run metrics registry.
#[derive(Debug, Clone)]
pub struct Telemetry {
    registry: Arc<Registry>,
    metrics: Arc<Metrics>,
}

impl Telemetry {
    /// Initializes tracing once and registers the run metrics.
    ///
    /// # Errors
    /// Returns an error if the subscriber or the metrics cannot be set up.
    pub fn new() -> Result<Self> {
        tracing::init()?;
        Self::without_tracing()
    }

    /// Metrics only, for tests and embedding.
    ///
    /// # Errors
    /// Returns an error if a metric cannot be registered.
    pub fn without_tracing() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(Metrics::new(Arc::clone(&registry))?);
        Ok(Self { registry, metrics })
    }

    #[must_use]
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Renders the registry in the Prometheus text format.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn render_prometheus(&self) -> Result<String> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .context("failed to encode metrics")
    }

    /// Writes the rendered registry for a node-exporter textfile collector.
    /// The file is replaced atomically.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let body = self.render_prometheus()?;
        let staging = path.with_extension("prom.tmp");
        std::fs::write(&staging, body)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        std::fs::rename(&staging, path)
            .with_context(|| format!("failed to move metrics into {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textfile_contains_run_metrics() {
        let telemetry = Telemetry::without_tracing().expect("telemetry");
        telemetry.metrics().records_fetched.inc_by(3.0);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("placement.prom");

        telemetry.write_textfile(&path).expect("write metrics");
        let body = std::fs::read_to_string(&path).expect("read metrics");
        assert!(body.contains("placement_records_fetched_total 3"));
    }
}
