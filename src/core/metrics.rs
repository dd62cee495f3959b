use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

/// Counts a submit decision; `outcome` is a short label such as `accepted` or `conflict`.
pub(crate) fn record_submission(outcome: &'static str, auto_submitted: bool) {
    metrics::counter!(
        "quiz_submissions_total",
        "outcome" => outcome,
        "auto_submitted" => if auto_submitted { "true" } else { "false" }
    )
    .increment(1);
}

pub(crate) fn record_aggregation_skip(scope: &'static str) {
    metrics::counter!("quiz_aggregation_skipped_total", "scope" => scope).increment(1);
}
