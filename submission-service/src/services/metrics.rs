//! Prometheus export for the `metrics` facade.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Later calls are no-ops.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    metrics::describe_counter!(
        "rate_limit_rejections_total",
        "Requests rejected by a rate limit policy"
    );
    metrics::describe_counter!(
        "revoked_token_rejections_total",
        "Requests presenting a revoked bearer token"
    );
    metrics::describe_counter!(
        "verification_codes_issued_total",
        "Verification codes issued"
    );

    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn render() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_recorder() {
        if METRICS_HANDLE.get().is_none() {
            assert!(render().starts_with('#'));
        }
    }
}
