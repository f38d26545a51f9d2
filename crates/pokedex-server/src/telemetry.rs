//! Logging and metrics setup

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

pub const REQUESTS_TOTAL: &str = "pokedex_requests_total";
pub const PREDICTIONS_TOTAL: &str = "pokedex_predictions_total";
pub const ERRORS_TOTAL: &str = "pokedex_errors_total";
pub const INFERENCE_LATENCY_US: &str = "pokedex_inference_latency_us";

/// Initialize tracing/logging
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("pokedex=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pokedex=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Install the Prometheus recorder and return a handle for rendering
pub fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(REQUESTS_TOTAL, "Total number of analyze requests received");
    metrics::describe_counter!(PREDICTIONS_TOTAL, "Predictions served, by label");
    metrics::describe_counter!(ERRORS_TOTAL, "Failed requests, by error kind");
    metrics::describe_histogram!(
        INFERENCE_LATENCY_US,
        metrics::Unit::Microseconds,
        "Model inference latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
