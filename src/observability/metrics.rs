//! Prometheus metrics for retention runs.
//!
//! Provides metrics for:
//! - Jobs listed per run
//! - Deletion outcomes (simulated, deleted, failed)
//! - Time of the last completed run
//!
//! Metrics are exported by rendering them into a textfile at the end of the
//! run. Without the `prometheus` feature every function here is a no-op.

#[cfg(feature = "prometheus")]
use std::sync::OnceLock;

#[cfg(feature = "prometheus")]
use metrics::{counter, gauge};
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Global Prometheus handle used to render the textfile.
#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder with the given configuration.
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(MetricsError::Install)?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::Setup("Metrics already initialized".to_string()))?;

    Ok(())
}

/// Initialize the metrics recorder (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if config.enabled {
        tracing::warn!(
            "Metrics are enabled in config but the 'prometheus' feature is not compiled. \
            Rebuild with: cargo build --features prometheus"
        );
    }
    Ok(())
}

/// Render the collected metrics into the configured textfile.
///
/// The file is written next to its final location and renamed into place so
/// the collector never reads a partial file.
#[cfg(feature = "prometheus")]
pub fn write_textfile(config: &MetricsConfig) -> Result<(), MetricsError> {
    let (Some(path), Some(handle)) = (&config.textfile_path, PROMETHEUS_HANDLE.get()) else {
        return Ok(());
    };

    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, handle.render()).map_err(|e| MetricsError::Write(e, tmp.clone()))?;
    std::fs::rename(&tmp, path).map_err(|e| MetricsError::Write(e, path.clone()))?;

    tracing::debug!(path = %path.display(), "Wrote metrics textfile");
    Ok(())
}

/// Render the collected metrics (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn write_textfile(_config: &MetricsConfig) -> Result<(), MetricsError> {
    Ok(())
}

/// Record the number of Jobs returned by the listing.
pub fn record_jobs_listed(count: u64) {
    #[cfg(feature = "prometheus")]
    {
        counter!("job_janitor_jobs_listed_total").increment(count);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = count;
    }
}

/// Record the outcome of one Job in the delete-set.
///
/// # Arguments
/// * `outcome` - One of "simulated", "deleted", "failed"
pub fn record_job_deletion(outcome: &str) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "job_janitor_job_deletions_total",
            "outcome" => outcome.to_string()
        )
        .increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = outcome;
    }
}

/// Record that a run finished (listing succeeded and every deletion was attempted).
pub fn record_run_completed() {
    #[cfg(feature = "prometheus")]
    {
        gauge!("job_janitor_last_run_timestamp_seconds")
            .set(chrono::Utc::now().timestamp() as f64);
    }
}

/// Metrics errors.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to set up metrics: {0}")]
    Setup(String),

    #[cfg(feature = "prometheus")]
    #[error("Failed to install metrics recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Failed to write metrics to {1}: {0}")]
    Write(std::io::Error, std::path::PathBuf),
}
