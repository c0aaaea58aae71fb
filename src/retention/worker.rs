//! Single retention pass: list, plan, execute, report.
//!
//! The pass is run-once. It takes one snapshot of the matching Jobs, computes
//! the delete-set from it and applies the deletions in order. A listing
//! failure is the only error that aborts the pass; by then nothing has been
//! deleted.

use std::time::Instant;

use super::{
    executor::{self, ExecutionReport},
    policy::{self, UnstartedJobPolicy},
    report::RunReport,
};
use crate::{
    cluster::{ClusterError, JobDeleter, JobLister},
    config::JanitorConfig,
    models::JobRecord,
    observability::metrics,
};

/// Parameters of one run, fixed for its whole duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Whether the client uses the in-cluster service account.
    pub in_cluster: bool,
    pub namespace: String,
    pub label_selector: String,
    /// Number of most recent Jobs always kept.
    pub max_count: usize,
    pub dry_run: bool,
    pub unstarted_jobs: UnstartedJobPolicy,
}

impl From<&JanitorConfig> for RunConfig {
    fn from(config: &JanitorConfig) -> Self {
        Self {
            in_cluster: config.cluster.in_cluster,
            namespace: config.cluster.namespace.clone(),
            label_selector: config.cluster.label_selector.clone(),
            max_count: config.retention.max_count,
            dry_run: config.retention.dry_run,
            unstarted_jobs: config.retention.unstarted_jobs,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Failed to list jobs in namespace '{namespace}': {source}")]
    Listing {
        namespace: String,
        #[source]
        source: ClusterError,
    },
}

/// Run a single retention pass against the cluster.
pub async fn run_retention(
    config: &RunConfig,
    lister: &dyn JobLister,
    deleter: &dyn JobDeleter,
) -> Result<RunReport, RunError> {
    let start = Instant::now();
    let dry_run_msg = if config.dry_run { " (DRY RUN)" } else { "" };

    tracing::info!(
        namespace = %config.namespace,
        label_selector = %config.label_selector,
        max_count = config.max_count,
        dry_run = config.dry_run,
        unstarted_jobs = ?config.unstarted_jobs,
        "Starting retention run{}",
        dry_run_msg
    );

    let listing = lister
        .list_jobs(&config.namespace, &config.label_selector)
        .await
        .map_err(|source| RunError::Listing {
            namespace: config.namespace.clone(),
            source,
        })?;
    metrics::record_jobs_listed(listing.len() as u64);

    let mut considered = Vec::with_capacity(listing.len());
    let mut malformed = Vec::new();
    for job in &listing {
        match JobRecord::try_from(job) {
            Ok(record) => {
                tracing::debug!(
                    job = %record.name,
                    succeeded = record.succeeded,
                    start_time = ?record.start_time,
                    "Considering job"
                );
                considered.push(record);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed job");
                malformed.push(e);
            }
        }
    }

    let unstarted: Vec<String> = considered
        .iter()
        .filter(|job| !job.has_started())
        .map(|job| job.name.clone())
        .collect();
    if !unstarted.is_empty() {
        tracing::warn!(
            count = unstarted.len(),
            policy = ?config.unstarted_jobs,
            "Found jobs without a start time"
        );
    }

    let plan = policy::plan(&considered, config.max_count, config.unstarted_jobs);
    tracing::info!(
        listed = listing.len(),
        to_delete = plan.delete.len(),
        retained = plan.retained.len(),
        held = plan.held.len(),
        "Computed retention plan"
    );

    let execution: ExecutionReport =
        executor::execute(&plan.delete, &config.namespace, config.dry_run, deleter).await;

    let retained = names(&plan.retained);
    let held = names(&plan.held);
    let excluded = names(&plan.excluded);

    tracing::info!(
        simulated = execution.simulated(),
        deleted = execution.deleted(),
        failed = execution.failed(),
        duration_ms = start.elapsed().as_millis() as u64,
        dry_run = config.dry_run,
        "Retention run complete{}",
        dry_run_msg
    );
    metrics::record_run_completed();

    Ok(RunReport {
        in_cluster: config.in_cluster,
        namespace: config.namespace.clone(),
        label_selector: config.label_selector.clone(),
        max_count: config.max_count,
        dry_run: config.dry_run,
        considered,
        malformed,
        unstarted,
        retained,
        held,
        excluded,
        execution,
    })
}

fn names(jobs: &[&JobRecord]) -> Vec<String> {
    jobs.iter().map(|job| job.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_from_janitor_config() {
        let config = JanitorConfig::from_str(
            r#"
            [cluster]
            in_cluster = false
            namespace = "reports"
            label_selector = "app=nightly"

            [retention]
            max_count = 4
            dry_run = false
            unstarted_jobs = "exclude"
        "#,
        )
        .unwrap();

        assert_eq!(
            RunConfig::from(&config),
            RunConfig {
                in_cluster: false,
                namespace: "reports".into(),
                label_selector: "app=nightly".into(),
                max_count: 4,
                dry_run: false,
                unstarted_jobs: UnstartedJobPolicy::Exclude,
            }
        );
    }
}
