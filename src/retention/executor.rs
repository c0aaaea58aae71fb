//! Applies a delete-set to the cluster.
//!
//! Jobs are processed strictly in the order given, one at a time. Each Job is
//! attempted at most once and ends in exactly one terminal state: simulated
//! (dry run), deleted, or failed. A failed delete is recorded and the next Job
//! is processed; nothing is retried.

use serde::Serialize;

use crate::{cluster::JobDeleter, models::JobRecord, observability::metrics};

/// Terminal state of one Job in the delete-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeletionStatus {
    /// Dry run: the delete call was not made.
    Simulated,
    /// The delete call succeeded.
    Deleted,
    /// The delete call returned an error.
    Failed { reason: String },
}

impl DeletionStatus {
    /// Label used for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionStatus::Simulated => "simulated",
            DeletionStatus::Deleted => "deleted",
            DeletionStatus::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: DeletionStatus,
}

/// Per-job results of applying a delete-set, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub outcomes: Vec<JobOutcome>,
}

impl ExecutionReport {
    pub fn simulated(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Simulated))
    }

    pub fn deleted(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Deleted))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Failed { .. }))
    }

    /// Number of delete calls actually made.
    pub fn attempted(&self) -> usize {
        self.deleted() + self.failed()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&DeletionStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Delete (or simulate deleting) every Job in `delete_set`.
pub async fn execute(
    delete_set: &[&JobRecord],
    namespace: &str,
    dry_run: bool,
    deleter: &dyn JobDeleter,
) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    for job in delete_set {
        let status = if dry_run {
            tracing::info!(
                job = %job.name,
                namespace,
                "DRY RUN: Would delete job {}",
                job.name
            );
            DeletionStatus::Simulated
        } else {
            match deleter.delete_job(namespace, &job.name).await {
                Ok(()) => {
                    tracing::info!(job = %job.name, namespace, "Deleted job");
                    DeletionStatus::Deleted
                }
                Err(e) => {
                    tracing::error!(
                        job = %job.name,
                        namespace,
                        error = %e,
                        "Failed to delete job, continuing with remaining jobs"
                    );
                    DeletionStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        };

        metrics::record_job_deletion(status.as_str());
        report.outcomes.push(JobOutcome {
            name: job.name.clone(),
            status,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::tests::FakeCluster;

    fn records() -> Vec<JobRecord> {
        (1..=3)
            .map(|i| {
                JobRecord::new(
                    format!("job-{i}"),
                    Some(Utc.with_ymd_and_hms(2024, 1, i, 0, 0, 0).unwrap()),
                    1,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_dry_run_never_calls_deleter() {
        let jobs = records();
        let set: Vec<&JobRecord> = jobs.iter().take(2).collect();
        let cluster = FakeCluster::default();

        let report = execute(&set, "batch", true, &cluster).await;

        assert!(cluster.delete_calls().is_empty());
        assert_eq!(report.simulated(), 2);
        assert_eq!(report.attempted(), 0);
        assert_eq!(
            report.outcomes,
            vec![
                JobOutcome {
                    name: "job-1".into(),
                    status: DeletionStatus::Simulated
                },
                JobOutcome {
                    name: "job-2".into(),
                    status: DeletionStatus::Simulated
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_live_deletes_each_job_once_in_order() {
        let jobs = records();
        let set: Vec<&JobRecord> = jobs.iter().collect();
        let cluster = FakeCluster::default();

        let report = execute(&set, "batch", false, &cluster).await;

        assert_eq!(
            cluster.delete_calls(),
            vec![
                ("batch".to_string(), "job-1".to_string()),
                ("batch".to_string(), "job-2".to_string()),
                ("batch".to_string(), "job-3".to_string()),
            ]
        );
        assert_eq!(report.deleted(), 3);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_jobs() {
        let jobs = records();
        let set: Vec<&JobRecord> = jobs.iter().take(2).collect();
        let cluster = FakeCluster::default().failing_delete("job-1");

        let report = execute(&set, "batch", false, &cluster).await;

        assert_eq!(cluster.delete_calls().len(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.deleted(), 1);
        assert!(matches!(
            &report.outcomes[0].status,
            DeletionStatus::Failed { reason } if reason.contains("job-1")
        ));
        assert_eq!(report.outcomes[1].status, DeletionStatus::Deleted);
    }

    #[tokio::test]
    async fn test_empty_delete_set() {
        let cluster = FakeCluster::default();
        let report = execute(&[], "batch", false, &cluster).await;
        assert!(report.outcomes.is_empty());
        assert!(cluster.delete_calls().is_empty());
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = JobOutcome {
            name: "job-1".into(),
            status: DeletionStatus::Failed {
                reason: "boom".into(),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "job-1", "status": "failed", "reason": "boom"})
        );
    }
}
