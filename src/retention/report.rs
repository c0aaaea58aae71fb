//! Human- and machine-readable summary of a retention run.

use std::fmt;

use serde::Serialize;

use super::executor::{DeletionStatus, ExecutionReport};
use crate::models::{JobRecord, MalformedJob};

/// Exit code for a run whose deletions partly failed, when configured to
/// surface that as a failure.
pub const EXIT_DELETE_FAILURES: i32 = 2;

/// Everything a single run observed and did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub in_cluster: bool,
    pub namespace: String,
    pub label_selector: String,
    pub max_count: usize,
    pub dry_run: bool,
    /// Every valid Job in the listing, in listing order.
    pub considered: Vec<JobRecord>,
    /// Listing entries that could not be read.
    pub malformed: Vec<MalformedJob>,
    /// Names of Jobs without a start time.
    pub unstarted: Vec<String>,
    /// Names of the most recent Jobs that are always kept.
    pub retained: Vec<String>,
    /// Names of Jobs outside the retained window that have not succeeded.
    pub held: Vec<String>,
    /// Names of unstarted Jobs left out of the ordering.
    pub excluded: Vec<String>,
    pub execution: ExecutionReport,
}

impl RunReport {
    /// One-line summary separating simulated runs from real ones.
    pub fn summary(&self) -> String {
        if self.dry_run {
            format!(
                "Dry run, no action taken: {} job(s) would be deleted",
                self.execution.simulated()
            )
        } else {
            format!(
                "Executed {} deletion(s), {} failed",
                self.execution.attempted(),
                self.execution.failed()
            )
        }
    }

    /// Process exit code for a completed run.
    ///
    /// Per-job deletion failures only change the exit code when
    /// `fail_on_delete_error` is set.
    pub fn exit_code(&self, fail_on_delete_error: bool) -> i32 {
        if fail_on_delete_error && self.execution.has_failures() {
            EXIT_DELETE_FAILURES
        } else {
            0
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "In-cluster: {}", self.in_cluster)?;
        writeln!(f, "Namespace: {}", self.namespace)?;
        writeln!(f, "Label selector: {}", self.label_selector)?;
        writeln!(f, "Dry run: {}", self.dry_run)?;
        writeln!(f, "Max count: {}", self.max_count)?;
        writeln!(f)?;

        writeln!(
            f,
            "There are {} jobs with matching label in the cluster.",
            self.considered.len() + self.malformed.len()
        )?;
        writeln!(f)?;
        for job in &self.considered {
            let start = job
                .start_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "<not started>".into());
            writeln!(
                f,
                "Job Name: {}, Succeeded: {}, Start time: {}",
                job.name, job.succeeded, start
            )?;
        }
        for malformed in &self.malformed {
            writeln!(f, "Skipped malformed job: {malformed}")?;
        }
        writeln!(f)?;

        write_names(f, "Retained", &self.retained)?;
        write_names(f, "Held back (not yet succeeded)", &self.held)?;
        write_names(f, "Not started", &self.unstarted)?;
        write_names(f, "Excluded (not started)", &self.excluded)?;

        if !self.execution.outcomes.is_empty() {
            writeln!(f)?;
        }
        for outcome in &self.execution.outcomes {
            match &outcome.status {
                DeletionStatus::Simulated => writeln!(
                    f,
                    "Deleting job {}. Dry run is enabled. Not deleting job.",
                    outcome.name
                )?,
                DeletionStatus::Deleted => writeln!(f, "Deleted job {}.", outcome.name)?,
                DeletionStatus::Failed { reason } => {
                    writeln!(f, "Failed to delete job {}: {}", outcome.name, reason)?
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "{}", self.summary())?;
        write!(f, "Done.")
    }
}

fn write_names(f: &mut fmt::Formatter<'_>, label: &str, names: &[String]) -> fmt::Result {
    if names.is_empty() {
        return Ok(());
    }
    writeln!(f, "{} ({}): {}", label, names.len(), names.join(", "))
}
