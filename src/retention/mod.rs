//! Job retention: decide which Jobs to remove and remove them.
//!
//! A retention run:
//! 1. Lists the Jobs matching the configured label selector
//! 2. Keeps the `max_count` most recently started Jobs unconditionally
//! 3. Deletes the older Jobs that have succeeded, oldest first
//! 4. Reports a per-job outcome for every deletion
//!
//! Jobs older than the retained window that have not succeeded yet are left
//! for a later run. Dry-run mode reports what would be deleted without
//! calling the API.

mod executor;
mod policy;
mod report;
mod worker;

pub use executor::{DeletionStatus, ExecutionReport, JobOutcome, execute};
pub use policy::{RetentionPlan, UnstartedJobPolicy, compute_delete_set, plan};
pub use report::{EXIT_DELETE_FAILURES, RunReport};
pub use worker::{RunConfig, RunError, run_retention};
