//! Retention policy: decides which Jobs in a listing may be deleted.
//!
//! The decision is a pure two-stage computation over a snapshot:
//!
//! 1. Order the Jobs oldest-first by start time and split off everything
//!    beyond the `keep` most recent ones.
//! 2. Of those candidates, select only Jobs that have succeeded.
//!
//! The input slice is never reordered or mutated.

use serde::{Deserialize, Serialize};

use crate::models::JobRecord;

/// How Jobs without a start time take part in ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum UnstartedJobPolicy {
    /// Unstarted Jobs sort before every started Job. They fill delete-candidate
    /// slots rather than retention slots, and are still only deleted if they
    /// have succeeded.
    #[default]
    Oldest,
    /// Unstarted Jobs are left out of the ordering entirely. They do not count
    /// toward the listing size and are never deleted.
    Exclude,
}

/// Outcome of applying the policy to one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPlan<'a> {
    /// Jobs to delete, oldest first.
    pub delete: Vec<&'a JobRecord>,
    /// The most recent Jobs, always kept.
    pub retained: Vec<&'a JobRecord>,
    /// Jobs outside the retained window that have not succeeded yet.
    pub held: Vec<&'a JobRecord>,
    /// Jobs left out of the ordering by [`UnstartedJobPolicy::Exclude`].
    pub excluded: Vec<&'a JobRecord>,
}

/// Compute the ordered delete-set for a listing.
///
/// Equivalent to `plan(jobs, keep, unstarted).delete`.
pub fn compute_delete_set(
    jobs: &[JobRecord],
    keep: usize,
    unstarted: UnstartedJobPolicy,
) -> Vec<&JobRecord> {
    plan(jobs, keep, unstarted).delete
}

/// Apply the retention policy to a listing snapshot.
pub fn plan(jobs: &[JobRecord], keep: usize, unstarted: UnstartedJobPolicy) -> RetentionPlan<'_> {
    let (mut ordered, excluded): (Vec<&JobRecord>, Vec<&JobRecord>) = match unstarted {
        UnstartedJobPolicy::Oldest => (jobs.iter().collect(), Vec::new()),
        UnstartedJobPolicy::Exclude => jobs.iter().partition(|job| job.has_started()),
    };

    // `None < Some(_)` puts unstarted Jobs first; `sort_by_key` is stable so
    // equal start times keep listing order.
    ordered.sort_by_key(|job| job.start_time);

    let excess = ordered.len().saturating_sub(keep);
    let retained = ordered.split_off(excess);
    let (delete, held): (Vec<_>, Vec<_>) =
        ordered.into_iter().partition(|job| job.has_succeeded());

    RetentionPlan {
        delete,
        retained,
        held,
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::rstest;

    use super::*;

    fn at(minute: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, minute, 0).unwrap())
    }

    fn job(name: &str, start: Option<DateTime<Utc>>, succeeded: u32) -> JobRecord {
        JobRecord::new(name, start, succeeded)
    }

    fn names(jobs: &[&JobRecord]) -> Vec<String> {
        jobs.iter().map(|j| j.name.clone()).collect()
    }

    /// Five succeeded Jobs listed newest-first, so ordering has work to do.
    fn five_succeeded() -> Vec<JobRecord> {
        vec![
            job("t5", at(5), 1),
            job("t3", at(3), 1),
            job("t1", at(1), 1),
            job("t4", at(4), 1),
            job("t2", at(2), 1),
        ]
    }

    #[test]
    fn test_deletes_oldest_beyond_keep() {
        let jobs = five_succeeded();
        let delete = compute_delete_set(&jobs, 3, UnstartedJobPolicy::Oldest);
        assert_eq!(names(&delete), vec!["t1", "t2"]);
    }

    #[test]
    fn test_keep_exceeds_listing() {
        let jobs = five_succeeded();
        assert!(compute_delete_set(&jobs, 10, UnstartedJobPolicy::Oldest).is_empty());
    }

    #[test]
    fn test_keep_zero_deletes_everything_succeeded() {
        let jobs = vec![job("c", at(3), 2), job("a", at(1), 1), job("b", at(2), 1)];
        let delete = compute_delete_set(&jobs, 0, UnstartedJobPolicy::Oldest);
        assert_eq!(names(&delete), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_running_job_outside_window_is_held() {
        let jobs = vec![
            job("running", at(1), 0),
            job("done", at(2), 1),
            job("recent-1", at(3), 1),
            job("recent-2", at(4), 0),
        ];
        let plan = plan(&jobs, 2, UnstartedJobPolicy::Oldest);
        assert_eq!(names(&plan.delete), vec!["done"]);
        assert_eq!(names(&plan.held), vec!["running"]);
        assert_eq!(names(&plan.retained), vec!["recent-1", "recent-2"]);
    }

    #[test]
    fn test_empty_listing() {
        let plan = plan(&[], 3, UnstartedJobPolicy::Oldest);
        assert!(plan.delete.is_empty());
        assert!(plan.retained.is_empty());
        assert!(plan.held.is_empty());
    }

    #[test]
    fn test_equal_start_times_keep_listing_order() {
        let jobs = vec![
            job("b", at(1), 1),
            job("a", at(1), 1),
            job("c", at(1), 1),
            job("newest", at(9), 1),
        ];
        let delete = compute_delete_set(&jobs, 1, UnstartedJobPolicy::Oldest);
        assert_eq!(names(&delete), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_unstarted_sorts_first_and_is_held() {
        let jobs = vec![
            job("old", at(1), 1),
            job("pending", None, 0),
            job("new", at(2), 1),
        ];
        let plan = plan(&jobs, 1, UnstartedJobPolicy::Oldest);
        assert_eq!(names(&plan.held), vec!["pending"]);
        assert_eq!(names(&plan.delete), vec!["old"]);
        assert_eq!(names(&plan.retained), vec!["new"]);
        assert!(plan.excluded.is_empty());
    }

    #[test]
    fn test_unstarted_excluded_from_count() {
        let jobs = vec![
            job("pending", None, 0),
            job("old", at(1), 1),
            job("new", at(2), 1),
        ];
        let plan = plan(&jobs, 2, UnstartedJobPolicy::Exclude);
        assert!(plan.delete.is_empty());
        assert_eq!(names(&plan.retained), vec!["old", "new"]);
        assert_eq!(names(&plan.excluded), vec!["pending"]);
    }

    #[test]
    fn test_excluded_unstarted_never_deleted_even_if_succeeded() {
        let jobs = vec![job("odd", None, 1), job("a", at(1), 1)];
        let delete = compute_delete_set(&jobs, 0, UnstartedJobPolicy::Exclude);
        assert_eq!(names(&delete), vec!["a"]);
    }

    #[test]
    fn test_input_not_mutated_and_idempotent() {
        let jobs = five_succeeded();
        let before = jobs.clone();

        let first = names(&compute_delete_set(&jobs, 2, UnstartedJobPolicy::Oldest));
        let second = names(&compute_delete_set(&jobs, 2, UnstartedJobPolicy::Oldest));

        assert_eq!(jobs, before);
        assert_eq!(first, second);
    }

    /// A mixed listing: some running, one unstarted, out of order.
    fn mixed() -> Vec<JobRecord> {
        vec![
            job("j6", at(6), 1),
            job("j2", at(2), 0),
            job("j4", at(4), 1),
            job("pending", None, 0),
            job("j1", at(1), 1),
            job("j5", at(5), 0),
            job("j3", at(3), 3),
        ]
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(3)]
    #[case(6)]
    #[case(7)]
    #[case(20)]
    fn test_policy_bounds(
        #[case] keep: usize,
        #[values(UnstartedJobPolicy::Oldest, UnstartedJobPolicy::Exclude)]
        unstarted: UnstartedJobPolicy,
    ) {
        let jobs = mixed();
        let plan = plan(&jobs, keep, unstarted);
        let ordered_len = jobs.len() - plan.excluded.len();

        // Never more than the excess.
        assert!(plan.delete.len() <= ordered_len.saturating_sub(keep));

        // Only succeeded Jobs are deleted.
        assert!(plan.delete.iter().all(|j| j.has_succeeded()));

        // The newest `min(keep, len)` started Jobs are never deleted.
        let mut started: Vec<&JobRecord> = jobs.iter().filter(|j| j.has_started()).collect();
        started.sort_by_key(|j| j.start_time);
        let newest = &started[started.len().saturating_sub(keep.min(ordered_len))..];
        for kept in newest {
            assert!(!plan.delete.iter().any(|d| d.name == kept.name));
        }

        // Delete-set is oldest first.
        assert!(
            plan.delete
                .windows(2)
                .all(|w| w[0].start_time <= w[1].start_time)
        );

        // Every Job lands in exactly one bucket.
        assert_eq!(
            plan.delete.len() + plan.retained.len() + plan.held.len() + plan.excluded.len(),
            jobs.len()
        );
    }
}
