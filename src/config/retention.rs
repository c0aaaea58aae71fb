//! Job retention configuration.
//!
//! # Example
//!
//! ```toml
//! [retention]
//! max_count = 10
//! dry_run = false
//! unstarted_jobs = "oldest"
//! fail_on_delete_error = true
//! ```

use serde::{Deserialize, Serialize};

use crate::retention::UnstartedJobPolicy;

/// Job retention configuration.
///
/// Controls how many Jobs are kept and whether deletions are real.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Number of most recently started Jobs to always keep, regardless of
    /// whether they succeeded. 0 makes every succeeded Job eligible.
    /// Default: 10
    #[serde(default = "default_max_count")]
    pub max_count: usize,

    /// If true, log and report what would be deleted without deleting.
    /// Default: true (must be explicitly disabled)
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// How Jobs that have not started yet are ordered.
    /// Default: oldest
    #[serde(default)]
    pub unstarted_jobs: UnstartedJobPolicy,

    /// Exit with a non-zero status when any individual deletion fails.
    /// The remaining deletions are still attempted either way.
    /// Default: false
    #[serde(default)]
    pub fail_on_delete_error: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_count: default_max_count(),
            dry_run: default_dry_run(),
            unstarted_jobs: UnstartedJobPolicy::default(),
            fail_on_delete_error: false,
        }
    }
}

fn default_max_count() -> usize {
    10
}

fn default_dry_run() -> bool {
    true
}
