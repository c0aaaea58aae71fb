use chrono::{DateTime, Utc};
use k8s_openapi::api::batch::v1::Job;
use serde::Serialize;

/// Snapshot of one Job as observed in a single listing.
///
/// Records are built fresh at the start of every run and never mutated; the
/// retention policy only reorders and filters references to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    /// Job name, unique within the namespace.
    pub name: String,
    /// When the Job controller started the Job. `None` until it has started.
    pub start_time: Option<DateTime<Utc>>,
    /// Number of pods that completed successfully.
    pub succeeded: u32,
}

impl JobRecord {
    pub fn new(name: impl Into<String>, start_time: Option<DateTime<Utc>>, succeeded: u32) -> Self {
        Self {
            name: name.into(),
            start_time,
            succeeded,
        }
    }

    /// Whether the Job has completed successfully at least once.
    pub fn has_succeeded(&self) -> bool {
        self.succeeded >= 1
    }

    /// Whether the Job has been started by the Job controller.
    pub fn has_started(&self) -> bool {
        self.start_time.is_some()
    }
}

/// A listing entry that could not be turned into a [`JobRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MalformedJob {
    #[error("job without metadata.name (uid: {uid})")]
    MissingName { uid: String },
}

impl TryFrom<&Job> for JobRecord {
    type Error = MalformedJob;

    fn try_from(job: &Job) -> Result<Self, Self::Error> {
        let name = job
            .metadata
            .name
            .clone()
            .ok_or_else(|| MalformedJob::MissingName {
                uid: job.metadata.uid.clone().unwrap_or_else(|| "unknown".into()),
            })?;

        let status = job.status.as_ref();
        let start_time = status.and_then(|s| s.start_time.as_ref()).map(|t| t.0);
        let succeeded = status
            .and_then(|s| s.succeeded)
            .map(|n| u32::try_from(n).unwrap_or(0))
            .unwrap_or(0);

        Ok(Self {
            name,
            start_time,
            succeeded,
        })
    }
}
