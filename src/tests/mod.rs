//! Test doubles and end-to-end retention run tests.


use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::{
    api::batch::v1::{Job, JobStatus},
    apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time},
};

use crate::cluster::{ClusterError, ClusterResult, JobDeleter, JobLister};

/// In-memory cluster implementing both client capabilities.
#[derive(Default)]
pub struct FakeCluster {
    jobs: Vec<Job>,
    list_error: Option<String>,
    failing: HashSet<String>,
    list_calls: Mutex<Vec<(String, String)>>,
    delete_calls: Mutex<Vec<(String, String)>>,
}

impl FakeCluster {
    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        Self {
            jobs,
            ..Default::default()
        }
    }

    /// Make every list call fail.
    pub fn failing_list(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    /// Make deleting `name` fail.
    pub fn failing_delete(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn list_calls(&self) -> Vec<(String, String)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<(String, String)> {
        self.delete_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobLister for FakeCluster {
    async fn list_jobs(&self, namespace: &str, label_selector: &str) -> ClusterResult<Vec<Job>> {
        self.list_calls
            .lock()
            .unwrap()
            .push((namespace.to_string(), label_selector.to_string()));

        match &self.list_error {
            Some(message) => Err(ClusterError::Internal(message.clone())),
            None => Ok(self.jobs.clone()),
        }
    }
}

#[async_trait]
impl JobDeleter for FakeCluster {
    async fn delete_job(&self, namespace: &str, name: &str) -> ClusterResult<()> {
        self.delete_calls
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string()));

        if self.failing.contains(name) {
            return Err(ClusterError::Internal(format!(
                "connection reset while deleting {name}"
            )));
        }
        Ok(())
    }
}

/// Build a Kubernetes Job object as the API server would return it.
pub fn k8s_job(name: &str, start_time: Option<DateTime<Utc>>, succeeded: i32) -> Job {
    Job {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        status: Some(JobStatus {
            start_time: start_time.map(Time),
            succeeded: (succeeded > 0).then_some(succeeded),
            active: (succeeded == 0 && start_time.is_some()).then_some(1),
            ..Default::default()
        }),
        ..Default::default()
    }
}
