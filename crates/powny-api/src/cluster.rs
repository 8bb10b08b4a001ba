//! Read-only cluster views and job control

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::client::{ApiClient, reject_conflict};

const JOBS_PATH: &str = "/v1/jobs";

/// Cluster health as reported by the service. Fetched on demand, never
/// cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterState(pub BTreeMap<String, Value>);

/// One entry of the job listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Whatever else the service reports for the job
    #[serde(flatten)]
    pub details: BTreeMap<String, Value>,
}

impl JobSummary {
    pub fn status_or_unknown(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }
}

pub struct ClusterControlClient {
    client: ApiClient,
}

impl ClusterControlClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn cluster_info(&self) -> Result<ClusterState> {
        self.client.get_json("cluster info", "/v1/system/state")
    }

    /// Job id → summary, ordered by id
    pub fn list_jobs(&self) -> Result<BTreeMap<String, JobSummary>> {
        self.client.get_json("list jobs", JOBS_PATH)
    }

    /// Ask the cluster to terminate `job_id`.
    ///
    /// Success only means the job is marked for termination; it may still be
    /// running when this returns.
    pub fn terminate_job(&self, job_id: &str) -> Result<()> {
        let url = self.client.segment_url("terminate job", JOBS_PATH, job_id)?;
        let response = self.client.delete("terminate job", &url)?;
        reject_conflict("terminate job", &url, response)?;
        tracing::info!(job_id, "job marked for termination");
        Ok(())
    }
}
