//! Coordinator HTTP client used by both the agent and the standalone
//! remote worker binary. JSON bodies, bearer-token auth when configured.

use reqwest::{multipart, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use spindle_contracts::agents::{JobsResponse, RegisterAgentRequest, RegisterWorkerRequest};
use spindle_contracts::discs::{
    DiscDetectedRequest, DiscEjectedRequest, PreviewApproveRequest, RipRequest, RipResponse,
    RipStatusResponse, UpdateSeasonRequest,
};
use spindle_contracts::jobs::{ApproveJobRequest, CreateJobRequest, IsCancelledResponse, UpdateJobRequest, UploadResponse};
use spindle_contracts::vlc::{QueuePreviewRequest, ReportVlcResultRequest, VlcCommandsResponse};
use spindle_model::{Agent, Disc, Job, Worker};
use uuid::Uuid;

use crate::error::{Result, RuntimeError};

#[derive(Clone)]
pub struct CoordinatorClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoordinatorClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(RuntimeError::Coordinator)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(RuntimeError::CoordinatorResponse(format!("{status}: {text}")));
        }
        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                RuntimeError::CoordinatorResponse("expected a body but got 204".to_string())
            });
        }
        resp.json().await.map_err(RuntimeError::Coordinator)
    }

    pub async fn register_agent(&self, req: &RegisterAgentRequest) -> Result<Agent> {
        self.request(Method::POST, "/api/agents/register", Some(req)).await
    }

    pub async fn agent_heartbeat(&self, agent_id: &str) -> Result<()> {
        self.request::<(), serde_json::Value>(Method::POST, &format!("/api/agents/{agent_id}/heartbeat"), None)
            .await
            .map(|_| ())
    }

    pub async fn agent_jobs(&self, agent_id: &str) -> Result<Vec<Job>> {
        let resp: JobsResponse = self.request::<(), _>(Method::GET, &format!("/api/agents/{agent_id}/jobs"), None).await?;
        Ok(resp.jobs)
    }

    pub async fn register_worker(&self, req: &RegisterWorkerRequest) -> Result<Worker> {
        self.request(Method::POST, "/api/workers/register", Some(req)).await
    }

    pub async fn worker_heartbeat(&self, worker_id: &str) -> Result<()> {
        self.request::<(), serde_json::Value>(Method::POST, &format!("/api/workers/{worker_id}/heartbeat"), None)
            .await
            .map(|_| ())
    }

    pub async fn worker_jobs(&self, worker_id: &str) -> Result<Vec<Job>> {
        let resp: JobsResponse = self.request::<(), _>(Method::GET, &format!("/api/workers/{worker_id}/jobs"), None).await?;
        Ok(resp.jobs)
    }

    pub async fn disc_detected(&self, req: &DiscDetectedRequest) -> Result<Disc> {
        self.request(Method::POST, "/api/discs/detected", Some(req)).await
    }

    pub async fn disc_ejected(&self, req: &DiscEjectedRequest) -> Result<()> {
        self.request::<_, serde_json::Value>(Method::POST, "/api/discs/ejected", Some(req)).await.map(|_| ())
    }

    pub async fn get_disc(&self, disc_id: Uuid) -> Result<Disc> {
        self.request::<(), _>(Method::GET, &format!("/api/discs/{disc_id}"), None).await
    }

    pub async fn rip_status(&self, disc_id: Uuid) -> Result<RipStatusResponse> {
        self.request::<(), _>(Method::GET, &format!("/api/discs/{disc_id}/rip-status"), None).await
    }

    pub async fn approve_preview(&self, disc_id: Uuid, req: &PreviewApproveRequest) -> Result<Disc> {
        self.request(Method::POST, &format!("/api/discs/{disc_id}/preview/approve"), Some(req)).await
    }

    pub async fn reject_preview(&self, disc_id: Uuid) -> Result<Disc> {
        self.request::<(), _>(Method::POST, &format!("/api/discs/{disc_id}/preview/reject"), None).await
    }

    pub async fn update_season(&self, disc_id: Uuid, req: &UpdateSeasonRequest) -> Result<Disc> {
        self.request(Method::POST, &format!("/api/discs/{disc_id}/preview/update-season"), Some(req)).await
    }

    pub async fn rip(&self, disc_id: Uuid, req: &RipRequest) -> Result<RipResponse> {
        self.request(Method::POST, &format!("/api/discs/{disc_id}/rip"), Some(req)).await
    }

    pub async fn create_job(&self, req: &CreateJobRequest) -> Result<Job> {
        self.request(Method::POST, "/api/jobs", Some(req)).await
    }

    pub async fn update_job(&self, job_id: Uuid, req: &UpdateJobRequest) -> Result<Job> {
        self.request(Method::PATCH, &format!("/api/jobs/{job_id}"), Some(req)).await
    }

    pub async fn approve_job(&self, job_id: Uuid, req: &ApproveJobRequest) -> Result<Job> {
        self.request(Method::POST, &format!("/api/jobs/{job_id}/approve"), Some(req)).await
    }

    pub async fn cancel_job(&self, job_id: Uuid) -> Result<()> {
        self.request::<(), serde_json::Value>(Method::POST, &format!("/api/jobs/{job_id}/cancel"), None)
            .await
            .map(|_| ())
    }

    pub async fn is_cancelled(&self, job_id: Uuid) -> Result<bool> {
        let resp: IsCancelledResponse = self.request::<(), _>(Method::GET, &format!("/api/jobs/{job_id}/is-cancelled"), None).await?;
        Ok(resp.cancelled)
    }

    /// Uploads a local file with up to 3 retries and exponential backoff
    /// (5s x attempt).
    pub async fn upload_file(&self, local_path: &std::path::Path, remote_name: &str) -> Result<UploadResponse> {
        const MAX_ATTEMPTS: u32 = 3;
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.upload_once(local_path, remote_name).await {
                Ok(resp) => return Ok(resp),
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "upload attempt failed");
                    last_err = Some(err);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(std::time::Duration::from_secs(5 * attempt as u64)).await;
                    }
                }
            }
        }
        Err(last_err.expect("at least one attempt was made"))
    }

    async fn upload_once(&self, local_path: &std::path::Path, remote_name: &str) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(local_path).await.map_err(RuntimeError::Io)?;
        let part = multipart::Part::bytes(bytes).file_name(remote_name.to_string());
        let form = multipart::Form::new().text("name", remote_name.to_string()).part("file", part);

        let mut req = self.http.post(format!("{}/api/files/upload", self.base_url)).multipart(form);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(RuntimeError::Coordinator)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(RuntimeError::CoordinatorResponse(format!("{status}: {text}")));
        }
        resp.json().await.map_err(RuntimeError::Coordinator)
    }

    pub async fn queue_preview(&self, req: &QueuePreviewRequest) -> Result<()> {
        self.request::<_, serde_json::Value>(Method::POST, "/api/vlc/queue", Some(req)).await.map(|_| ())
    }

    pub async fn vlc_commands(&self, agent_id: &str) -> Result<VlcCommandsResponse> {
        self.request::<(), _>(Method::GET, &format!("/api/vlc/commands/{agent_id}"), None).await
    }

    pub async fn report_vlc_result(&self, command_id: Uuid, req: &ReportVlcResultRequest) -> Result<()> {
        self.request::<_, serde_json::Value>(Method::POST, &format!("/api/vlc/commands/{command_id}/result"), Some(req))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash_from_base_url() {
        let client = CoordinatorClient::new("http://localhost:7979/", None);
        assert_eq!(client.base_url, "http://localhost:7979");
    }
}
