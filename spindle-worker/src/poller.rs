//! Transcode-only job poll loop, concurrent up to `max_concurrent_transcodes`.

use std::path::PathBuf;
use std::sync::Arc;

use spindle_contracts::jobs::UpdateJobRequest;
use spindle_model::{JobStatus, JobType};
use spindle_runtime::client::CoordinatorClient;
use spindle_runtime::subprocess::ProgressSink;
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::error::Result;
use crate::transcode::{self, TranscodeSpec};

pub struct JobPollerConfig {
    pub worker_id: String,
    pub staging_dir: PathBuf,
    pub max_concurrent_transcodes: usize,
    pub hw_encoders: Vec<String>,
}

pub struct JobPoller {
    coordinator: Arc<CoordinatorClient>,
    config: JobPollerConfig,
    slots: Arc<Semaphore>,
}

impl JobPoller {
    pub fn new(coordinator: Arc<CoordinatorClient>, config: JobPollerConfig) -> Self {
        let slots = config.max_concurrent_transcodes.max(1);
        Self { coordinator, config, slots: Arc::new(Semaphore::new(slots)) }
    }

    pub async fn poll_once(self: &Arc<Self>) -> Result<()> {
        let jobs = self.coordinator.worker_jobs(&self.config.worker_id).await?;

        for job in jobs {
            if job.status != JobStatus::Assigned || job.job_type != JobType::Transcode {
                continue;
            }
            let Ok(permit) = Arc::clone(&self.slots).try_acquire_owned() else {
                continue;
            };
            let this = Arc::clone(self);
            let job_id = job.id;
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(err) = this.run_transcode_job(job_id).await {
                    error!(job_id = %job_id, error = %err, "transcode job failed");
                }
            });
        }
        Ok(())
    }

    async fn run_transcode_job(&self, job_id: uuid::Uuid) -> Result<()> {
        let job = self
            .coordinator
            .update_job(job_id, &UpdateJobRequest { status: JobStatus::Running, progress: Some(0), error: None, output_file: None })
            .await?;
        let (Some(input_file), Some(preset)) = (job.input_file.clone(), job.preset.clone()) else {
            self.fail(job_id, "transcode job missing input_file/preset").await;
            return Ok(());
        };

        let input_path = PathBuf::from(&input_file);
        let output_path = self.config.staging_dir.join(format!("{job_id}.mkv"));
        let hw_encoder = self.config.hw_encoders.first().cloned();
        let spec = TranscodeSpec { input_file: input_path.clone(), output_file: output_path.clone(), preset, hw_encoder };

        let sink: Arc<dyn ProgressSink> = Arc::new(TranscodeProgressSink { coordinator: Arc::clone(&self.coordinator), job_id });
        let transcoder_path = PathBuf::from("HandBrakeCLI");

        match transcode::transcode(&transcoder_path, &spec, job_id, Arc::clone(&self.coordinator), sink).await {
            Ok(outcome) if outcome.cancelled => {
                self.coordinator
                    .update_job(job_id, &UpdateJobRequest { status: JobStatus::Cancelled, progress: None, error: None, output_file: None })
                    .await?;
            }
            Ok(_) => {
                let remote_name = format!("{job_id}.mkv");
                let upload = transcode::upload_and_cleanup(&self.coordinator, &input_path, &output_path, &remote_name, true, true).await;

                match upload {
                    Ok(resp) => {
                        self.coordinator
                            .update_job(job_id, &UpdateJobRequest { status: JobStatus::Completed, progress: Some(100), error: None, output_file: Some(resp.path) })
                            .await?;
                    }
                    Err(err) => {
                        warn!(job_id = %job_id, error = %err, "upload failed after retries, keeping local file");
                        self.coordinator
                            .update_job(
                                job_id,
                                &UpdateJobRequest {
                                    status: JobStatus::Completed,
                                    progress: Some(100),
                                    error: Some(format!("upload failed: {err}")),
                                    output_file: Some(output_path.display().to_string()),
                                },
                            )
                            .await?;
                    }
                }
            }
            Err(err) => self.fail(job_id, &err.to_string()).await,
        }
        Ok(())
    }

    async fn fail(&self, job_id: uuid::Uuid, message: &str) {
        let _ = self
            .coordinator
            .update_job(job_id, &UpdateJobRequest { status: JobStatus::Failed, progress: None, error: Some(message.to_string()), output_file: None })
            .await;
    }
}

struct TranscodeProgressSink {
    coordinator: Arc<CoordinatorClient>,
    job_id: uuid::Uuid,
}

#[async_trait::async_trait]
impl ProgressSink for TranscodeProgressSink {
    async fn report_rip_progress(&self, _progress: spindle_contracts::subprocess::RipProgress) {}

    async fn report_transcode_progress(&self, progress: spindle_contracts::subprocess::TranscodeProgress) {
        let percent = progress.percent.round() as u8;
        let _ = self
            .coordinator
            .update_job(self.job_id, &UpdateJobRequest { status: JobStatus::Running, progress: Some(percent), error: None, output_file: None })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_count_floors_at_one() {
        let config = JobPollerConfig { worker_id: "w".into(), staging_dir: PathBuf::from("/tmp"), max_concurrent_transcodes: 0, hw_encoders: vec![] };
        assert_eq!(config.max_concurrent_transcodes.max(1), 1);
    }
}
