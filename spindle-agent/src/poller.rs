//! Job poll loop: single-flight rip execution, concurrent transcode
//! execution up to `max_concurrent_transcodes`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use spindle_contracts::discs::DiscEjectedRequest;
use spindle_contracts::jobs::{CreateJobRequest, UpdateJobRequest};
use spindle_model::{Disc, Job, JobStatus, JobType, PreviewStatus};
use spindle_runtime::client::CoordinatorClient;
use spindle_runtime::subprocess::ProgressSink;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::makemkv::MakeMkv;
use crate::rip;
use crate::thumbnails;
use crate::transcode::{self, TranscodeSpec};

pub struct JobPollerConfig {
    pub agent_id: String,
    pub staging_dir: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub thumbnail_offsets: Vec<u64>,
    pub max_concurrent_transcodes: usize,
    pub cleanup_after_upload: bool,
    /// Hardware encoder tags available on this host, preferred over
    /// software encoding when present.
    pub hw_encoders: Vec<String>,
}

pub struct JobPoller {
    coordinator: Arc<CoordinatorClient>,
    makemkv: Arc<MakeMkv>,
    config: JobPollerConfig,
    /// Single-flight guard: only one rip job runs at a time per agent.
    rip_in_progress: AtomicBool,
    transcode_slots: Arc<Semaphore>,
}

impl JobPoller {
    pub fn new(coordinator: Arc<CoordinatorClient>, makemkv: Arc<MakeMkv>, config: JobPollerConfig) -> Self {
        let slots = config.max_concurrent_transcodes.max(1);
        Self {
            coordinator,
            makemkv,
            config,
            rip_in_progress: AtomicBool::new(false),
            transcode_slots: Arc::new(Semaphore::new(slots)),
        }
    }

    pub async fn poll_once(self: &Arc<Self>) -> Result<()> {
        let jobs = self.coordinator.agent_jobs(&self.config.agent_id).await?;

        for job in jobs {
            if job.status != JobStatus::Assigned {
                continue;
            }
            match job.job_type {
                JobType::Rip => {
                    if self.rip_in_progress.swap(true, Ordering::SeqCst) {
                        continue;
                    }
                    let this = Arc::clone(self);
                    let job_id = job.id;
                    tokio::spawn(async move {
                        if let Err(err) = this.run_rip_job(job).await {
                            error!(job_id = %job_id, error = %err, "rip job failed");
                        }
                        this.rip_in_progress.store(false, Ordering::SeqCst);
                    });
                    // single-flight: stop scanning further rip jobs this poll
                    break;
                }
                JobType::Transcode => {
                    let Ok(permit) = Arc::clone(&self.transcode_slots).try_acquire_owned() else {
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
                JobType::Organize => {}
            }
        }
        Ok(())
    }

    async fn run_rip_job(&self, job: Job) -> Result<()> {
        let job_id = job.id;
        let Some(disc_id) = job.disc_id else {
            self.fail(job_id, "rip job has no associated disc").await;
            return Ok(());
        };
        let disc: Disc = self.coordinator.get_disc(disc_id).await?;

        // the disc's preview decision gates the assigned -> running edge: a
        // job must never run against an unapproved disc.
        match disc.preview_status {
            PreviewStatus::Pending => {
                // redelivered once the preview is decided
                self.coordinator
                    .update_job(job_id, &UpdateJobRequest { status: JobStatus::Pending, progress: Some(0), error: None, output_file: None })
                    .await?;
                return Ok(());
            }
            PreviewStatus::Rejected => {
                self.fail(job_id, "disc preview was rejected").await;
                return Ok(());
            }
            PreviewStatus::Approved => {}
        }

        self.coordinator
            .update_job(job_id, &UpdateJobRequest { status: JobStatus::Running, progress: Some(0), error: None, output_file: None })
            .await?;

        let Some(title_index) = job.title_index else {
            self.fail(job_id, "rip job has no title index").await;
            return Ok(());
        };
        let Some(title) = disc.titles.iter().find(|t| t.index == title_index).cloned() else {
            self.fail(job_id, "title not found on disc").await;
            return Ok(());
        };

        let output_dir = self.config.staging_dir.join(disc_id.to_string());
        let sink: Arc<dyn ProgressSink> = Arc::new(RipProgressSink { coordinator: Arc::clone(&self.coordinator), job_id });

        let outcome = match rip::rip_title(&self.makemkv, &disc.drive, title_index, &output_dir, sink).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.fail(job_id, &err.to_string()).await;
                return Ok(());
            }
        };

        let final_name = title.proposed_filename.clone().unwrap_or_else(|| format!("title_{title_index}.mkv"));
        let final_path = output_dir.join(&final_name);
        if outcome.output_file != final_path {
            let _ = tokio::fs::rename(&outcome.output_file, &final_path).await;
        }

        let thumbs = thumbnails::extract_thumbnails(&self.config.ffmpeg_path, &final_path, title.duration_seconds, &self.config.thumbnail_offsets)
            .await
            .unwrap_or_default();

        self.coordinator
            .update_job(
                job_id,
                &UpdateJobRequest {
                    status: JobStatus::Completed,
                    progress: Some(100),
                    error: None,
                    output_file: Some(final_path.display().to_string()),
                },
            )
            .await?;

        // downstream transcode job, requiring operator approval
        let _ = self
            .coordinator
            .create_job(&CreateJobRequest {
                disc_id: Some(disc_id),
                title_index: Some(title_index),
                input_file: Some(final_path.display().to_string()),
                preset: None,
                priority: 0,
                requires_approval: true,
                thumbnails: thumbs.iter().map(|t| t.jpeg_base64.clone()).collect(),
                thumbnail_timestamps: thumbs.iter().map(|t| t.timestamp_seconds).collect(),
            })
            .await;

        if let Ok(status) = self.coordinator.rip_status(disc_id).await {
            if status.all_rips_complete {
                info!(disc_id = %disc_id, "all rips complete for disc, requesting eject");
                let _ = self.coordinator.disc_ejected(&DiscEjectedRequest { agent_id: self.config.agent_id.clone(), drive: disc.drive.clone() }).await;
            }
        }

        Ok(())
    }

    async fn run_transcode_job(&self, job_id: uuid::Uuid) -> Result<()> {
        let job = self.coordinator.update_job(job_id, &UpdateJobRequest { status: JobStatus::Running, progress: Some(0), error: None, output_file: None }).await?;
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
                let upload = transcode::upload_and_cleanup(
                    &self.coordinator,
                    &input_path,
                    &output_path,
                    &remote_name,
                    true,
                    self.config.cleanup_after_upload,
                )
                .await;

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

struct RipProgressSink {
    coordinator: Arc<CoordinatorClient>,
    job_id: uuid::Uuid,
}

#[async_trait::async_trait]
impl ProgressSink for RipProgressSink {
    async fn report_rip_progress(&self, progress: spindle_contracts::subprocess::RipProgress) {
        let percent = progress.percent().round() as u8;
        let _ = self
            .coordinator
            .update_job(self.job_id, &UpdateJobRequest { status: JobStatus::Running, progress: Some(percent), error: None, output_file: None })
            .await;
    }

    async fn report_transcode_progress(&self, _progress: spindle_contracts::subprocess::TranscodeProgress) {}
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
    fn semaphore_slot_count_matches_config_minimum_one() {
        let config = JobPollerConfig {
            agent_id: "a".into(),
            staging_dir: PathBuf::from("/tmp"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            thumbnail_offsets: vec![],
            max_concurrent_transcodes: 0,
            cleanup_after_upload: true,
            hw_encoders: vec![],
        };
        assert_eq!(config.max_concurrent_transcodes.max(1), 1);
    }
}
