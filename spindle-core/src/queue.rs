//! Job creation, approval, assignment, and lifecycle updates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use spindle_model::{AssignmentStrategy, Job, JobStatus, JobType, Worker};

use crate::error::AssignmentError;
use crate::store::Store;

/// Filters applied at approval-time assignment before a strategy picks
/// among the survivors.
#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub prefer_gpu: bool,
    pub require_codec: Option<String>,
}

/// Job queue and assignment engine. Stateless aside from the round-robin
/// cursor, which is process-local — acceptable because the coordinator is
/// explicitly a single logical instance.
pub struct JobQueue<S: Store + ?Sized> {
    store: Arc<S>,
    round_robin_cursor: AtomicUsize,
}

impl<S: Store + ?Sized> JobQueue<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            round_robin_cursor: AtomicUsize::new(0),
        }
    }

    pub async fn create_job(&self, mut job: Job) -> Result<Job, AssignmentError> {
        job.status = JobStatus::Pending;
        Ok(self.store.insert_job(job).await?)
    }

    /// Auto-assignment for non-transcode jobs (e.g. rip): always the agent
    /// that owns the target disc.
    pub async fn auto_assign_to_agent(&self, job_id: Uuid, agent_id: &str) -> Result<Job, AssignmentError> {
        let mut job = self.store.get_job(job_id).await?;
        job.assigned_agent_id = Some(agent_id.to_string());
        job.assigned_at = Some(Utc::now());
        job.transition(JobStatus::Queued).ok();
        job.transition(JobStatus::Assigned)?;
        Ok(self.store.replace_job(job).await?)
    }

    /// Approval of a pending transcode job: resolves the target agent from
    /// the worker, picks the worker by strategy if `worker_id` is empty,
    /// and flips the job to `assigned`.
    pub async fn approve(
        &self,
        job_id: Uuid,
        worker_id: &str,
        preset: &str,
        output_name: Option<String>,
    ) -> Result<Job, AssignmentError> {
        let mut job = self.store.get_job(job_id).await?;
        if job.status != JobStatus::Pending || !job.requires_approval || job.job_type != JobType::Transcode {
            return Err(AssignmentError::NotAwaitingApproval(job_id));
        }
        let worker = self.store.get_worker(worker_id).await?;
        let agent_id = worker.agent_id.clone().unwrap_or_else(|| worker.id.clone());
        job.approve(agent_id.clone(), preset.to_string(), output_name).map_err(crate::error::StoreError::from)?;
        let job = self.store.replace_job(job).await?;
        self.store.add_worker_job(&worker.id, job.id).await?;
        Ok(job)
    }

    /// Picks a worker using the configured strategy, applying the GPU/codec
    /// filter first and falling back to the unfiltered candidate set if it
    /// would otherwise leave nothing.
    pub async fn select_worker(&self, strategy: AssignmentStrategy, filter: &AssignmentFilter) -> Result<Worker, AssignmentError> {
        let all = self.store.list_workers().await?;
        let eligible: Vec<&Worker> = all.iter().filter(|w| w.has_capacity()).collect();
        if eligible.is_empty() {
            return Err(AssignmentError::NoEligibleWorker);
        }

        let mut filtered: Vec<&Worker> = eligible.clone();
        if filter.prefer_gpu {
            let gpu_only: Vec<&Worker> = filtered.iter().copied().filter(|w| w.is_gpu_capable()).collect();
            if !gpu_only.is_empty() {
                filtered = gpu_only;
            }
        }
        if let Some(codec) = &filter.require_codec {
            let codec_only: Vec<&Worker> = filtered.iter().copied().filter(|w| w.supports_codec(codec)).collect();
            if !codec_only.is_empty() {
                filtered = codec_only;
            }
        }
        if filtered.is_empty() {
            filtered = eligible;
        }

        let chosen = match strategy {
            AssignmentStrategy::Priority => filtered.into_iter().min_by_key(|w| w.priority),
            AssignmentStrategy::LoadBalance => filtered.into_iter().min_by_key(|w| w.current_jobs.len()),
            AssignmentStrategy::FastestFirst => filtered.into_iter().min_by(|a, b| {
                let a_dur = a.stats.avg_duration_s.unwrap_or(f64::MAX);
                let b_dur = b.stats.avg_duration_s.unwrap_or(f64::MAX);
                a_dur.partial_cmp(&b_dur).unwrap_or(std::cmp::Ordering::Equal)
            }),
            AssignmentStrategy::RoundRobin => {
                let idx = self.round_robin_cursor.fetch_add(1, Ordering::Relaxed) % filtered.len();
                Some(filtered[idx])
            }
        };
        chosen.cloned().ok_or(AssignmentError::NoEligibleWorker)
    }

    /// Jobs assigned to `agent_id` and currently pollable.
    pub async fn jobs_for_agent(&self, agent_id: &str) -> Result<Vec<Job>, AssignmentError> {
        Ok(self.store.jobs_for_agent(agent_id, &[JobStatus::Assigned, JobStatus::Running]).await?)
    }

    pub async fn update(
        &self,
        job_id: Uuid,
        status: JobStatus,
        progress: Option<u8>,
        error: Option<String>,
        output_file: Option<String>,
    ) -> Result<Job, AssignmentError> {
        let mut job = self.store.get_job(job_id).await?;
        if status != job.status {
            job.transition(status)?;
        }
        if let Some(progress) = progress {
            job.progress = progress;
        }
        if let Some(error) = error {
            job.error = Some(error);
        }
        if let Some(output_file) = output_file {
            job.output_file = Some(output_file);
        }
        let job = self.store.replace_job(job).await?;
        if job.status.is_terminal() {
            if let Some(agent_id) = &job.assigned_agent_id {
                self.store.set_agent_current_job(agent_id, None).await.ok();
            }
        }
        Ok(job)
    }

    pub async fn cancel(&self, job_id: Uuid) -> Result<Job, AssignmentError> {
        let mut job = self.store.get_job(job_id).await?;
        if job.status.is_terminal() {
            return Err(AssignmentError::AlreadyTerminal(job_id));
        }
        job.transition(JobStatus::Cancelled)?;
        Ok(self.store.replace_job(job).await?)
    }

    pub async fn is_cancelled(&self, job_id: Uuid) -> Result<bool, AssignmentError> {
        Ok(self.store.get_job(job_id).await?.status == JobStatus::Cancelled)
    }
}
