//! `/api/jobs/*`: transcode job creation, status updates, approval,
//! cancellation, and the worker-side cancellation poll.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use spindle_contracts::jobs::{ApproveJobRequest, CreateJobRequest, IsCancelledResponse, UpdateJobRequest};
use spindle_model::{Job, JobType};

use crate::errors::AppResult;
use crate::state::AppState;

pub async fn create(State(state): State<AppState>, Json(req): Json<CreateJobRequest>) -> AppResult<Json<Job>> {
    let mut job = Job::new(Uuid::new_v4(), JobType::Transcode, req.priority, req.requires_approval);
    job.disc_id = req.disc_id;
    job.title_index = req.title_index;
    job.input_file = req.input_file;
    job.preset = req.preset;
    job.thumbnails = req.thumbnails;
    job.thumbnail_timestamps = req.thumbnail_timestamps;
    let job = state.jobs.create_job(job).await?;
    Ok(Json(job))
}

pub async fn update(State(state): State<AppState>, Path(job_id): Path<Uuid>, Json(req): Json<UpdateJobRequest>) -> AppResult<Json<Job>> {
    let job = state.jobs.update(job_id, req.status, req.progress, req.error, req.output_file).await?;
    if job.status.is_terminal() {
        release_worker_slot(&state, &job).await?;
    }
    Ok(Json(job))
}

/// A terminal job frees the worker slot that was holding it, recording a
/// duration sample for `fastest-first` assignment when one ran to completion.
async fn release_worker_slot(state: &AppState, job: &Job) -> AppResult<()> {
    let Some(worker) = state.workers.get_all().await?.into_iter().find(|w| w.current_jobs.contains(&job.id)) else {
        return Ok(());
    };
    let duration_s = match (job.started_at, job.completed_at) {
        (Some(started), Some(completed)) => (completed - started).num_milliseconds() as f64 / 1000.0,
        _ => 0.0,
    };
    state.workers.complete_job(&worker.id, job.id, duration_s).await?;
    Ok(())
}

pub async fn approve(State(state): State<AppState>, Path(job_id): Path<Uuid>, Json(req): Json<ApproveJobRequest>) -> AppResult<Json<Job>> {
    let job = state.jobs.approve(job_id, &req.worker_id, &req.preset, req.output_name).await?;
    Ok(Json(job))
}

pub async fn cancel(State(state): State<AppState>, Path(job_id): Path<Uuid>) -> AppResult<Json<serde_json::Value>> {
    state.jobs.cancel(job_id).await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn is_cancelled(State(state): State<AppState>, Path(job_id): Path<Uuid>) -> AppResult<Json<IsCancelledResponse>> {
    let cancelled = state.jobs.is_cancelled(job_id).await?;
    Ok(Json(IsCancelledResponse { cancelled }))
}
