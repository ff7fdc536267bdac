//! `/api/discs/*`: detection (triggers the preview pipeline), ejection,
//! lookup, rip-status polling, preview approve/reject/update-season, and
//! rip job creation.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use spindle_contracts::discs::{
    DiscDetectedRequest, DiscEjectedRequest, PreviewApproveRequest, RipRequest, RipResponse,
    RipStatusResponse, UpdateSeasonRequest,
};
use spindle_core::preview::{PreviewConfig, PreviewPipeline};
use spindle_core::season;
use spindle_model::{Disc, DiscStatus, Job, JobStatus, JobType, PreviewStatus, Title};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Detects a disc in a drive, reusing the existing disc row when this
/// `(agent_id, drive)` already maps to one so re-detection updates a disc in
/// place rather than orphaning the prior row.
pub async fn detected(State(state): State<AppState>, Json(req): Json<DiscDetectedRequest>) -> AppResult<Json<Disc>> {
    let titles: Vec<Title> = req
        .titles
        .into_iter()
        .map(|t| {
            let mut title = Title::new(t.index, t.name, t.duration_seconds, t.size_bytes);
            title.chapters = t.chapters;
            title
        })
        .collect();

    let existing_id = state.drive_index.get(&(req.agent_id.clone(), req.drive.clone())).map(|entry| *entry.value());

    let mut disc = match existing_id {
        Some(disc_id) => {
            let mut disc = state.store.get_disc(disc_id).await?;
            disc.name = req.disc_name.clone();
            disc.disc_type = req.disc_type;
            disc.titles = titles;
            disc.status = DiscStatus::Detected;
            disc
        }
        None => {
            let mut disc = Disc::new(Uuid::new_v4(), &req.agent_id, &req.drive, &req.disc_name, req.disc_type);
            disc.titles = titles;
            state.store.insert_disc(disc.clone()).await?;
            disc
        }
    };

    let config = PreviewConfig {
        auto_approve: state.config.auto_approve_previews,
        ..Default::default()
    };
    let pipeline = PreviewPipeline::new(state.store.as_ref(), state.tv_provider.as_ref(), state.movie_provider.as_ref(), config);
    pipeline.run(&mut disc).await?;

    state.drive_index.insert((req.agent_id, req.drive), disc.id);
    Ok(Json(disc))
}

pub async fn ejected(State(state): State<AppState>, Json(req): Json<DiscEjectedRequest>) -> AppResult<Json<serde_json::Value>> {
    if let Some((_, disc_id)) = state.drive_index.remove(&(req.agent_id, req.drive)) {
        let mut disc = state.store.get_disc(disc_id).await?;
        disc.status = DiscStatus::Ejected;
        state.store.replace_disc(disc).await?;
    }
    Ok(Json(serde_json::json!({})))
}

pub async fn get(State(state): State<AppState>, Path(disc_id): Path<Uuid>) -> AppResult<Json<Disc>> {
    let disc = state.store.get_disc(disc_id).await?;
    Ok(Json(disc))
}

pub async fn rip_status(State(state): State<AppState>, Path(disc_id): Path<Uuid>) -> AppResult<Json<RipStatusResponse>> {
    let jobs = state.store.jobs_for_disc(disc_id).await?;
    let rip_jobs: Vec<Job> = jobs.into_iter().filter(|j| j.job_type == JobType::Rip).collect();
    let total = rip_jobs.len() as u32;
    let completed = rip_jobs.iter().filter(|j| j.status == JobStatus::Completed).count() as u32;
    let failed = rip_jobs.iter().filter(|j| j.status == JobStatus::Failed).count() as u32;
    Ok(Json(RipStatusResponse {
        all_rips_complete: total > 0 && completed + failed == total,
        total,
        completed,
        failed,
    }))
}

pub async fn preview_approve(
    State(state): State<AppState>,
    Path(disc_id): Path<Uuid>,
    Json(req): Json<PreviewApproveRequest>,
) -> AppResult<Json<Disc>> {
    let mut disc = state.store.get_disc(disc_id).await?;
    let edits: Vec<season::TitleEdit> = req.title_edits.into_iter().map(Into::into).collect();
    season::approve(&mut disc, &edits)?;
    let disc = state.store.replace_disc(disc).await?;
    Ok(Json(disc))
}

pub async fn preview_reject(State(state): State<AppState>, Path(disc_id): Path<Uuid>) -> AppResult<Json<Disc>> {
    let mut disc = state.store.get_disc(disc_id).await?;
    season::reject(&mut disc)?;
    let disc = state.store.replace_disc(disc).await?;
    Ok(Json(disc))
}

pub async fn preview_update_season(
    State(state): State<AppState>,
    Path(disc_id): Path<Uuid>,
    Json(req): Json<UpdateSeasonRequest>,
) -> AppResult<Json<Disc>> {
    let running = state
        .store
        .jobs_for_disc(disc_id)
        .await?
        .into_iter()
        .any(|j| j.status == JobStatus::Running);
    if running {
        return Err(AppError::bad_request("cannot update season while a job for this disc is running"));
    }

    let mut disc = state.store.get_disc(disc_id).await?;
    season::update_season(&mut disc, state.store.as_ref(), state.tv_provider.as_ref(), req.season_number, req.starting_episode).await?;
    let disc = state.store.replace_disc(disc).await?;
    Ok(Json(disc))
}

/// Creates a `rip` job per requested title (or every main title when
/// `title_indices` is omitted), auto-assigned to the disc's owning agent.
/// Rejects if the disc isn't approved, or if a rip is already running for
/// this agent (drive exclusivity, P1).
pub async fn rip(State(state): State<AppState>, Path(disc_id): Path<Uuid>, Json(req): Json<RipRequest>) -> AppResult<Json<RipResponse>> {
    let disc = state.store.get_disc(disc_id).await?;
    if !disc.can_rip() {
        let reason = match disc.preview_status {
            PreviewStatus::Rejected => "preview rejected",
            _ => "disc preview is not approved",
        };
        return Err(AppError::bad_request(reason));
    }

    let running_rip = state
        .jobs
        .jobs_for_agent(&disc.agent_id)
        .await?
        .into_iter()
        .any(|j| j.job_type == JobType::Rip && j.status == JobStatus::Running);
    if running_rip {
        return Err(AppError::conflict(format!("agent `{}` already has a rip in progress", disc.agent_id)));
    }

    let indices: Vec<u32> = match req.title_indices {
        Some(indices) => indices,
        None => disc.main_titles().map(|t| t.index).collect(),
    };

    let mut job_ids = Vec::with_capacity(indices.len());
    for index in indices {
        let mut job = Job::new(Uuid::new_v4(), JobType::Rip, 0, false);
        job.disc_id = Some(disc.id);
        job.title_index = Some(index);
        job.source_disc_name = Some(disc.name.clone());
        let job = state.jobs.create_job(job).await?;
        let job = state.jobs.auto_assign_to_agent(job.id, &disc.agent_id).await?;
        job_ids.push(job.id);
    }

    Ok(Json(RipResponse { job_ids }))
}
