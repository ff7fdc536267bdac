//! `/api/workers/*`: registration, heartbeat, assigned-job polling.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use spindle_contracts::agents::{JobsResponse, RegisterWorkerRequest};
use spindle_model::Worker;

use crate::errors::AppResult;
use crate::state::AppState;

pub async fn register(State(state): State<AppState>, Json(req): Json<RegisterWorkerRequest>) -> AppResult<Json<Worker>> {
    let worker = state
        .workers
        .register(&req.worker_id, req.worker_type, &req.hostname, req.agent_id, req.capabilities)
        .await?;
    Ok(Json(worker))
}

pub async fn heartbeat(State(state): State<AppState>, Path(worker_id): Path<String>) -> AppResult<Json<Value>> {
    state.workers.heartbeat(&worker_id).await?;
    Ok(Json(json!({})))
}

/// Jobs assigned to a worker's underlying agent. A remote worker's
/// `agent_id` is unset, so jobs approved against it are assigned to the
/// worker's own id instead (see [`spindle_core::JobQueue::approve`]).
pub async fn jobs(State(state): State<AppState>, Path(worker_id): Path<String>) -> AppResult<Json<JobsResponse>> {
    let worker = state.workers.get(&worker_id).await?;
    let effective_agent_id = worker.agent_id.unwrap_or(worker.id);
    let jobs = state.jobs.jobs_for_agent(&effective_agent_id).await?;
    Ok(Json(JobsResponse { jobs }))
}
