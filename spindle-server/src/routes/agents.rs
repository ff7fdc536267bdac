//! `/api/agents/*`: registration, heartbeat, assigned-job polling.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use spindle_contracts::agents::{JobsResponse, RegisterAgentRequest};
use spindle_model::Agent;

use crate::errors::AppResult;
use crate::state::AppState;

pub async fn register(State(state): State<AppState>, Json(req): Json<RegisterAgentRequest>) -> AppResult<Json<Agent>> {
    let agent = state.agents.register(&req.agent_id, &req.name, req.capabilities).await?;
    Ok(Json(agent))
}

pub async fn heartbeat(State(state): State<AppState>, Path(agent_id): Path<String>) -> AppResult<Json<Value>> {
    state.agents.heartbeat(&agent_id).await?;
    Ok(Json(json!({})))
}

pub async fn jobs(State(state): State<AppState>, Path(agent_id): Path<String>) -> AppResult<Json<JobsResponse>> {
    let jobs = state.jobs.jobs_for_agent(&agent_id).await?;
    Ok(Json(JobsResponse { jobs }))
}
