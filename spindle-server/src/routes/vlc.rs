//! `/api/vlc/*`: the preview-playback command channel. A poll both fetches
//! and atomically flips pending commands to `sent`.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use spindle_contracts::vlc::{QueuePreviewRequest, ReportVlcResultRequest, VlcCommandsResponse};
use spindle_model::VlcCommand;

use crate::errors::AppResult;
use crate::state::AppState;

pub async fn queue(State(state): State<AppState>, Json(req): Json<QueuePreviewRequest>) -> AppResult<Json<serde_json::Value>> {
    let command = VlcCommand::new(Uuid::new_v4(), req.agent_id, req.file_path, req.fullscreen);
    state.store.queue_vlc_command(command).await?;
    Ok(Json(serde_json::json!({})))
}

pub async fn commands(State(state): State<AppState>, Path(agent_id): Path<String>) -> AppResult<Json<VlcCommandsResponse>> {
    let commands = state.store.take_pending_vlc_commands(&agent_id).await?;
    Ok(Json(VlcCommandsResponse { commands }))
}

pub async fn report_result(
    State(state): State<AppState>,
    Path(command_id): Path<Uuid>,
    Json(req): Json<ReportVlcResultRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let mut command = state.store.get_vlc_command(command_id).await?;
    if req.success {
        command.mark_completed()?;
    } else {
        command.mark_failed(req.error.unwrap_or_else(|| "unknown error".to_string()))?;
    }
    state.store.replace_vlc_command(command).await?;
    Ok(Json(serde_json::json!({})))
}
