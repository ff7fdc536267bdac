//! `GET /api/thumbnails/{disc_or_job_id}/{filename}`: serves a thumbnail
//! image captured during rip or transcode analysis.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub async fn get(State(state): State<AppState>, Path((owner_id, filename)): Path<(String, String)>) -> AppResult<Response> {
    let path = state.config.library_root.join(".thumbnails").join(&owner_id).join(&filename);
    let bytes = tokio::fs::read(&path).await.map_err(|_| AppError::not_found(format!("thumbnail `{filename}` not found")))?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}
