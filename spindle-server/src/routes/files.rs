//! `/api/files/upload`: receives a completed rip/transcode output, stages
//! it, and hands it to the organizer.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;

use spindle_contracts::jobs::UploadResponse;
use spindle_core::organizer::{self, LibraryRoots, NullScanTrigger};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> AppResult<Json<UploadResponse>> {
    let mut name: Option<String> = None;
    let mut bytes: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::bad_request(e.to_string()))? {
        match field.name().unwrap_or_default() {
            "name" => name = Some(field.text().await.map_err(|e| AppError::bad_request(e.to_string()))?),
            "file" => bytes = Some(field.bytes().await.map_err(|e| AppError::bad_request(e.to_string()))?),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| AppError::bad_request("missing `name` field"))?;
    let bytes = bytes.ok_or_else(|| AppError::bad_request("missing `file` field"))?;

    let staging_dir = state.config.library_root.join(".incoming");
    tokio::fs::create_dir_all(&staging_dir).await.map_err(|e| AppError::internal(e.to_string()))?;
    let staged_path = staging_dir.join(&name);
    tokio::fs::write(&staged_path, &bytes).await.map_err(|e| AppError::internal(e.to_string()))?;

    let parsed = organizer::parse_upload_filename(&name);
    let metadata = match &parsed {
        organizer::ParsedUpload::Tv { show, season } => serde_json::json!({ "show": show, "season": season }),
        organizer::ParsedUpload::Movie { title, year } => serde_json::json!({ "title": title, "year": year }),
        organizer::ParsedUpload::Unrecognized => serde_json::json!(null),
    };

    let roots = LibraryRoots {
        tv_prefix: state.config.library_root.join("tv"),
        movie_prefix: state.config.library_root.join("movies"),
    };
    let final_path = organizer::organize(&staged_path, &roots, state.notifier.as_ref(), &NullScanTrigger).await?;

    Ok(Json(UploadResponse {
        path: staged_path.display().to_string(),
        organized: final_path.is_some(),
        final_path: final_path.map(|p| p.display().to_string()),
        metadata,
    }))
}
