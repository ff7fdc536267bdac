//! HTTP route tree for the coordinator API.

pub mod agents;
pub mod discs;
pub mod files;
pub mod jobs;
pub mod thumbnails;
pub mod vlc;
pub mod workers;

use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::auth::require_api_key;
use crate::state::AppState;

pub fn create_api_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/agents/register", post(agents::register))
        .route("/agents/{id}/heartbeat", post(agents::heartbeat))
        .route("/agents/{id}/jobs", get(agents::jobs))
        .route("/workers/register", post(workers::register))
        .route("/workers/{id}/heartbeat", post(workers::heartbeat))
        .route("/workers/{id}/jobs", get(workers::jobs))
        .route("/discs/detected", post(discs::detected))
        .route("/discs/ejected", post(discs::ejected))
        .route("/discs/{id}", get(discs::get))
        .route("/discs/{id}/rip-status", get(discs::rip_status))
        .route("/discs/{id}/preview/approve", post(discs::preview_approve))
        .route("/discs/{id}/preview/reject", post(discs::preview_reject))
        .route("/discs/{id}/preview/update-season", post(discs::preview_update_season))
        .route("/discs/{id}/rip", post(discs::rip))
        .route("/jobs", post(jobs::create))
        .route("/jobs/{id}", patch(jobs::update))
        .route("/jobs/{id}/approve", post(jobs::approve))
        .route("/jobs/{id}/cancel", post(jobs::cancel))
        .route("/jobs/{id}/is-cancelled", get(jobs::is_cancelled))
        .route("/files/upload", post(files::upload))
        .route("/thumbnails/{owner_id}/{filename}", get(thumbnails::get))
        .route("/vlc/queue", post(vlc::queue))
        .route("/vlc/commands/{agent_id}", get(vlc::commands))
        .route("/vlc/commands/{command_id}/result", post(vlc::report_result))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state);

    Router::new().nest("/api", api)
}
