//! DTOs for `/api/discs/*`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spindle_model::DiscType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedTitleInput {
    pub index: u32,
    pub name: String,
    pub duration_seconds: u64,
    pub size_bytes: u64,
    #[serde(default)]
    pub chapters: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscDetectedRequest {
    pub agent_id: String,
    pub drive: String,
    pub disc_name: String,
    pub disc_type: DiscType,
    pub titles: Vec<DetectedTitleInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscEjectedRequest {
    pub agent_id: String,
    pub drive: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RipStatusResponse {
    pub all_rips_complete: bool,
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TitleEditInput {
    pub title_index: u32,
    #[serde(default)]
    pub proposed_filename: Option<String>,
    #[serde(default)]
    pub proposed_path: Option<String>,
    #[serde(default)]
    pub episode_number: Option<u32>,
    #[serde(default)]
    pub episode_title: Option<String>,
    #[serde(default)]
    pub is_extra: Option<bool>,
    #[serde(default)]
    pub selected: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PreviewApproveRequest {
    #[serde(default)]
    pub title_edits: Vec<TitleEditInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSeasonRequest {
    pub season_number: u32,
    pub starting_episode: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RipRequest {
    #[serde(default)]
    pub title_indices: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RipResponse {
    pub job_ids: Vec<Uuid>,
}
