//! DTOs for `/api/jobs/*`.

use serde::{Deserialize, Serialize};

use spindle_model::JobStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub disc_id: Option<uuid::Uuid>,
    pub title_index: Option<u32>,
    pub input_file: Option<String>,
    pub preset: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub requires_approval: bool,
    #[serde(default)]
    pub thumbnails: Vec<String>,
    #[serde(default)]
    pub thumbnail_timestamps: Vec<u64>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateJobRequest {
    pub status: JobStatus,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveJobRequest {
    pub worker_id: String,
    pub preset: String,
    #[serde(default)]
    pub output_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsCancelledResponse {
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub path: String,
    pub final_path: Option<String>,
    pub organized: bool,
    pub metadata: serde_json::Value,
}
