//! DTOs for `/api/vlc/*`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuePreviewRequest {
    pub agent_id: String,
    pub file_path: String,
    #[serde(default)]
    pub fullscreen: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlcCommandsResponse {
    pub commands: Vec<spindle_model::VlcCommand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportVlcResultRequest {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}
