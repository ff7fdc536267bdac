//! Worker registration, capability, and load tracking.

use chrono::{DateTime, Utc};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WorkerType {
    /// Runs colocated with an agent process, sharing its host.
    Agent,
    /// A standalone remote transcode-only worker binary.
    Remote,
    /// The coordinator itself performing local transcode work.
    Server,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WorkerStatus {
    Available,
    Busy,
    Offline,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerCapabilities {
    /// Names of detected hardware encoders, e.g. `"nvenc"`, `"qsv"`.
    pub hw_encoders: Vec<String>,
    pub max_concurrent: u32,
    /// Codec names this worker's transcoding tool can target.
    pub codec_support: Vec<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerStats {
    pub total_completed: u64,
    pub avg_duration_s: Option<f64>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Worker {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub worker_type: WorkerType,
    pub hostname: String,
    pub agent_id: Option<String>,
    pub capabilities: WorkerCapabilities,
    /// 1 is highest priority; valid range is 1..=99.
    pub priority: u8,
    pub enabled: bool,
    pub status: WorkerStatus,
    pub current_jobs: Vec<uuid::Uuid>,
    pub stats: WorkerStats,
    pub last_heartbeat: DateTime<Utc>,
}

impl Worker {
    pub fn new(id: impl Into<String>, worker_type: WorkerType, hostname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            worker_type,
            hostname: hostname.into(),
            agent_id: None,
            capabilities: WorkerCapabilities::default(),
            priority: 50,
            enabled: true,
            status: WorkerStatus::Available,
            current_jobs: Vec::new(),
            stats: WorkerStats::default(),
            last_heartbeat: Utc::now(),
        }
    }

    pub fn is_stale(&self, timeout: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.last_heartbeat > timeout
    }

    pub fn has_capacity(&self) -> bool {
        self.enabled
            && self.status != WorkerStatus::Offline
            && (self.current_jobs.len() as u32) < self.capabilities.max_concurrent.max(1)
    }

    pub fn supports_codec(&self, codec: &str) -> bool {
        self.capabilities
            .codec_support
            .iter()
            .any(|c| c.eq_ignore_ascii_case(codec))
    }

    pub fn is_gpu_capable(&self) -> bool {
        !self.capabilities.hw_encoders.is_empty()
    }
}
