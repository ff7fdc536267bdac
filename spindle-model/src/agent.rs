//! Agent registration and liveness tracking.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub struct AgentCapabilities {
    pub can_rip: bool,
    pub can_transcode: bool,
}

/// Coordinator-driven lifecycle state. Never set by the agent directly;
/// `offline` is assigned by the staleness sweep, not self-reported.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AgentStatus {
    Online,
    Busy,
    Offline,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub capabilities: AgentCapabilities,
    pub status: AgentStatus,
    pub current_job_id: Option<Uuid>,
    pub last_heartbeat: DateTime<Utc>,
    pub registered_at: DateTime<Utc>,
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>, capabilities: AgentCapabilities) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            capabilities,
            status: AgentStatus::Online,
            current_job_id: None,
            last_heartbeat: now,
            registered_at: now,
        }
    }

    /// Re-registration is idempotent: identity and capability fields are
    /// refreshed in place, never duplicated.
    pub fn reregister(&mut self, name: impl Into<String>, capabilities: AgentCapabilities) {
        self.name = name.into();
        self.capabilities = capabilities;
        self.status = AgentStatus::Online;
        self.last_heartbeat = Utc::now();
    }

    pub fn is_stale(&self, timeout: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.last_heartbeat > timeout
    }
}
