//! VLC preview-playback command channel.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ModelError;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VlcCommandStatus {
    Pending,
    Sent,
    Completed,
    Failed,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VlcCommand {
    pub id: Uuid,
    pub agent_id: String,
    pub file_path: String,
    pub fullscreen: bool,
    pub status: VlcCommandStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl VlcCommand {
    pub fn new(id: Uuid, agent_id: impl Into<String>, file_path: impl Into<String>, fullscreen: bool) -> Self {
        Self {
            id,
            agent_id: agent_id.into(),
            file_path: file_path.into(),
            fullscreen,
            status: VlcCommandStatus::Pending,
            error: None,
            created_at: Utc::now(),
            sent_at: None,
            completed_at: None,
        }
    }

    /// The atomic "single-poll delivery" transition: only a `pending`
    /// command may be claimed by a poll, and it is claimed exactly once.
    pub fn mark_sent(&mut self) -> Result<(), ModelError> {
        if self.status != VlcCommandStatus::Pending {
            return Err(ModelError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: "sent".into(),
            });
        }
        self.status = VlcCommandStatus::Sent;
        self.sent_at = Some(Utc::now());
        Ok(())
    }

    pub fn mark_completed(&mut self) -> Result<(), ModelError> {
        if self.status != VlcCommandStatus::Sent {
            return Err(ModelError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: "completed".into(),
            });
        }
        self.status = VlcCommandStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), ModelError> {
        if self.status != VlcCommandStatus::Sent {
            return Err(ModelError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: "failed".into(),
            });
        }
        self.status = VlcCommandStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}
