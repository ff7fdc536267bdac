//! Job entity and its legal state-transition graph.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ModelError;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum JobType {
    Rip,
    Transcode,
    Organize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum JobStatus {
    Pending,
    Queued,
    Assigned,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Legal edges of `pending -> queued -> assigned -> running ->
    /// completed|failed`, plus `-> cancelled` from any non-terminal state,
    /// plus `assigned -> pending` (a rip's disc preview is still undecided)
    /// and `assigned -> failed` (its preview was rejected, so it never runs).
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Pending, Queued) => true,
            (Queued, Assigned) => true,
            // Transcode approval assigns directly out of `pending`.
            (Pending, Assigned) => true,
            (Assigned, Running) => true,
            (Assigned, Pending) => true,
            // a rip job whose disc preview was rejected fails before it ever runs
            (Assigned, Failed) => true,
            (Running, Completed) => true,
            (Running, Failed) => true,
            (Pending | Queued | Assigned | Running, Cancelled) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

/// Worker-selection strategy used at transcode approval time.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AssignmentStrategy {
    Priority,
    RoundRobin,
    LoadBalance,
    FastestFirst,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub priority: i32,
    pub disc_id: Option<Uuid>,
    pub title_index: Option<u32>,
    pub input_file: Option<String>,
    pub output_name: Option<String>,
    pub output_file: Option<String>,
    pub preset: Option<String>,
    pub assigned_agent_id: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub requires_approval: bool,
    pub source_disc_name: Option<String>,
    pub input_file_size: Option<u64>,
    pub progress: u8,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub thumbnails: Vec<String>,
    pub thumbnail_timestamps: Vec<u64>,
}

impl Job {
    pub fn new(id: Uuid, job_type: JobType, priority: i32, requires_approval: bool) -> Self {
        Self {
            id,
            job_type,
            status: JobStatus::Pending,
            priority,
            disc_id: None,
            title_index: None,
            input_file: None,
            output_name: None,
            output_file: None,
            preset: None,
            assigned_agent_id: None,
            assigned_at: None,
            requires_approval,
            source_disc_name: None,
            input_file_size: None,
            progress: 0,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            thumbnails: Vec::new(),
            thumbnail_timestamps: Vec::new(),
        }
    }

    pub fn transition(&mut self, next: JobStatus) -> Result<(), ModelError> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", next),
            });
        }
        match next {
            JobStatus::Running if self.started_at.is_none() => self.started_at = Some(Utc::now()),
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {
                self.completed_at = Some(Utc::now());
            }
            _ => {}
        }
        self.status = next;
        Ok(())
    }

    /// Approval for a `transcode` job awaiting a worker/preset decision.
    pub fn approve(&mut self, agent_id: impl Into<String>, preset: impl Into<String>, output_name: Option<String>) -> Result<(), ModelError> {
        if self.status != JobStatus::Pending || !self.requires_approval || self.job_type != JobType::Transcode {
            return Err(ModelError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: "assigned".into(),
            });
        }
        self.assigned_agent_id = Some(agent_id.into());
        self.preset = Some(preset.into());
        self.assigned_at = Some(Utc::now());
        self.requires_approval = false;
        if let Some(name) = output_name {
            self.output_name = Some(name);
        }
        self.transition(JobStatus::Assigned)
    }
}
