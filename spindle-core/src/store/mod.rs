//! The durable store: the sole source of truth for all mutable state.

#[cfg(feature = "postgres")]
pub mod postgres;

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use spindle_model::{Agent, Disc, Job, JobStatus, TvSeason, VlcCommand, Worker};

use crate::error::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// All state mutation flows through this trait; handlers never touch a
/// connection directly.
#[async_trait]
pub trait Store: Send + Sync {
    // -- agents --------------------------------------------------------
    async fn upsert_agent(&self, agent: Agent) -> Result<Agent>;
    async fn get_agent(&self, id: &str) -> Result<Agent>;
    async fn list_agents(&self) -> Result<Vec<Agent>>;
    /// CAS on `last_heartbeat`: only applies if `expected_heartbeat` still
    /// matches the stored value, so a late staleness sweep can never clobber
    /// a newer heartbeat.
    async fn touch_agent_heartbeat(&self, id: &str, expected_heartbeat: DateTime<Utc>, now: DateTime<Utc>) -> Result<bool>;
    async fn set_agent_status(&self, id: &str, status: spindle_model::AgentStatus) -> Result<()>;
    async fn set_agent_current_job(&self, id: &str, job_id: Option<Uuid>) -> Result<()>;

    // -- workers ---------------------------------------------------------
    async fn upsert_worker(&self, worker: Worker) -> Result<Worker>;
    async fn get_worker(&self, id: &str) -> Result<Worker>;
    async fn list_workers(&self) -> Result<Vec<Worker>>;
    async fn delete_worker(&self, id: &str) -> Result<Worker>;
    async fn touch_worker_heartbeat(&self, id: &str, expected_heartbeat: DateTime<Utc>, now: DateTime<Utc>) -> Result<bool>;
    async fn set_worker_status(&self, id: &str, status: spindle_model::WorkerStatus) -> Result<()>;
    async fn add_worker_job(&self, id: &str, job_id: Uuid) -> Result<()>;
    async fn remove_worker_job(&self, id: &str, job_id: Uuid) -> Result<()>;
    async fn record_worker_completion(&self, id: &str, duration_s: f64) -> Result<()>;

    // -- discs / titles --------------------------------------------------
    async fn insert_disc(&self, disc: Disc) -> Result<Disc>;
    async fn get_disc(&self, id: Uuid) -> Result<Disc>;
    async fn replace_disc(&self, disc: Disc) -> Result<Disc>;

    // -- jobs -------------------------------------------------------------
    async fn insert_job(&self, job: Job) -> Result<Job>;
    async fn get_job(&self, id: Uuid) -> Result<Job>;
    async fn replace_job(&self, job: Job) -> Result<Job>;
    async fn jobs_for_agent(&self, agent_id: &str, statuses: &[JobStatus]) -> Result<Vec<Job>>;
    async fn jobs_for_disc(&self, disc_id: Uuid) -> Result<Vec<Job>>;
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    // -- seasons ----------------------------------------------------------
    async fn get_season(&self, season_id: &str) -> Result<Option<TvSeason>>;
    async fn upsert_season(&self, season: TvSeason) -> Result<TvSeason>;

    // -- vlc commands -------------------------------------------------------
    async fn queue_vlc_command(&self, command: VlcCommand) -> Result<VlcCommand>;
    /// Atomically drains and flips all `pending` commands for `agent_id` to
    /// `sent`.
    async fn take_pending_vlc_commands(&self, agent_id: &str) -> Result<Vec<VlcCommand>>;
    async fn replace_vlc_command(&self, command: VlcCommand) -> Result<VlcCommand>;
    async fn get_vlc_command(&self, id: Uuid) -> Result<VlcCommand>;
}
