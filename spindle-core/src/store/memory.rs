//! In-memory `Store` test double. Used by the coordinator's unit test
//! suite so the preview pipeline, season continuation, and assignment
//! engine are fully testable without a live Postgres instance.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use spindle_model::{Agent, AgentStatus, Disc, Job, JobStatus, TvSeason, VlcCommand, VlcCommandStatus, Worker, WorkerStatus};

use crate::error::StoreError;
use crate::store::{Result, Store};

#[derive(Default)]
struct Inner {
    agents: HashMap<String, Agent>,
    workers: HashMap<String, Worker>,
    discs: HashMap<Uuid, Disc>,
    jobs: HashMap<Uuid, Job>,
    seasons: HashMap<String, TvSeason>,
    vlc_commands: HashMap<Uuid, VlcCommand>,
}

/// An in-process, non-persistent `Store`. Cheap to construct per test.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_agent(&self, agent: Agent) -> Result<Agent> {
        let mut inner = self.inner.lock().unwrap();
        inner.agents.insert(agent.id.clone(), agent.clone());
        Ok(agent)
    }

    async fn get_agent(&self, id: &str) -> Result<Agent> {
        self.inner
            .lock()
            .unwrap()
            .agents
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("agent", id.to_string()))
    }

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        Ok(self.inner.lock().unwrap().agents.values().cloned().collect())
    }

    async fn touch_agent_heartbeat(&self, id: &str, expected_heartbeat: DateTime<Utc>, now: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let agent = inner
            .agents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("agent", id.to_string()))?;
        if agent.last_heartbeat != expected_heartbeat {
            return Ok(false);
        }
        agent.last_heartbeat = now;
        Ok(true)
    }

    async fn set_agent_status(&self, id: &str, status: AgentStatus) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let agent = inner
            .agents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("agent", id.to_string()))?;
        agent.status = status;
        Ok(())
    }

    async fn set_agent_current_job(&self, id: &str, job_id: Option<Uuid>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let agent = inner
            .agents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("agent", id.to_string()))?;
        agent.current_job_id = job_id;
        Ok(())
    }

    async fn upsert_worker(&self, worker: Worker) -> Result<Worker> {
        let mut inner = self.inner.lock().unwrap();
        inner.workers.insert(worker.id.clone(), worker.clone());
        Ok(worker)
    }

    async fn get_worker(&self, id: &str) -> Result<Worker> {
        self.inner
            .lock()
            .unwrap()
            .workers
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("worker", id.to_string()))
    }

    async fn list_workers(&self) -> Result<Vec<Worker>> {
        Ok(self.inner.lock().unwrap().workers.values().cloned().collect())
    }

    async fn delete_worker(&self, id: &str) -> Result<Worker> {
        self.inner
            .lock()
            .unwrap()
            .workers
            .remove(id)
            .ok_or_else(|| StoreError::NotFound("worker", id.to_string()))
    }

    async fn touch_worker_heartbeat(&self, id: &str, expected_heartbeat: DateTime<Utc>, now: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let worker = inner
            .workers
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("worker", id.to_string()))?;
        if worker.last_heartbeat != expected_heartbeat {
            return Ok(false);
        }
        worker.last_heartbeat = now;
        Ok(true)
    }

    async fn set_worker_status(&self, id: &str, status: WorkerStatus) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let worker = inner
            .workers
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("worker", id.to_string()))?;
        worker.status = status;
        Ok(())
    }

    async fn add_worker_job(&self, id: &str, job_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let worker = inner
            .workers
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("worker", id.to_string()))?;
        if !worker.current_jobs.contains(&job_id) {
            worker.current_jobs.push(job_id);
        }
        Ok(())
    }

    async fn remove_worker_job(&self, id: &str, job_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let worker = inner
            .workers
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("worker", id.to_string()))?;
        worker.current_jobs.retain(|j| *j != job_id);
        Ok(())
    }

    async fn record_worker_completion(&self, id: &str, duration_s: f64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let worker = inner
            .workers
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("worker", id.to_string()))?;
        let stats = &mut worker.stats;
        let n = stats.total_completed as f64;
        let prev_avg = stats.avg_duration_s.unwrap_or(duration_s);
        stats.avg_duration_s = Some((prev_avg * n + duration_s) / (n + 1.0));
        stats.total_completed += 1;
        Ok(())
    }

    async fn insert_disc(&self, disc: Disc) -> Result<Disc> {
        let mut inner = self.inner.lock().unwrap();
        inner.discs.insert(disc.id, disc.clone());
        Ok(disc)
    }

    async fn get_disc(&self, id: Uuid) -> Result<Disc> {
        self.inner
            .lock()
            .unwrap()
            .discs
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("disc", id.to_string()))
    }

    async fn replace_disc(&self, disc: Disc) -> Result<Disc> {
        let mut inner = self.inner.lock().unwrap();
        inner.discs.insert(disc.id, disc.clone());
        Ok(disc)
    }

    async fn insert_job(&self, job: Job) -> Result<Job> {
        let mut inner = self.inner.lock().unwrap();
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: Uuid) -> Result<Job> {
        self.inner
            .lock()
            .unwrap()
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("job", id.to_string()))
    }

    async fn replace_job(&self, job: Job) -> Result<Job> {
        let mut inner = self.inner.lock().unwrap();
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn jobs_for_agent(&self, agent_id: &str, statuses: &[JobStatus]) -> Result<Vec<Job>> {
        let inner = self.inner.lock().unwrap();
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| j.assigned_agent_id.as_deref() == Some(agent_id) && statuses.contains(&j.status))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(jobs)
    }

    async fn jobs_for_disc(&self, disc_id: Uuid) -> Result<Vec<Job>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.jobs.values().filter(|j| j.disc_id == Some(disc_id)).cloned().collect())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.inner.lock().unwrap().jobs.values().cloned().collect())
    }

    async fn get_season(&self, season_id: &str) -> Result<Option<TvSeason>> {
        Ok(self.inner.lock().unwrap().seasons.get(season_id).cloned())
    }

    async fn upsert_season(&self, season: TvSeason) -> Result<TvSeason> {
        let mut inner = self.inner.lock().unwrap();
        inner.seasons.insert(season.season_id.clone(), season.clone());
        Ok(season)
    }

    async fn queue_vlc_command(&self, command: VlcCommand) -> Result<VlcCommand> {
        let mut inner = self.inner.lock().unwrap();
        inner.vlc_commands.insert(command.id, command.clone());
        Ok(command)
    }

    async fn take_pending_vlc_commands(&self, agent_id: &str) -> Result<Vec<VlcCommand>> {
        let mut inner = self.inner.lock().unwrap();
        let mut taken = Vec::new();
        for cmd in inner.vlc_commands.values_mut() {
            if cmd.agent_id == agent_id && cmd.status == VlcCommandStatus::Pending {
                cmd.mark_sent()?;
                taken.push(cmd.clone());
            }
        }
        Ok(taken)
    }

    async fn replace_vlc_command(&self, command: VlcCommand) -> Result<VlcCommand> {
        let mut inner = self.inner.lock().unwrap();
        inner.vlc_commands.insert(command.id, command.clone());
        Ok(command)
    }

    async fn get_vlc_command(&self, id: Uuid) -> Result<VlcCommand> {
        self.inner
            .lock()
            .unwrap()
            .vlc_commands
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("vlc_command", id.to_string()))
    }
}
