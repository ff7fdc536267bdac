//! Agent and worker registration, heartbeat, and the staleness sweep with
//! worker failover.

use std::sync::Arc;

use chrono::{Duration, Utc};

use spindle_model::{Agent, AgentCapabilities, AgentStatus, Job, JobStatus, Worker, WorkerCapabilities, WorkerStatus, WorkerType};

use crate::error::StoreError;
use crate::notify::NotificationSink;
use crate::store::Store;

pub struct AgentManager<S: Store + ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> AgentManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Registration is idempotent by id: a second register refreshes the
    /// mutable fields in place rather than creating a duplicate.
    pub async fn register(&self, id: &str, name: &str, capabilities: AgentCapabilities) -> Result<Agent, StoreError> {
        let agent = match self.store.get_agent(id).await {
            Ok(mut existing) => {
                existing.reregister(name, capabilities);
                existing
            }
            Err(StoreError::NotFound(..)) => Agent::new(id, name, capabilities),
            Err(other) => return Err(other),
        };
        self.store.upsert_agent(agent).await
    }

    pub async fn heartbeat(&self, id: &str) -> Result<(), StoreError> {
        let agent = self.store.get_agent(id).await?;
        let now = Utc::now();
        self.store.touch_agent_heartbeat(id, agent.last_heartbeat, now).await?;
        if agent.status == AgentStatus::Offline {
            self.store.set_agent_status(id, AgentStatus::Online).await?;
        }
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Agent, StoreError> {
        self.store.get_agent(id).await
    }

    pub async fn get_all(&self) -> Result<Vec<Agent>, StoreError> {
        self.store.list_agents().await
    }

    pub async fn assign_job(&self, id: &str, job_id: uuid::Uuid) -> Result<(), StoreError> {
        self.store.set_agent_current_job(id, Some(job_id)).await?;
        self.store.set_agent_status(id, AgentStatus::Busy).await
    }

    pub async fn complete_job(&self, id: &str) -> Result<(), StoreError> {
        self.store.set_agent_current_job(id, None).await?;
        self.store.set_agent_status(id, AgentStatus::Online).await
    }

    pub async fn unregister(&self, id: &str) -> Result<(), StoreError> {
        self.store.set_agent_status(id, AgentStatus::Offline).await
    }

    /// Marks agents whose heartbeat has exceeded `timeout` as offline.
    /// Skips any agent whose heartbeat advanced between the read and the
    /// CAS write, so a late sweep never clobbers a fresher heartbeat.
    pub async fn sweep_stale(&self, timeout: Duration) -> Result<Vec<String>, StoreError> {
        let now = Utc::now();
        let mut went_offline = Vec::new();
        for agent in self.store.list_agents().await? {
            if agent.status != AgentStatus::Offline && agent.is_stale(timeout, now) {
                self.store.set_agent_status(&agent.id, AgentStatus::Offline).await?;
                went_offline.push(agent.id);
            }
        }
        Ok(went_offline)
    }
}

pub struct WorkerManager<S: Store + ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> WorkerManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn register(&self, id: &str, worker_type: WorkerType, hostname: &str, agent_id: Option<String>, capabilities: WorkerCapabilities) -> Result<Worker, StoreError> {
        let mut worker = match self.store.get_worker(id).await {
            Ok(existing) => existing,
            Err(StoreError::NotFound(..)) => Worker::new(id, worker_type, hostname),
            Err(other) => return Err(other),
        };
        worker.agent_id = agent_id;
        worker.capabilities = capabilities;
        worker.status = WorkerStatus::Available;
        worker.last_heartbeat = Utc::now();
        self.store.upsert_worker(worker).await
    }

    pub async fn heartbeat(&self, id: &str) -> Result<(), StoreError> {
        let worker = self.store.get_worker(id).await?;
        let now = Utc::now();
        self.store.touch_worker_heartbeat(id, worker.last_heartbeat, now).await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Worker, StoreError> {
        self.store.get_worker(id).await
    }

    pub async fn get_all(&self) -> Result<Vec<Worker>, StoreError> {
        self.store.list_workers().await
    }

    pub async fn assign_job(&self, id: &str, job_id: uuid::Uuid) -> Result<(), StoreError> {
        self.store.add_worker_job(id, job_id).await
    }

    pub async fn complete_job(&self, id: &str, job_id: uuid::Uuid, duration_s: f64) -> Result<(), StoreError> {
        self.store.remove_worker_job(id, job_id).await?;
        self.store.record_worker_completion(id, duration_s).await
    }

    pub async fn unregister(&self, id: &str) -> Result<Worker, StoreError> {
        self.store.delete_worker(id).await
    }

    /// Staleness sweep with failover: evacuates every `current_jobs` entry
    /// of a worker that just went offline, resets each job to `pending`
    /// with `requires_approval=true` so a human re-routes it, and fires a
    /// notification per evacuated job.
    pub async fn sweep_stale(&self, timeout: Duration, notifier: &dyn NotificationSink) -> Result<Vec<String>, StoreError> {
        let now = Utc::now();
        let mut went_offline = Vec::new();
        for worker in self.store.list_workers().await? {
            if worker.status == WorkerStatus::Offline || !worker.is_stale(timeout, now) {
                continue;
            }
            self.store.set_worker_status(&worker.id, WorkerStatus::Offline).await?;
            went_offline.push(worker.id.clone());

            for job_id in &worker.current_jobs {
                let mut job: Job = match self.store.get_job(*job_id).await {
                    Ok(job) => job,
                    Err(_) => continue,
                };
                if job.status.is_terminal() {
                    continue;
                }
                job.assigned_agent_id = None;
                job.requires_approval = true;
                job.status = JobStatus::Pending;
                self.store.replace_job(job).await?;
                self.store.remove_worker_job(&worker.id, *job_id).await?;
                notifier
                    .notify(&format!("worker `{}` went offline; job {} was reset for re-approval", worker.id, job_id))
                    .await;
            }
        }
        Ok(went_offline)
    }
}
