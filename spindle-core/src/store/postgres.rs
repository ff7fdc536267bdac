//! Postgres-backed `Store`. Each entity is persisted as a row keyed by its
//! natural id with the full value serialized into a `data jsonb` column;
//! a handful of plain columns (status, assigned_agent_id, heartbeat
//! timestamps) are kept alongside for indexed querying and CAS updates.
//! Because `cargo sqlx prepare`'s offline query cache cannot be produced in
//! this environment, every query below uses the runtime `sqlx::query`/
//! `sqlx::query_as` forms rather than the `query!` compile-time macros the
//! teacher's repositories favor.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use spindle_model::{Agent, AgentStatus, Disc, Job, JobStatus, TvSeason, VlcCommand, VlcCommandStatus, Worker, WorkerStatus};

use crate::error::StoreError;
use crate::store::{Result, Store};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the coordinator's embedded migrations against `self.pool`.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await.map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }
}

fn status_label(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Online => "online",
        AgentStatus::Busy => "busy",
        AgentStatus::Offline => "offline",
    }
}

fn worker_status_label(status: WorkerStatus) -> &'static str {
    match status {
        WorkerStatus::Available => "available",
        WorkerStatus::Busy => "busy",
        WorkerStatus::Offline => "offline",
    }
}

fn job_status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::Queued => "queued",
        JobStatus::Assigned => "assigned",
        JobStatus::Running => "running",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
        JobStatus::Cancelled => "cancelled",
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn upsert_agent(&self, agent: Agent) -> Result<Agent> {
        let data = serde_json::to_value(&agent)?;
        sqlx::query(
            r#"
            insert into agents (id, status, last_heartbeat, data)
            values ($1, $2, $3, $4)
            on conflict (id) do update set status = excluded.status,
                last_heartbeat = excluded.last_heartbeat, data = excluded.data
            "#,
        )
        .bind(&agent.id)
        .bind(status_label(agent.status))
        .bind(agent.last_heartbeat)
        .bind(data)
        .execute(&self.pool)
        .await?;
        Ok(agent)
    }

    async fn get_agent(&self, id: &str) -> Result<Agent> {
        let row = sqlx::query("select data from agents where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("agent", id.to_string()))?;
        let data: serde_json::Value = row.try_get("data")?;
        Ok(serde_json::from_value(data)?)
    }

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        let rows = sqlx::query("select data from agents order by id").fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| {
                let data: serde_json::Value = row.try_get("data")?;
                Ok(serde_json::from_value(data)?)
            })
            .collect()
    }

    async fn touch_agent_heartbeat(&self, id: &str, expected_heartbeat: DateTime<Utc>, now: DateTime<Utc>) -> Result<bool> {
        let mut agent = self.get_agent(id).await?;
        if agent.last_heartbeat != expected_heartbeat {
            return Ok(false);
        }
        agent.last_heartbeat = now;
        let data = serde_json::to_value(&agent)?;
        let result = sqlx::query("update agents set last_heartbeat = $2, data = $3 where id = $1 and last_heartbeat = $4")
            .bind(id)
            .bind(now)
            .bind(data)
            .bind(expected_heartbeat)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_agent_status(&self, id: &str, status: AgentStatus) -> Result<()> {
        let mut agent = self.get_agent(id).await?;
        agent.status = status;
        let data = serde_json::to_value(&agent)?;
        sqlx::query("update agents set status = $2, data = $3 where id = $1")
            .bind(id)
            .bind(status_label(status))
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_agent_current_job(&self, id: &str, job_id: Option<Uuid>) -> Result<()> {
        let mut agent = self.get_agent(id).await?;
        agent.current_job_id = job_id;
        let data = serde_json::to_value(&agent)?;
        sqlx::query("update agents set data = $2 where id = $1").bind(id).bind(data).execute(&self.pool).await?;
        Ok(())
    }

    async fn upsert_worker(&self, worker: Worker) -> Result<Worker> {
        let data = serde_json::to_value(&worker)?;
        sqlx::query(
            r#"
            insert into workers (id, status, last_heartbeat, data)
            values ($1, $2, $3, $4)
            on conflict (id) do update set status = excluded.status,
                last_heartbeat = excluded.last_heartbeat, data = excluded.data
            "#,
        )
        .bind(&worker.id)
        .bind(worker_status_label(worker.status))
        .bind(worker.last_heartbeat)
        .bind(data)
        .execute(&self.pool)
        .await?;
        Ok(worker)
    }

    async fn get_worker(&self, id: &str) -> Result<Worker> {
        let row = sqlx::query("select data from workers where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("worker", id.to_string()))?;
        let data: serde_json::Value = row.try_get("data")?;
        Ok(serde_json::from_value(data)?)
    }

    async fn list_workers(&self) -> Result<Vec<Worker>> {
        let rows = sqlx::query("select data from workers order by id").fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| {
                let data: serde_json::Value = row.try_get("data")?;
                Ok(serde_json::from_value(data)?)
            })
            .collect()
    }

    async fn delete_worker(&self, id: &str) -> Result<Worker> {
        let worker = self.get_worker(id).await?;
        sqlx::query("delete from workers where id = $1").bind(id).execute(&self.pool).await?;
        Ok(worker)
    }

    async fn touch_worker_heartbeat(&self, id: &str, expected_heartbeat: DateTime<Utc>, now: DateTime<Utc>) -> Result<bool> {
        let mut worker = self.get_worker(id).await?;
        if worker.last_heartbeat != expected_heartbeat {
            return Ok(false);
        }
        worker.last_heartbeat = now;
        let data = serde_json::to_value(&worker)?;
        let result = sqlx::query("update workers set last_heartbeat = $2, data = $3 where id = $1 and last_heartbeat = $4")
            .bind(id)
            .bind(now)
            .bind(data)
            .bind(expected_heartbeat)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_worker_status(&self, id: &str, status: WorkerStatus) -> Result<()> {
        let mut worker = self.get_worker(id).await?;
        worker.status = status;
        let data = serde_json::to_value(&worker)?;
        sqlx::query("update workers set status = $2, data = $3 where id = $1")
            .bind(id)
            .bind(worker_status_label(status))
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_worker_job(&self, id: &str, job_id: Uuid) -> Result<()> {
        let mut worker = self.get_worker(id).await?;
        if !worker.current_jobs.contains(&job_id) {
            worker.current_jobs.push(job_id);
        }
        let data = serde_json::to_value(&worker)?;
        sqlx::query("update workers set data = $2 where id = $1").bind(id).bind(data).execute(&self.pool).await?;
        Ok(())
    }

    async fn remove_worker_job(&self, id: &str, job_id: Uuid) -> Result<()> {
        let mut worker = self.get_worker(id).await?;
        worker.current_jobs.retain(|j| *j != job_id);
        let data = serde_json::to_value(&worker)?;
        sqlx::query("update workers set data = $2 where id = $1").bind(id).bind(data).execute(&self.pool).await?;
        Ok(())
    }

    async fn record_worker_completion(&self, id: &str, duration_s: f64) -> Result<()> {
        let mut worker = self.get_worker(id).await?;
        let stats = &mut worker.stats;
        let n = stats.total_completed as f64;
        let prev_avg = stats.avg_duration_s.unwrap_or(duration_s);
        stats.avg_duration_s = Some((prev_avg * n + duration_s) / (n + 1.0));
        stats.total_completed += 1;
        let data = serde_json::to_value(&worker)?;
        sqlx::query("update workers set data = $2 where id = $1").bind(id).bind(data).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_disc(&self, disc: Disc) -> Result<Disc> {
        let data = serde_json::to_value(&disc)?;
        sqlx::query("insert into discs (id, agent_id, data) values ($1, $2, $3)")
            .bind(disc.id)
            .bind(&disc.agent_id)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(disc)
    }

    async fn get_disc(&self, id: Uuid) -> Result<Disc> {
        let row = sqlx::query("select data from discs where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("disc", id.to_string()))?;
        let data: serde_json::Value = row.try_get("data")?;
        Ok(serde_json::from_value(data)?)
    }

    async fn replace_disc(&self, disc: Disc) -> Result<Disc> {
        let data = serde_json::to_value(&disc)?;
        sqlx::query("update discs set agent_id = $2, data = $3 where id = $1")
            .bind(disc.id)
            .bind(&disc.agent_id)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(disc)
    }

    async fn insert_job(&self, job: Job) -> Result<Job> {
        let data = serde_json::to_value(&job)?;
        sqlx::query("insert into jobs (id, status, assigned_agent_id, disc_id, data) values ($1, $2, $3, $4, $5)")
            .bind(job.id)
            .bind(job_status_label(job.status))
            .bind(&job.assigned_agent_id)
            .bind(job.disc_id)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(job)
    }

    async fn get_job(&self, id: Uuid) -> Result<Job> {
        let row = sqlx::query("select data from jobs where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("job", id.to_string()))?;
        let data: serde_json::Value = row.try_get("data")?;
        Ok(serde_json::from_value(data)?)
    }

    async fn replace_job(&self, job: Job) -> Result<Job> {
        let data = serde_json::to_value(&job)?;
        sqlx::query("update jobs set status = $2, assigned_agent_id = $3, disc_id = $4, data = $5 where id = $1")
            .bind(job.id)
            .bind(job_status_label(job.status))
            .bind(&job.assigned_agent_id)
            .bind(job.disc_id)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(job)
    }

    async fn jobs_for_agent(&self, agent_id: &str, statuses: &[JobStatus]) -> Result<Vec<Job>> {
        let labels: Vec<&'static str> = statuses.iter().copied().map(job_status_label).collect();
        let rows = sqlx::query("select data from jobs where assigned_agent_id = $1 and status = any($2) order by data->>'priority' desc")
            .bind(agent_id)
            .bind(&labels)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                let data: serde_json::Value = row.try_get("data")?;
                Ok(serde_json::from_value(data)?)
            })
            .collect()
    }

    async fn jobs_for_disc(&self, disc_id: Uuid) -> Result<Vec<Job>> {
        let rows = sqlx::query("select data from jobs where disc_id = $1").bind(disc_id).fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| {
                let data: serde_json::Value = row.try_get("data")?;
                Ok(serde_json::from_value(data)?)
            })
            .collect()
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query("select data from jobs order by id").fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| {
                let data: serde_json::Value = row.try_get("data")?;
                Ok(serde_json::from_value(data)?)
            })
            .collect()
    }

    async fn get_season(&self, season_id: &str) -> Result<Option<TvSeason>> {
        let row = sqlx::query("select data from tv_seasons where season_id = $1").bind(season_id).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => {
                let data: serde_json::Value = row.try_get("data")?;
                Ok(Some(serde_json::from_value(data)?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_season(&self, season: TvSeason) -> Result<TvSeason> {
        let data = serde_json::to_value(&season)?;
        sqlx::query(
            r#"
            insert into tv_seasons (season_id, data) values ($1, $2)
            on conflict (season_id) do update set data = excluded.data
            "#,
        )
        .bind(&season.season_id)
        .bind(data)
        .execute(&self.pool)
        .await?;
        Ok(season)
    }

    async fn queue_vlc_command(&self, command: VlcCommand) -> Result<VlcCommand> {
        let data = serde_json::to_value(&command)?;
        sqlx::query("insert into vlc_commands (id, agent_id, status, data) values ($1, $2, $3, $4)")
            .bind(command.id)
            .bind(&command.agent_id)
            .bind("pending")
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(command)
    }

    async fn take_pending_vlc_commands(&self, agent_id: &str) -> Result<Vec<VlcCommand>> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query("select data from vlc_commands where agent_id = $1 and status = 'pending' for update")
            .bind(agent_id)
            .fetch_all(&mut *tx)
            .await?;
        let mut taken = Vec::with_capacity(rows.len());
        for row in rows {
            let data: serde_json::Value = row.try_get("data")?;
            let mut command: VlcCommand = serde_json::from_value(data)?;
            command.mark_sent()?;
            let updated = serde_json::to_value(&command)?;
            sqlx::query("update vlc_commands set status = 'sent', data = $2 where id = $1")
                .bind(command.id)
                .bind(updated)
                .execute(&mut *tx)
                .await?;
            taken.push(command);
        }
        tx.commit().await?;
        Ok(taken)
    }

    async fn replace_vlc_command(&self, command: VlcCommand) -> Result<VlcCommand> {
        let data = serde_json::to_value(&command)?;
        let label = match command.status {
            VlcCommandStatus::Pending => "pending",
            VlcCommandStatus::Sent => "sent",
            VlcCommandStatus::Completed => "completed",
            VlcCommandStatus::Failed => "failed",
        };
        sqlx::query("update vlc_commands set status = $2, data = $3 where id = $1")
            .bind(command.id)
            .bind(label)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(command)
    }

    async fn get_vlc_command(&self, id: Uuid) -> Result<VlcCommand> {
        let row = sqlx::query("select data from vlc_commands where id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("vlc_command", id.to_string()))?;
        let data: serde_json::Value = row.try_get("data")?;
        Ok(serde_json::from_value(data)?)
    }
}
