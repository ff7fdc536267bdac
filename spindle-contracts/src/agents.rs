//! DTOs for `/api/agents/*` and `/api/workers/*`.

use serde::{Deserialize, Serialize};

use spindle_model::{Agent, AgentCapabilities, Job, Worker, WorkerCapabilities, WorkerType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    pub agent_id: String,
    pub name: String,
    pub capabilities: AgentCapabilities,
}

pub type RegisterAgentResponse = Agent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsResponse {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWorkerRequest {
    pub worker_id: String,
    #[serde(rename = "type")]
    pub worker_type: WorkerType,
    pub hostname: String,
    pub agent_id: Option<String>,
    pub capabilities: WorkerCapabilities,
}

pub type RegisterWorkerResponse = Worker;
