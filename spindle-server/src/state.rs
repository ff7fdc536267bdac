//! Shared application state threaded through every handler via Axum's
//! `State` extractor.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use spindle_config::CoordinatorConfig;
use spindle_core::{
    AgentManager, JobQueue, MovieMetadataProvider, NotificationSink, Store, TvMetadataProvider,
    WorkerManager,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub agents: Arc<AgentManager<dyn Store>>,
    pub workers: Arc<WorkerManager<dyn Store>>,
    pub jobs: Arc<JobQueue<dyn Store>>,
    pub tv_provider: Arc<dyn TvMetadataProvider>,
    pub movie_provider: Arc<dyn MovieMetadataProvider>,
    pub notifier: Arc<dyn NotificationSink>,
    pub config: Arc<CoordinatorConfig>,
    /// In-memory `(agent_id, drive) -> disc_id` index populated on
    /// detection and cleared on ejection; the durable store has no
    /// by-drive lookup, and this mapping is only ever consulted while the
    /// disc is physically in the drive.
    pub drive_index: Arc<DashMap<(String, String), Uuid>>,
}
