use std::path::PathBuf;
use std::sync::Arc;

use axum_test::TestServer;
use dashmap::DashMap;
use tempfile::TempDir;

use spindle_config::CoordinatorConfig;
use spindle_core::store::memory::MemoryStore;
use spindle_core::{AgentManager, JobQueue, NullMovieProvider, NullSink, NullTvProvider, Store, WorkerManager};
use spindle_model::AssignmentStrategy;
use spindle_server::routes::create_api_router;
use spindle_server::state::AppState;

/// Builds a coordinator app wired to an in-memory store, null metadata
/// providers, and a null notification sink, with bearer auth disabled
/// unless `api_key` is set.
#[allow(unused)]
pub fn build_app(api_key: Option<&str>) -> (TestServer, TempDir) {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    let config = CoordinatorConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: "unused".to_string(),
        api_key: api_key.map(str::to_string),
        library_root: tempdir.path().to_path_buf(),
        agent_timeout_secs: 60,
        worker_timeout_secs: 90,
        assignment_strategy: AssignmentStrategy::Priority,
        tmdb_api_key: None,
        omdb_api_key: None,
        discord_webhook_url: None,
        auto_approve_previews: false,
        sweep_interval_secs: 30,
    };

    let state = AppState {
        agents: Arc::new(AgentManager::new(store.clone())),
        workers: Arc::new(WorkerManager::new(store.clone())),
        jobs: Arc::new(JobQueue::new(store.clone())),
        store,
        tv_provider: Arc::new(NullTvProvider),
        movie_provider: Arc::new(NullMovieProvider),
        notifier: Arc::new(NullSink),
        config: Arc::new(config),
        drive_index: Arc::new(DashMap::new()),
    };

    let app = create_api_router(state);
    let server = TestServer::new(app).expect("test server");
    (server, tempdir)
}

#[allow(unused)]
pub fn library_root(tempdir: &TempDir) -> PathBuf {
    tempdir.path().to_path_buf()
}
