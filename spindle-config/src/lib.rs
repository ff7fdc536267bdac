pub mod agent;
pub mod coordinator;
pub mod error;
pub mod loader;

pub use agent::{AgentArgs, AgentConfig, WorkerArgs, WorkerConfig};
pub use coordinator::{CoordinatorArgs, CoordinatorConfig};
pub use error::{ConfigError, Result};
