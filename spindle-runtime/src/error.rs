use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("failed to spawn subprocess: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("subprocess stalled: no output for {0:?}")]
    Stall(std::time::Duration),

    #[error("subprocess exceeded hard timeout of {0:?}")]
    HardTimeout(std::time::Duration),

    #[error("subprocess exited with status {0}")]
    NonZeroExit(i32),

    #[error("coordinator request failed: {0}")]
    Coordinator(#[source] reqwest::Error),

    #[error("coordinator returned an error response: {0}")]
    CoordinatorResponse(String),

    #[error("another instance is already running (lockfile {0})")]
    AlreadyRunning(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
