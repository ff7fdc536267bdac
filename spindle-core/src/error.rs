use thiserror::Error;

/// Errors surfaced by the durable store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("invalid state transition: {0}")]
    InvalidTransition(#[from] spindle_model::ModelError),

    #[error("stale write: {0} was modified concurrently")]
    Conflict(String),

    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the preview pipeline.
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("disc has no titles to analyze")]
    NoTitles,

    #[error("metadata lookup failed: {0}")]
    Metadata(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from job assignment.
#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("no eligible worker available")]
    NoEligibleWorker,

    #[error("job {0} is not awaiting approval")]
    NotAwaitingApproval(uuid::Uuid),

    #[error("job {0} is already terminal")]
    AlreadyTerminal(uuid::Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}
