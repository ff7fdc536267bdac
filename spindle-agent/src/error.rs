use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Runtime(#[from] spindle_runtime::RuntimeError),

    #[error(transparent)]
    Config(#[from] spindle_config::ConfigError),

    #[error("disc rejected during preview: {0}")]
    PreviewRejected(String),

    #[error("no ripped file found in {0}")]
    NoOutputFile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
