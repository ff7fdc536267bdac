use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Clap(#[from] clap::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
