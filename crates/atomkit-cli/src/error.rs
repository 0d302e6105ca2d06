use std::path::PathBuf;

use atomkit_core::RunError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in '{path}'")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid plan in '{path}'")]
    PlanJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid plan in '{path}'")]
    PlanYaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error("store error")]
    Store(#[from] atomkit_store::StoreError),

    #[error("failed to render output")]
    Output(#[source] serde_json::Error),

    #[error("transaction was rolled back")]
    RolledBack(#[source] RunError),

    #[error("transaction did not run")]
    NotRun(#[source] RunError),
}

pub type Result<T> = std::result::Result<T, CliError>;
