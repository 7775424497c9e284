use crate::AppId;
use crate::vdf::ParseError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppInfoError {
    #[error("Failed to launch {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("steamcmd produced no output for app {0}")]
    NoOutput(AppId),

    #[error("Malformed app info for {app_id}: {source}")]
    Parse {
        app_id: AppId,
        #[source]
        source: ParseError,
    },

    #[error("App info for {app_id} still unusable after {attempts} fetch attempts")]
    RetriesExhausted { app_id: AppId, attempts: u32 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppInfoError {
    /// Whether the failure came from the cancel flag rather than the tool or the data
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppInfoError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, AppInfoError>;
