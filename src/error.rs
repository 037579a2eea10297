use crate::coordinator_node::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, MrError>;

#[derive(Error, Debug)]
pub enum MrError {
    /// A document could not be loaded
    #[error("failed to read {}: {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tunable is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The config file is missing or malformed
    #[error("failed to load config {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A map or reduce task panicked or could not publish its results
    #[error("{phase:?} task failed: {reason}")]
    WorkerTaskFailure { phase: Phase, reason: String },

    /// The barrier wait was cancelled before every task finished
    #[error("wait for {phase:?} tasks was interrupted")]
    InterruptedWait { phase: Phase },
}

impl MrError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        MrError::InvalidConfiguration(message.into())
    }
}
