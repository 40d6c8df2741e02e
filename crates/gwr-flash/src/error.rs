//! Flash orchestration errors

use gwr_core::CoreError;
use gwr_ssh::SshError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlashError {
    /// Bad firmware filename, unknown protocol version
    #[error("validation failed: {0}")]
    Validation(String),

    /// Artifact path escapes the trusted directory
    #[error("path rejected: {0}")]
    PathSecurity(String),

    /// Artifact missing from the trusted directory
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// A fatal step exited nonzero
    #[error("step '{name}' failed with exit code {exit_code}: {stderr}")]
    StepFailed {
        name: &'static str,
        exit_code: i32,
        stderr: String,
    },

    /// Underlying session failure
    #[error(transparent)]
    Session(#[from] SshError),
}

pub type FlashResult<T> = Result<T, FlashError>;

impl From<FlashError> for CoreError {
    fn from(err: FlashError) -> Self {
        match err {
            FlashError::Validation(msg) => CoreError::Validation(msg),
            FlashError::PathSecurity(msg) => CoreError::PathSecurity(msg),
            FlashError::ArtifactNotFound(name) => {
                CoreError::Validation(format!("artifact not found: {}", name))
            }
            FlashError::StepFailed { .. } => CoreError::Transport(err.to_string()),
            FlashError::Session(e) => e.into(),
        }
    }
}
