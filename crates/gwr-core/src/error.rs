//! Common error types for the rescue toolkit

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can cross the core boundary
///
/// Every variant carries the original cause text; no transport stack traces
/// leak past this type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input: bad hex, wrong seed length, non-ASCII credential,
    /// unknown protocol version, bad firmware filename
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Remote credential rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network or SSH channel failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Bounded wait exceeded; the remote process is NOT cancelled
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Operation requires a connected session
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Artifact path escapes the trusted directory
    #[error("Path rejected: {0}")]
    PathSecurity(String),
}

impl CoreError {
    /// Stable discriminant for callers that match on error class
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::Authentication(_) => "authentication",
            CoreError::Transport(_) => "transport",
            CoreError::Timeout(_) => "timeout",
            CoreError::Precondition(_) => "precondition",
            CoreError::PathSecurity(_) => "path_security",
        }
    }

    /// Serializable `{kind, message}` view for boundary layers
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

/// Stable error shape presented to boundary layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kind_is_stable() {
        let err = CoreError::PathSecurity("../secret".into());
        assert_eq!(err.kind(), "path_security");
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = CoreError::Timeout("exec exceeded 30s".into()).report();
        let json = serde_json::to_string(&report).unwrap();
        let back: ErrorReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, "timeout");
        assert_eq!(back.message, "Timed out: exec exceeded 30s");
    }
}
