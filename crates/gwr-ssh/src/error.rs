//! SSH layer errors

use gwr_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SshError {
    /// The device rejected the credentials
    #[error("authentication rejected: {0}")]
    AuthFailed(String),

    /// Could not establish the connection
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The remote peer closed the connection
    #[error("connection closed")]
    ConnectionClosed,

    /// Channel-level failure during exec or transfer
    #[error("channel failed: {0}")]
    ChannelFailed(String),

    /// Local wait exceeded; the remote process keeps running
    #[error("timed out: {0}")]
    Timeout(String),

    /// Operation requires a connected session
    #[error("session not connected")]
    NotConnected,

    /// Local filesystem error (reading the file to transfer)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SshError> for CoreError {
    fn from(err: SshError) -> Self {
        match err {
            SshError::AuthFailed(msg) => CoreError::Authentication(msg),
            SshError::Timeout(msg) => CoreError::Timeout(msg),
            SshError::NotConnected => {
                CoreError::Precondition("session not connected".to_string())
            }
            other => CoreError::Transport(other.to_string()),
        }
    }
}
