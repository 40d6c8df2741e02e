//! Transport layer for device sessions
//!
//! Two implementations exist:
//! - [`russh::RusshTransport`] for real devices
//! - [`mock::MockTransport`] for tests
//!
//! Both hang off the [`SshTransport`] object trait, mirroring how the rest
//! of the crate only ever sees `Arc<dyn SshTransport>`.

pub mod mock;
pub mod russh;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SshError;

/// Outcome of one remote command
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Transport-agnostic interface to an authenticated device connection
///
/// All operations block the caller until completion. Timeouts end the
/// *local* wait only: SSH offers no remote cancellation, so a timed-out
/// exec means "stopped waiting", never "aborted execution".
#[async_trait]
pub trait SshTransport: Send + Sync {
    /// Run a command and collect stdout, stderr and the exit status.
    async fn exec(&self, command: &str, timeout: Duration) -> Result<ExecOutput, SshError>;

    /// Stream a local file to `remote`, then set its permission bits.
    ///
    /// Returns the number of bytes written. Known gap, preserved on
    /// purpose: a failure partway through leaves a partial file at
    /// `remote`; there is no temp-file + rename step.
    async fn put_file(&self, local: &Path, remote: &str, mode: u32) -> Result<u64, SshError>;

    /// Probe transport liveness. This asks the live connection, not a
    /// stale handle: a peer that dropped the link reports `false` here
    /// even while the handle object still exists.
    async fn is_alive(&self) -> bool;

    /// Close both channels. Close-time errors are swallowed; there is
    /// nothing actionable in them.
    async fn close(&self);
}
