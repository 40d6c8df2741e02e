//! Mock transport for testing
//!
//! Scripted command → outcome table with a recorded command log, so tests
//! can assert both what ran and what did not.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ExecOutput, SshTransport};
use crate::error::SshError;

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub local: PathBuf,
    pub remote: String,
    pub mode: u32,
}

#[derive(Default)]
pub struct MockTransport {
    connected: AtomicBool,
    /// Scripted responses (command prefix -> outcome)
    responses: RwLock<Vec<(String, ExecOutput)>>,
    /// Every command issued, in order
    commands: RwLock<Vec<String>>,
    uploads: RwLock<Vec<RecordedUpload>>,
    /// When set, put_file fails with a channel error after recording
    fail_uploads: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// Script an outcome for commands starting with `prefix`.
    /// Unscripted commands succeed with empty output.
    pub fn on_command(&self, prefix: &str, exit_code: i32, stdout: &str, stderr: &str) {
        self.responses.write().push((
            prefix.to_string(),
            ExecOutput {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                exit_code,
            },
        ));
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.read().clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().clone()
    }

    fn find_response(&self, command: &str) -> ExecOutput {
        let responses = self.responses.read();
        for (prefix, outcome) in responses.iter() {
            if command.starts_with(prefix.as_str()) {
                return outcome.clone();
            }
        }
        ExecOutput::default()
    }
}

#[async_trait]
impl SshTransport for MockTransport {
    async fn exec(&self, command: &str, _timeout: Duration) -> Result<ExecOutput, SshError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SshError::ConnectionClosed);
        }
        self.commands.write().push(command.to_string());
        Ok(self.find_response(command))
    }

    async fn put_file(&self, local: &Path, remote: &str, mode: u32) -> Result<u64, SshError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SshError::ConnectionClosed);
        }
        self.uploads.write().push(RecordedUpload {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            mode,
        });
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(SshError::ChannelFailed("mock upload failure".to_string()));
        }
        Ok(0)
    }

    async fn is_alive(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}
