//! russh-backed transport
//!
//! One authenticated russh client handle per transport, plus one SFTP
//! subsystem channel opened at connect time. Exec runs each command on a
//! fresh session channel (SSH channels are single-exec).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::keys::ssh_key;
use russh::{ChannelMsg, Disconnect};
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::FileAttributes;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{ExecOutput, SshTransport};
use crate::error::SshError;
use crate::PRIVILEGED_USER;

/// Accepts whatever host key the device presents. The gateway regenerates
/// its key on factory reset, and rescue happens on a point-to-point link,
/// so there is no key continuity to verify against.
struct AcceptingHandler;

impl client::Handler for AcceptingHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

pub struct RusshTransport {
    handle: Mutex<Handle<AcceptingHandler>>,
    sftp: SftpSession,
}

impl RusshTransport {
    /// Connect and authenticate as the fixed privileged account, bounded
    /// by `timeout` for the whole handshake.
    pub async fn connect(
        host: &str,
        port: u16,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, SshError> {
        let config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let connect = async {
            let mut handle = client::connect(config, (host, port), AcceptingHandler)
                .await
                .map_err(|e| SshError::ConnectionFailed(e.to_string()))?;

            let auth = handle
                .authenticate_password(PRIVILEGED_USER, password)
                .await
                .map_err(|e| SshError::ConnectionFailed(e.to_string()))?;
            if !auth.success() {
                return Err(SshError::AuthFailed(format!(
                    "password rejected for {}@{}:{}",
                    PRIVILEGED_USER, host, port
                )));
            }

            // File channel: SFTP subsystem on its own session channel
            let mut channel = handle
                .channel_open_session()
                .await
                .map_err(|e| SshError::ChannelFailed(e.to_string()))?;
            channel
                .request_subsystem(true, "sftp")
                .await
                .map_err(|e| SshError::ChannelFailed(e.to_string()))?;
            let sftp = SftpSession::new(channel.into_stream())
                .await
                .map_err(|e| SshError::ChannelFailed(e.to_string()))?;

            Ok(Self {
                handle: Mutex::new(handle),
                sftp,
            })
        };

        match tokio::time::timeout(timeout, connect).await {
            Ok(result) => {
                if result.is_ok() {
                    info!(host, port, "SSH connected");
                }
                result
            }
            Err(_) => Err(SshError::Timeout(format!(
                "connect to {}:{} exceeded {:?}",
                host, port, timeout
            ))),
        }
    }
}

#[async_trait]
impl SshTransport for RusshTransport {
    async fn exec(&self, command: &str, timeout: Duration) -> Result<ExecOutput, SshError> {
        let handle = self.handle.lock().await;

        let run = async {
            let mut channel = handle
                .channel_open_session()
                .await
                .map_err(|e| SshError::ChannelFailed(e.to_string()))?;
            channel
                .exec(true, command)
                .await
                .map_err(|e| SshError::ChannelFailed(e.to_string()))?;

            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let mut exit_code = None;

            while let Some(msg) = channel.wait().await {
                match msg {
                    ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                    ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                        stderr.extend_from_slice(data)
                    }
                    ChannelMsg::ExitStatus { exit_status } => {
                        exit_code = Some(exit_status as i32);
                    }
                    _ => {}
                }
            }

            // A channel torn down without an exit status (device rebooting,
            // link dropped) reports -1 rather than pretending success.
            Ok(ExecOutput {
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
                exit_code: exit_code.unwrap_or(-1),
            })
        };

        match tokio::time::timeout(timeout, run).await {
            Ok(result) => {
                if let Ok(ref out) = result {
                    debug!(command, exit_code = out.exit_code, "exec finished");
                }
                result
            }
            // The remote process is NOT cancelled; we only stop waiting.
            Err(_) => {
                warn!(command, ?timeout, "exec timed out (remote process left running)");
                Err(SshError::Timeout(format!(
                    "command exceeded {:?}: {}",
                    timeout, command
                )))
            }
        }
    }

    async fn put_file(&self, local: &Path, remote: &str, mode: u32) -> Result<u64, SshError> {
        let mut src = tokio::fs::File::open(local).await?;

        let mut dst = self
            .sftp
            .create(remote)
            .await
            .map_err(|e| SshError::ChannelFailed(format!("sftp create {}: {}", remote, e)))?;

        let written = tokio::io::copy(&mut src, &mut dst)
            .await
            .map_err(|e| SshError::ChannelFailed(format!("sftp write {}: {}", remote, e)))?;
        dst.shutdown()
            .await
            .map_err(|e| SshError::ChannelFailed(format!("sftp flush {}: {}", remote, e)))?;

        let attrs = FileAttributes {
            permissions: Some(mode),
            ..Default::default()
        };
        self.sftp
            .set_metadata(remote, attrs)
            .await
            .map_err(|e| SshError::ChannelFailed(format!("sftp chmod {}: {}", remote, e)))?;

        info!(local = %local.display(), remote, written, "file transferred");
        Ok(written)
    }

    async fn is_alive(&self) -> bool {
        !self.handle.lock().await.is_closed()
    }

    async fn close(&self) {
        let handle = self.handle.lock().await;
        let _ = handle
            .disconnect(Disconnect::ByApplication, "session closed", "en")
            .await;
    }
}
