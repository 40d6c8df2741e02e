//! Remote session state machine
//!
//! `Disconnected -> Connecting -> Connected -> Disconnected`. A failed
//! connect always lands back in Disconnected; disconnect and reboot reach
//! Disconnected from any state.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::SshError;
use crate::transport::russh::RusshTransport;
use crate::transport::{ExecOutput, SshTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// One privileged control session to a device
///
/// Strictly single-caller: nothing here synchronizes concurrent use of the
/// same session. The registry wraps each session in a `Mutex` and callers
/// hold it across each operation.
pub struct RemoteSession {
    id: String,
    host: Option<String>,
    port: Option<u16>,
    state: SessionState,
    transport: Option<Arc<dyn SshTransport>>,
}

impl RemoteSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            host: None,
            port: None,
            state: SessionState::Disconnected,
            transport: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connect and authenticate as the fixed privileged account.
    ///
    /// Reconnecting an already-connected session replaces the prior
    /// transport; the old channels are closed best-effort first.
    pub async fn connect(
        &mut self,
        host: &str,
        port: u16,
        password: &str,
        timeout: Duration,
    ) -> Result<(), SshError> {
        if let Some(old) = self.transport.take() {
            old.close().await;
        }
        self.state = SessionState::Connecting;

        match RusshTransport::connect(host, port, password, timeout).await {
            Ok(transport) => {
                self.attach(Arc::new(transport), host, port);
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Disconnected;
                self.host = None;
                self.port = None;
                Err(e)
            }
        }
    }

    /// Adopt an already-connected transport. This is how tests (and any
    /// alternate transport) enter the Connected state.
    pub fn attach(&mut self, transport: Arc<dyn SshTransport>, host: &str, port: u16) {
        self.transport = Some(transport);
        self.host = Some(host.to_string());
        self.port = Some(port);
        self.state = SessionState::Connected;
        info!(id = %self.id, host, port, "session connected");
    }

    /// Probe the live transport. A session whose peer dropped the link
    /// reports `false`, and the observation is folded back into the state
    /// machine: the dead transport is dropped and the session lands in
    /// Disconnected.
    pub async fn is_connected(&mut self) -> bool {
        let alive = match &self.transport {
            Some(t) => t.is_alive().await,
            None => false,
        };
        if !alive && self.state != SessionState::Disconnected {
            warn!(id = %self.id, "remote closed the connection");
            self.transport = None;
            self.host = None;
            self.port = None;
            self.state = SessionState::Disconnected;
        }
        alive
    }

    fn transport(&self) -> Result<&Arc<dyn SshTransport>, SshError> {
        match self.state {
            SessionState::Connected => self.transport.as_ref().ok_or(SshError::NotConnected),
            _ => Err(SshError::NotConnected),
        }
    }

    /// Run a remote command, blocking until it exits or `timeout` elapses.
    ///
    /// A timeout stops the local wait only; the remote process is not
    /// cancelled.
    pub async fn execute_command(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, SshError> {
        self.transport()?.exec(command, timeout).await
    }

    /// Stream a local file to the device and set its permission bits.
    /// Returns bytes written. A mid-transfer failure leaves a partial
    /// remote file (no temp + rename safeguard).
    pub async fn transfer_file(
        &self,
        local: &Path,
        remote: &str,
        mode: u32,
    ) -> Result<u64, SshError> {
        self.transport()?.put_file(local, remote, mode).await
    }

    /// Close both channels and reset to Disconnected. Close-time errors
    /// are swallowed.
    pub async fn disconnect(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.close().await;
        }
        self.host = None;
        self.port = None;
        self.state = SessionState::Disconnected;
        info!(id = %self.id, "session disconnected");
    }

    /// Reboot the device: fire the command in the background and tear down
    /// local state immediately. The channel drops during reboot regardless,
    /// so the command's outcome is deliberately ignored.
    pub async fn reboot(&mut self) {
        if let Ok(transport) = self.transport() {
            if let Err(e) = transport.exec("reboot &", Duration::from_secs(5)).await {
                warn!(id = %self.id, error = %e, "reboot command not acknowledged (expected)");
            }
        }
        self.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn connected_session() -> (RemoteSession, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let mut session = RemoteSession::new("test");
        session.attach(mock.clone(), "192.168.1.100", 22);
        (session, mock)
    }

    #[tokio::test]
    async fn test_execute_requires_connection() {
        let session = RemoteSession::new("test");
        let err = session
            .execute_command("true", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SshError::NotConnected));
    }

    #[tokio::test]
    async fn test_disconnect_resets_state() {
        let (mut session, _mock) = connected_session();
        assert!(session.is_connected().await);
        assert_eq!(session.host(), Some("192.168.1.100"));

        session.disconnect().await;
        assert!(!session.is_connected().await);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.host(), None);
    }

    #[tokio::test]
    async fn test_remote_closure_observed_lazily() {
        let (mut session, mock) = connected_session();
        assert!(session.is_connected().await);
        assert_eq!(session.state(), SessionState::Connected);

        // Peer drops the link; the handle object still exists locally.
        // The probe both reports the closure and takes the transition.
        mock.set_connected(false);
        assert!(!session.is_connected().await);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.host(), None);

        // Subsequent operations hit the precondition, not the dead link
        let err = session
            .execute_command("true", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SshError::NotConnected));
    }

    #[tokio::test]
    async fn test_exec_flows_through_transport() {
        let (session, mock) = connected_session();
        mock.on_command("cat /etc/version", 0, "2.1.0\n", "");

        let out = session
            .execute_command("cat /etc/version", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, "2.1.0\n");
        assert_eq!(mock.commands(), vec!["cat /etc/version"]);
    }

    #[tokio::test]
    async fn test_reboot_fires_and_forgets() {
        let (mut session, mock) = connected_session();
        // Nonzero exit must not matter; the channel drops mid-reboot anyway.
        mock.on_command("reboot &", 1, "", "connection reset");

        session.reboot().await;
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(mock.commands(), vec!["reboot &"]);
    }
}
