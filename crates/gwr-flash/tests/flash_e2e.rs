//! End-to-end flash sequence over the mock transport

use std::sync::Arc;

use gwr_flash::orchestrator::{BRIDGE_BINARY, BRIDGE_PARKED, STAGED_FIRMWARE, STAGED_TOOL};
use gwr_flash::{ArtifactStore, FlashError, FlashOrchestrator, ProtocolVersion};
use gwr_ssh::mock::MockTransport;
use gwr_ssh::{RemoteSession, SessionState};

fn connected_session() -> (RemoteSession, Arc<MockTransport>) {
    let mock = Arc::new(MockTransport::new());
    let mut session = RemoteSession::new("e2e");
    session.attach(mock.clone(), "192.168.1.100", 22);
    (session, mock)
}

fn artifact_store() -> (tempfile::TempDir, ArtifactStore) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sx.bin"), b"\x7fELFtool").unwrap();
    std::fs::write(dir.path().join("ncp-uart-sw-6.7.8.gbl"), vec![0xEB; 4096]).unwrap();
    let store = ArtifactStore::new(dir.path());
    (dir, store)
}

#[tokio::test]
async fn full_sequence_stop_upload_flash_reboot() {
    let (mut session, mock) = connected_session();
    let (_dir, store) = artifact_store();
    // Transfer tool lies about failure; the run must still complete.
    mock.on_command("/tmp/sx", 1, "", "xmodem: retry limit");

    let mut orch = FlashOrchestrator::new(&mut session, &store);
    orch.stop_service().await.unwrap();
    orch.upload_artifacts("ncp-uart-sw-6.7.8.gbl").await.unwrap();
    let report = orch.flash(ProtocolVersion::V7).await.unwrap();
    assert!(!report.transfer_exit_ok);
    orch.reboot().await.unwrap();

    assert_eq!(session.state(), SessionState::Disconnected);

    let commands = mock.commands();
    // stop (2) + flash (8) + reboot (1)
    assert_eq!(commands.len(), 11);
    assert_eq!(commands[0], format!("mv {} {}", BRIDGE_BINARY, BRIDGE_PARKED));
    assert!(commands[2].starts_with("stty -F /dev/ttyS1"));
    assert_eq!(
        commands[9],
        format!("{} {} < /dev/ttyS1 > /dev/ttyS1", STAGED_TOOL, STAGED_FIRMWARE)
    );
    assert_eq!(commands[10], "reboot &");

    let uploads = mock.uploads();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].remote, STAGED_TOOL);
    assert_eq!(uploads[1].remote, STAGED_FIRMWARE);
}

#[tokio::test]
async fn aborted_flash_restores_bridge() {
    let (mut session, mock) = connected_session();
    let (_dir, store) = artifact_store();
    mock.on_command("echo -en", 1, "", "tty write error");

    let mut orch = FlashOrchestrator::new(&mut session, &store);
    orch.stop_service().await.unwrap();
    let err = orch.flash(ProtocolVersion::V8).await.unwrap_err();
    assert!(matches!(err, FlashError::StepFailed { name: "reset-frame", .. }));

    // Caller aborts before reboot: the bridge comes back.
    orch.restore_service().await.unwrap();
    assert!(session.is_connected().await);
    assert_eq!(
        mock.commands().last().unwrap(),
        &format!("mv {} {}", BRIDGE_PARKED, BRIDGE_BINARY)
    );
}
