//! Firmware flash orchestration
//!
//! Drives the EZSP bootloader handshake over the device's serial line and
//! pushes the firmware with the staged transfer tool. The handshake frames
//! are opaque vendor byte contracts; they are carried here as exact
//! literals and never interpreted.

use std::str::FromStr;
use std::time::Duration;

use gwr_ssh::RemoteSession;
use serde::Serialize;
use tracing::{info, warn};

use crate::artifacts::{ArtifactStore, TRANSFER_TOOL};
use crate::error::{FlashError, FlashResult};
use crate::steps::{run_steps, FlashStep, StepOutcome};

/// Serial device the radio module hangs off
pub const SERIAL_DEVICE: &str = "/dev/ttyS1";
/// Running serial bridge binary on the device
pub const BRIDGE_BINARY: &str = "/tuya/serialgateway";
/// Where the bridge is parked while flashing
pub const BRIDGE_PARKED: &str = "/tuya/serialgateway_norun";
/// Staging path for the transfer tool
pub const STAGED_TOOL: &str = "/tmp/sx";
/// Staging path for the firmware image
pub const STAGED_FIRMWARE: &str = "/tmp/firmware.gbl";

const STEP_TIMEOUT: Duration = Duration::from_secs(60);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(120);

/// EZSP protocol version tag selecting the bootloader handshake frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProtocolVersion {
    V7,
    V8,
}

impl ProtocolVersion {
    /// Version-selected handshake frame (shell-escaped byte literal)
    fn handshake_frame(self) -> &'static str {
        match self {
            ProtocolVersion::V7 => r"\x00\x42\x21\xA8\x53\xDD\x4F\x7E",
            ProtocolVersion::V8 => r"\x00\x42\x21\xA8\x5C\x2C\xA0\x7E",
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = FlashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "V7" => Ok(ProtocolVersion::V7),
            "V8" => Ok(ProtocolVersion::V8),
            other => Err(FlashError::Validation(format!(
                "protocol version must be V7 or V8, got '{}'",
                other
            ))),
        }
    }
}

/// Result of a full flash sequence
#[derive(Debug, Serialize)]
pub struct FlashReport {
    pub steps: Vec<StepOutcome>,
    /// False when the transfer tool exited nonzero. Its exit status is a
    /// known liar under serial timing races, so this is diagnostic only;
    /// the flash still counts as complete.
    pub transfer_exit_ok: bool,
}

/// Drives the flash sequence over one connected session.
///
/// Keeps no state of its own: everything lives on the device and in the
/// session, so a caller may resume at any step after a partial failure.
/// No step is retried automatically.
pub struct FlashOrchestrator<'a> {
    session: &'a mut RemoteSession,
    artifacts: &'a ArtifactStore,
}

impl<'a> FlashOrchestrator<'a> {
    pub fn new(session: &'a mut RemoteSession, artifacts: &'a ArtifactStore) -> Self {
        Self { session, artifacts }
    }

    async fn ensure_connected(&mut self) -> FlashResult<()> {
        if !self.session.is_connected().await {
            return Err(FlashError::Session(gwr_ssh::SshError::NotConnected));
        }
        Ok(())
    }

    /// Park the serial bridge binary and kill the running process.
    ///
    /// The rename is fatal: without it the bridge respawns on reboot and
    /// reclaims the serial line. The kill is best-effort; the process may
    /// already be gone.
    pub async fn stop_service(&mut self) -> FlashResult<Vec<StepOutcome>> {
        self.ensure_connected().await?;
        let steps = vec![
            FlashStep::fatal(
                "park-bridge",
                format!("mv {} {}", BRIDGE_BINARY, BRIDGE_PARKED),
                STEP_TIMEOUT,
            ),
            FlashStep::tolerated("kill-bridge", "killall serialgateway", STEP_TIMEOUT),
        ];
        let outcomes = run_steps(self.session, steps).await?;
        info!("serial bridge stopped");
        Ok(outcomes)
    }

    /// Inverse of [`stop_service`](Self::stop_service)'s rename; used when
    /// aborting before reboot.
    pub async fn restore_service(&mut self) -> FlashResult<Vec<StepOutcome>> {
        self.ensure_connected().await?;
        let steps = vec![FlashStep::fatal(
            "restore-bridge",
            format!("mv {} {}", BRIDGE_PARKED, BRIDGE_BINARY),
            STEP_TIMEOUT,
        )];
        run_steps(self.session, steps).await
    }

    /// Stage the transfer tool and the named firmware image.
    ///
    /// The firmware name resolves only inside the trusted artifact
    /// directory and must carry the expected extension; both checks happen
    /// before any transfer starts.
    pub async fn upload_artifacts(&mut self, firmware_filename: &str) -> FlashResult<u64> {
        self.ensure_connected().await?;

        let tool = self.artifacts.resolve(TRANSFER_TOOL)?;
        let firmware = self.artifacts.resolve_firmware(firmware_filename)?;

        self.session
            .transfer_file(&tool, STAGED_TOOL, 0o755)
            .await?;
        let firmware_bytes = self
            .session
            .transfer_file(&firmware, STAGED_FIRMWARE, 0o644)
            .await?;

        info!(firmware = firmware_filename, firmware_bytes, "artifacts staged");
        Ok(firmware_bytes)
    }

    /// Run the bootloader handshake and push the firmware.
    ///
    /// Steps 1-6 are fatal on nonzero exit. The final transfer-tool
    /// invocation is different: XMODEM over this serial line races the
    /// bootloader's timing and can report failure on a flash that
    /// genuinely succeeded, so its exit status is recorded but never
    /// aborts; the caller proceeds to reboot regardless.
    pub async fn flash(&mut self, version: ProtocolVersion) -> FlashResult<FlashReport> {
        self.ensure_connected().await?;

        let steps = vec![
            FlashStep::fatal(
                "serial-bootloader-mode",
                format!(
                    "stty -F {} 115200 cs8 -cstopb -parenb -ixon crtscts raw",
                    SERIAL_DEVICE
                ),
                STEP_TIMEOUT,
            ),
            FlashStep::fatal(
                "reset-frame",
                format!(r"echo -en '\x1A\xC0\x38\xBC\x7E' > {}", SERIAL_DEVICE),
                STEP_TIMEOUT,
            ),
            FlashStep::fatal(
                "handshake-frame",
                format!("echo -en '{}' > {}", version.handshake_frame(), SERIAL_DEVICE),
                STEP_TIMEOUT,
            ),
            FlashStep::fatal(
                "protocol-frame-1",
                format!(r"echo -en '\x81\x60\x59\x7E' > {}", SERIAL_DEVICE),
                STEP_TIMEOUT,
            ),
            FlashStep::fatal(
                "protocol-frame-2",
                format!(
                    r"echo -en '\x7D\x31\x43\x21\x27\x55\x6E\x90\x7E' > {}",
                    SERIAL_DEVICE
                ),
                STEP_TIMEOUT,
            ),
            FlashStep::fatal(
                "serial-transfer-mode",
                format!(
                    "stty -F {} 115200 cs8 -cstopb -parenb -ixon -crtscts raw",
                    SERIAL_DEVICE
                ),
                STEP_TIMEOUT,
            ),
            FlashStep::fatal(
                "menu-select",
                format!("echo -e '1' > {}", SERIAL_DEVICE),
                STEP_TIMEOUT,
            ),
            FlashStep::tolerated(
                "push-firmware",
                format!(
                    "{} {} < {} > {}",
                    STAGED_TOOL, STAGED_FIRMWARE, SERIAL_DEVICE, SERIAL_DEVICE
                ),
                TRANSFER_TIMEOUT,
            ),
        ];

        let outcomes = run_steps(self.session, steps).await?;
        let transfer_exit_ok = outcomes
            .last()
            .map(|o| o.exit_code == 0)
            .unwrap_or(false);
        if !transfer_exit_ok {
            warn!("transfer tool exited nonzero; status untrusted, flash proceeds to reboot");
        }
        info!(?version, transfer_exit_ok, "flash sequence complete");

        Ok(FlashReport {
            steps: outcomes,
            transfer_exit_ok,
        })
    }

    /// Reboot the device and drop the session without waiting for the
    /// peer; the channel dies mid-reboot regardless.
    pub async fn reboot(&mut self) -> FlashResult<()> {
        self.ensure_connected().await?;
        self.session.reboot().await;
        Ok(())
    }
}
