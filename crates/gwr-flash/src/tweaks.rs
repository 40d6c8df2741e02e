//! Small privileged device tweaks
//!
//! Rescue housekeeping that rides the same session and step machinery as
//! flashing: stubbing out the vendor's SSH watchdog, making the serial
//! bridge the only thing started at boot, and pinning a static IP.
//! Each backup step is guarded so repeated runs never clobber the
//! original script.

use std::net::Ipv4Addr;
use std::time::Duration;

use gwr_ssh::RemoteSession;
use tracing::info;

use crate::error::{FlashError, FlashResult};
use crate::steps::{run_steps, FlashStep, StepOutcome};

const TWEAK_TIMEOUT: Duration = Duration::from_secs(30);

/// Replace the vendor SSH watchdog with a no-op, keeping a one-time backup.
/// The watchdog re-locks the root account a few minutes after boot.
pub async fn disable_ssh_monitor(session: &RemoteSession) -> FlashResult<Vec<StepOutcome>> {
    let steps = vec![
        FlashStep::fatal(
            "backup-ssh-monitor",
            "if [ ! -f /tuya/ssh_monitor.original.sh ]; then \
             cp /tuya/ssh_monitor.sh /tuya/ssh_monitor.original.sh; fi",
            TWEAK_TIMEOUT,
        ),
        FlashStep::fatal(
            "stub-ssh-monitor",
            r##"echo "#!/bin/sh" >/tuya/ssh_monitor.sh"##,
            TWEAK_TIMEOUT,
        ),
    ];
    let outcomes = run_steps(session, steps).await?;
    info!("ssh monitor disabled");
    Ok(outcomes)
}

/// Rewrite the boot script so only the serial bridge starts, keeping a
/// one-time backup of the original.
pub async fn enable_serial_bridge(session: &RemoteSession) -> FlashResult<Vec<StepOutcome>> {
    let steps = vec![
        FlashStep::fatal(
            "backup-boot-script",
            "if [ ! -f /tuya/tuya_start.original.sh ]; then \
             cp /tuya/tuya_start.sh /tuya/tuya_start.original.sh; fi",
            TWEAK_TIMEOUT,
        ),
        FlashStep::fatal(
            "rewrite-boot-script",
            "cat >/tuya/tuya_start.sh <<'EOF'\n#!/bin/sh\n/tuya/serialgateway &\nEOF",
            TWEAK_TIMEOUT,
        ),
    ];
    let outcomes = run_steps(session, steps).await?;
    info!("serial bridge boot script installed");
    Ok(outcomes)
}

/// Pin a static IPv4 address on the wired interface.
///
/// The address is validated locally before any command is issued. Killing
/// the DHCP client is tolerated since it may not be running.
pub async fn set_static_ip(session: &RemoteSession, ip: &str) -> FlashResult<Vec<StepOutcome>> {
    let ip: Ipv4Addr = ip
        .parse()
        .map_err(|_| FlashError::Validation(format!("not a valid IPv4 address: {}", ip)))?;

    let steps = vec![
        FlashStep::tolerated("stop-dhcp", "killall udhcpc", TWEAK_TIMEOUT),
        FlashStep::fatal("set-ip", format!("ifconfig eth1 {}", ip), TWEAK_TIMEOUT),
    ];
    let outcomes = run_steps(session, steps).await?;
    info!(%ip, "static address configured");
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gwr_ssh::mock::MockTransport;

    use super::*;

    fn connected_session() -> (RemoteSession, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let mut session = RemoteSession::new("tweak-test");
        session.attach(mock.clone(), "192.168.1.100", 22);
        (session, mock)
    }

    #[tokio::test]
    async fn test_bad_ip_issues_no_commands() {
        let (session, mock) = connected_session();
        let err = set_static_ip(&session, "192.168.1.300").await.unwrap_err();
        assert!(matches!(err, FlashError::Validation(_)));
        assert!(mock.commands().is_empty());
    }

    #[tokio::test]
    async fn test_static_ip_tolerates_missing_dhcp_client() {
        let (session, mock) = connected_session();
        mock.on_command("killall udhcpc", 1, "", "no process killed");

        let outcomes = set_static_ip(&session, "192.168.1.50").await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].succeeded);
        assert!(outcomes[1].succeeded);
        assert_eq!(mock.commands()[1], "ifconfig eth1 192.168.1.50");
    }

    #[tokio::test]
    async fn test_monitor_stub_aborts_if_backup_fails() {
        let (session, mock) = connected_session();
        mock.on_command("if [ ! -f /tuya/ssh_monitor.original.sh ]", 1, "", "disk full");

        let err = disable_ssh_monitor(&session).await.unwrap_err();
        assert!(matches!(err, FlashError::StepFailed { .. }));
        assert_eq!(mock.commands().len(), 1);
    }
}
