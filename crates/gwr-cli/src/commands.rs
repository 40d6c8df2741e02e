//! Command handlers
//!
//! This is the boundary layer the core crates leave to their caller: it
//! owns the session registry, decides credential sourcing, and renders
//! structured results.

use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use clap::Subcommand;
use gwr_core::CoreError;
use gwr_flash::{tweaks, ArtifactStore, FlashOrchestrator, ProtocolVersion};
use gwr_keys::recover_credentials;
use gwr_ssh::SessionRegistry;
use serde_json::json;
use tracing::warn;

/// Resolved connection parameters
pub struct Connection {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub seed: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub timeout: Duration,
}

impl Connection {
    /// Device address, validated before any network activity starts.
    fn host_addr(&self) -> Result<Ipv4Addr, CoreError> {
        self.host.parse().map_err(|_| {
            CoreError::Validation(format!("not a valid IPv4 address: {}", self.host))
        })
    }

    /// Root password: given directly, or recovered from the seed trio.
    fn root_password(&self) -> Result<String, CoreError> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }
        match (&self.seed, &self.line1, &self.line2) {
            (Some(seed), Some(l1), Some(l2)) => {
                Ok(recover_credentials(seed, l1, l2)?.root_password)
            }
            _ => Err(CoreError::Validation(
                "provide --password or all of --seed/--line1/--line2".to_string(),
            )),
        }
    }
}

#[derive(Subcommand)]
pub enum TweakAction {
    /// Stub out the vendor SSH watchdog (keeps a one-time backup)
    DisableSshMonitor,
    /// Make the serial bridge the only boot-time service
    EnableSerialBridge,
    /// Pin a static IPv4 address on eth1
    SetStaticIp {
        #[arg(long)]
        ip: String,
    },
}

pub fn decode(seed: &str, line1: &str, line2: &str, json_out: bool) -> Result<(), CoreError> {
    let creds = recover_credentials(seed, line1, line2)?;
    if json_out {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "access_key": creds.access_key,
                "root_password": creds.root_password,
            }))
            .unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("access key:    {}", creds.access_key);
        println!("root password: {}", creds.root_password);
    }
    Ok(())
}

pub fn artifacts(dir: &Path, json_out: bool) -> Result<(), CoreError> {
    let store = ArtifactStore::new(dir);
    let files = store.list();
    if json_out {
        println!(
            "{}",
            serde_json::to_string_pretty(&files).unwrap_or_else(|_| "[]".to_string())
        );
    } else if files.is_empty() {
        println!("no artifacts in {}", dir.display());
    } else {
        for f in &files {
            println!("{}", f);
        }
    }
    Ok(())
}

pub async fn flash(
    conn: &Connection,
    artifact_dir: &Path,
    firmware: &str,
    version: &str,
    json_out: bool,
) -> Result<(), CoreError> {
    // Everything locally checkable fails before the device is touched.
    let version: ProtocolVersion = version.parse().map_err(CoreError::from)?;
    let store = ArtifactStore::new(artifact_dir);
    let host = conn.host_addr()?;
    let password = conn.root_password()?;

    let registry = SessionRegistry::new();
    let handle = registry.get_or_create("cli");
    let mut session = handle.lock().await;
    session
        .connect(&host.to_string(), conn.port, &password, conn.timeout)
        .await
        .map_err(CoreError::from)?;

    let mut orch = FlashOrchestrator::new(&mut session, &store);

    let run = async {
        orch.stop_service().await?;
        orch.upload_artifacts(firmware).await?;
        orch.flash(version).await
    };
    let report = match run.await {
        Ok(report) => report,
        Err(e) => {
            // Put the bridge back so the gateway still works after abort.
            if let Err(restore_err) = orch.restore_service().await {
                warn!(error = %restore_err, "bridge restore after aborted flash failed");
            }
            session.disconnect().await;
            return Err(e.into());
        }
    };

    orch.reboot().await.map_err(CoreError::from)?;
    drop(session);
    registry.remove("cli");

    if json_out {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        for step in &report.steps {
            let mark = if step.succeeded { "ok" } else { "!!" };
            println!("[{}] {}", mark, step.name);
        }
        if !report.transfer_exit_ok {
            println!("note: transfer tool exit untrusted; flash completed, device rebooting");
        }
        println!("done, device is rebooting");
    }
    Ok(())
}

pub async fn tweak(
    conn: &Connection,
    action: TweakAction,
    json_out: bool,
) -> Result<(), CoreError> {
    let host = conn.host_addr()?;
    let password = conn.root_password()?;

    let registry = SessionRegistry::new();
    let handle = registry.get_or_create("cli");
    let mut session = handle.lock().await;
    session
        .connect(&host.to_string(), conn.port, &password, conn.timeout)
        .await
        .map_err(CoreError::from)?;

    let outcomes = match &action {
        TweakAction::DisableSshMonitor => tweaks::disable_ssh_monitor(&session).await,
        TweakAction::EnableSerialBridge => tweaks::enable_serial_bridge(&session).await,
        TweakAction::SetStaticIp { ip } => tweaks::set_static_ip(&session, ip).await,
    };
    session.disconnect().await;
    let outcomes = outcomes.map_err(CoreError::from)?;

    if json_out {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcomes).unwrap_or_else(|_| "[]".to_string())
        );
    } else {
        for step in &outcomes {
            let mark = if step.succeeded { "ok" } else { "!!" };
            println!("[{}] {}", mark, step.name);
        }
    }
    Ok(())
}
