//! gwr - rescue CLI for the Silvercrest gateway
//!
//! Recovers the device's root credentials from provisioning key material,
//! opens a privileged session, and drives radio firmware replacement.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gwr_core::CoreError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "gwr")]
#[command(author, version, about = "Silvercrest gateway rescue tool")]
#[command(propagate_version = true)]
struct Cli {
    /// Trusted artifact directory (firmware images + transfer tool)
    #[arg(
        long,
        env = "GWR_ARTIFACT_DIR",
        default_value = "binaries",
        global = true
    )]
    artifact_dir: PathBuf,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Connection options shared by commands that touch the device
#[derive(clap::Args)]
struct ConnectOpts {
    /// Device IPv4 address
    #[arg(long)]
    host: String,

    /// SSH port
    #[arg(long, default_value = "22")]
    port: u16,

    /// Root password; omit to recover it from --seed/--line1/--line2
    #[arg(long)]
    password: Option<String>,

    /// Device seed (hex) for credential recovery
    #[arg(long, requires = "line1")]
    seed: Option<String>,

    /// Encrypted credential line 1 (hex)
    #[arg(long)]
    line1: Option<String>,

    /// Encrypted credential line 2 (hex)
    #[arg(long)]
    line2: Option<String>,

    /// Connect timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Recover credentials from the three provisioning hex lines (offline)
    Decode {
        /// Device seed (hex, optionally "label:" prefixed)
        #[arg(long)]
        seed: String,

        /// Encrypted credential line 1 (hex)
        #[arg(long)]
        line1: String,

        /// Encrypted credential line 2 (hex)
        #[arg(long)]
        line2: String,
    },

    /// List firmware images in the trusted artifact directory
    Artifacts,

    /// Replace the radio firmware: stop bridge, stage, handshake, reboot
    Flash {
        #[command(flatten)]
        connect: ConnectOpts,

        /// Firmware image filename (inside the artifact directory)
        #[arg(long)]
        firmware: String,

        /// EZSP protocol version: V7 or V8
        #[arg(long, default_value = "V7")]
        version: String,
    },

    /// One-off device tweaks over a privileged session
    Tweak {
        #[command(flatten)]
        connect: ConnectOpts,

        #[command(subcommand)]
        action: commands::TweakAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let result: Result<(), CoreError> = match cli.command {
        Commands::Decode { seed, line1, line2 } => {
            commands::decode(&seed, &line1, &line2, cli.json)
        }
        Commands::Artifacts => commands::artifacts(&cli.artifact_dir, cli.json),
        Commands::Flash {
            connect,
            firmware,
            version,
        } => {
            commands::flash(
                &connect.into(),
                &cli.artifact_dir,
                &firmware,
                &version,
                cli.json,
            )
            .await
        }
        Commands::Tweak { connect, action } => {
            commands::tweak(&connect.into(), action, cli.json).await
        }
    };

    if let Err(err) = result {
        let report = err.report();
        if cli.json {
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
            );
        } else {
            eprintln!("error [{}]: {}", report.kind, report.message);
        }
        std::process::exit(1);
    }
}

impl From<ConnectOpts> for commands::Connection {
    fn from(opts: ConnectOpts) -> Self {
        commands::Connection {
            host: opts.host,
            port: opts.port,
            password: opts.password,
            seed: opts.seed,
            line1: opts.line1,
            line2: opts.line2,
            timeout: std::time::Duration::from_secs(opts.timeout),
        }
    }
}
