//! gwr-ssh - Remote session management for the gateway device
//!
//! This crate owns the privileged control channel to the device: one
//! authenticated SSH connection per logical actor, carrying both a
//! command-execution channel and an SFTP file channel.
//!
//! The transport is abstracted behind [`SshTransport`] so the session and
//! everything above it can be exercised against [`mock::MockTransport`]
//! without a live device.
//!
//! Sessions are strictly single-caller: the [`SessionRegistry`] hands out
//! `Arc<Mutex<RemoteSession>>` entries and the caller serializes use.

pub mod error;
pub mod registry;
pub mod session;
pub mod transport;

pub use error::SshError;
pub use registry::SessionRegistry;
pub use session::{RemoteSession, SessionState};
pub use transport::{mock, ExecOutput, SshTransport};

/// The device only ever accepts its embedded root account; the username is
/// part of the contract, not caller input.
pub const PRIVILEGED_USER: &str = "root";
