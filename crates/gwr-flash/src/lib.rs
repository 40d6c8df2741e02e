//! gwr-flash - Radio firmware replacement over a live device session
//!
//! The gateway's Zigbee radio sits behind a serial bridge process. To
//! reflash it the bridge must be parked, a transfer tool and the firmware
//! image staged over SFTP, and an EZSP bootloader handshake driven through
//! the serial device: a sequence with two deliberate failure-tolerance
//! decisions that this crate encodes as data, not as string matching on
//! command text.
//!
//! All orchestration state lives on the device and in the session; the
//! orchestrator itself is stateless, so a caller can resume at any step
//! after a partial failure.

pub mod artifacts;
pub mod error;
pub mod orchestrator;
pub mod steps;
pub mod tweaks;

pub use artifacts::ArtifactStore;
pub use error::{FlashError, FlashResult};
pub use orchestrator::{FlashOrchestrator, FlashReport, ProtocolVersion};
pub use steps::{FlashStep, StepOutcome};
