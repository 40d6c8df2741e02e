//! Error types for credential recovery

use thiserror::Error;

/// Errors that can occur during credential recovery
#[derive(Debug, Error)]
pub enum KeyError {
    /// Seed must be exactly 16 bytes
    #[error("seed incorrect length: should be 16, was {actual}")]
    SeedLength { actual: usize },

    /// Combined cipher blob must be exactly 32 bytes
    #[error("cipher blob incorrect length: should be 32, was {actual}")]
    BlobLength { actual: usize },

    /// Hex payload failed to decode
    #[error("invalid hex input: {0}")]
    InvalidHex(String),

    /// Decrypted credential contained a byte outside ASCII
    #[error("decrypted credential is not ASCII (byte 0x{byte:02X} at offset {offset})")]
    NotAscii { byte: u8, offset: usize },
}

/// Result type for credential recovery operations
pub type KeyResult<T> = Result<T, KeyError>;
