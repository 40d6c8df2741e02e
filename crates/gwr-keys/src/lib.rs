//! gwr-keys - Credential recovery for the Silvercrest gateway
//!
//! The gateway's root credentials ship encrypted in two hex lines printed
//! by the vendor provisioning tool, keyed by a per-device 16-byte seed.
//! This crate turns those three hex strings back into the plaintext
//! access key and root password.
//!
//! Everything here is pure: no I/O, no state, deterministic output for a
//! given input.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gwr_keys::recover_credentials;
//!
//! let creds = recover_credentials(
//!     "kek: 30 31 32 33 34 35 36 37 38 39 41 42 43 44 45 46",
//!     "auskey1: 00112233445566778899aabbccddeeff",
//!     "auskey2: ffeeddccbbaa99887766554433221100",
//! )?;
//! println!("root password: {}", creds.root_password);
//! ```

mod decrypt;
mod error;
mod hexin;
mod kek;

pub use decrypt::{decrypt_credential, Credentials};
pub use error::{KeyError, KeyResult};
pub use hexin::parse_hex_input;
pub use kek::derive_kek;

use gwr_core::CoreError;

/// Recover the plaintext credentials from the three provisioning hex lines.
///
/// Each input may carry a `label:` prefix and embedded whitespace, exactly
/// as copied from the vendor tool's output. Any failure along the way
/// surfaces as a single [`KeyError`] preserving the original cause.
pub fn recover_credentials(
    seed_hex: &str,
    blob_line1_hex: &str,
    blob_line2_hex: &str,
) -> KeyResult<Credentials> {
    let seed = parse_hex_input(seed_hex)?;
    let kek = derive_kek(&seed)?;

    let mut blob = parse_hex_input(blob_line1_hex)?;
    blob.extend(parse_hex_input(blob_line2_hex)?);
    let blob: [u8; 32] = blob
        .try_into()
        .map_err(|b: Vec<u8>| KeyError::BlobLength { actual: b.len() })?;

    let creds = decrypt_credential(&kek, &blob)?;
    tracing::debug!("credentials recovered");
    Ok(creds)
}

impl From<KeyError> for CoreError {
    fn from(err: KeyError) -> Self {
        CoreError::Validation(err.to_string())
    }
}
