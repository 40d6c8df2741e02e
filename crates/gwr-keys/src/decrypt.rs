//! Credential blob decryption
//!
//! The blob is two AES-128 blocks with no chaining between them: the
//! provisioning tool prints each 16-byte line independently encrypted.
//! There is no padding to strip; the plaintext is always the full 32 bytes.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, KeyInit};
use aes::Aes128;

use crate::error::{KeyError, KeyResult};

/// Recovered plaintext credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// First 24 characters of the plaintext
    pub access_key: String,
    /// Last 8 characters of the plaintext
    pub root_password: String,
}

/// Decrypt the 32-byte credential blob with the derived KEK.
///
/// Each 16-byte block decrypts independently; there is no chaining, so
/// swapping ciphertext blocks swaps plaintext blocks. A single byte outside
/// ASCII invalidates the whole result.
pub fn decrypt_credential(key: &[u8; 16], blob: &[u8; 32]) -> KeyResult<Credentials> {
    let cipher = Aes128::new(GenericArray::from_slice(key));

    let mut plain = *blob;
    for block in plain.chunks_exact_mut(16) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }

    if let Some((offset, &byte)) = plain.iter().enumerate().find(|(_, b)| !b.is_ascii()) {
        return Err(KeyError::NotAscii { byte, offset });
    }

    // All 32 bytes verified ASCII above, one byte per char
    let text: String = plain.iter().map(|&b| b as char).collect();
    Ok(Credentials {
        access_key: text[..24].to_string(),
        root_password: text[24..].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockEncrypt;
    use pretty_assertions::assert_eq;

    const K0: [u8; 16] = [0x21; 16];

    fn encrypt_blocks(key: &[u8; 16], plain: &[u8; 32]) -> [u8; 32] {
        let cipher = Aes128::new(GenericArray::from_slice(key));
        let mut blob = *plain;
        for block in blob.chunks_exact_mut(16) {
            cipher.encrypt_block(GenericArray::from_mut_slice(block));
        }
        blob
    }

    #[test]
    fn test_split_is_24_plus_8() {
        let plain = *b"AUSKEY-0123456789ABCDEF-pw12345!";
        let blob = encrypt_blocks(&K0, &plain);

        let creds = decrypt_credential(&K0, &blob).unwrap();
        assert_eq!(creds.access_key, "AUSKEY-0123456789ABCDEF-");
        assert_eq!(creds.root_password, "pw12345!");
        assert_eq!(creds.access_key.len(), 24);
        assert_eq!(creds.root_password.len(), 8);
    }

    #[test]
    fn test_no_cross_block_coupling() {
        let plain = *b"block-one-text!!block-two-text!!";
        let blob = encrypt_blocks(&K0, &plain);

        // Swapping the ciphertext blocks swaps the plaintext blocks: each
        // block stands alone.
        let mut swapped = [0u8; 32];
        swapped[..16].copy_from_slice(&blob[16..]);
        swapped[16..].copy_from_slice(&blob[..16]);

        let creds = decrypt_credential(&K0, &swapped).unwrap();
        let text = format!("{}{}", creds.access_key, creds.root_password);
        assert_eq!(text.as_bytes()[..16], plain[16..]);
        assert_eq!(text.as_bytes()[16..], plain[..16]);
    }

    #[test]
    fn test_non_ascii_byte_rejected() {
        let mut plain = *b"AUSKEY-0123456789ABCDEF-pw12345!";
        plain[30] = 0xC3;
        let blob = encrypt_blocks(&K0, &plain);

        let err = decrypt_credential(&K0, &blob).unwrap_err();
        assert!(matches!(
            err,
            KeyError::NotAscii {
                byte: 0xC3,
                offset: 30
            }
        ));
    }

    #[test]
    fn test_deterministic_with_golden_key() {
        // K0 is the derivation of the all-zero seed; decryption must have
        // no hidden state across invocations.
        let blob = encrypt_blocks(&K0, b"AUSKEY-0123456789ABCDEF-pw12345!");
        let a = decrypt_credential(&K0, &blob).unwrap();
        let b = decrypt_credential(&K0, &blob).unwrap();
        assert_eq!(a, b);
    }
}
