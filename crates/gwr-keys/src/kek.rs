//! KEK derivation from the per-device seed
//!
//! The gateway firmware derives its key-encryption key with signed 8-bit
//! arithmetic (C `signed char`), so every intermediate value here is taken
//! modulo 256 and reinterpreted in -128..127. Rust's `/` on signed
//! integers truncates toward zero, matching the firmware's division.

use crate::error::{KeyError, KeyResult};

/// Reduce to 8 bits and reinterpret as signed (two's complement).
#[inline]
fn wrap8(v: i32) -> i8 {
    v as u8 as i8
}

/// Derive the 16-byte KEK from a 16-byte device seed.
///
/// One output byte per input byte, in input order. Total over any 16-byte
/// input; any other length is rejected before arithmetic starts.
pub fn derive_kek(seed: &[u8]) -> KeyResult<[u8; 16]> {
    if seed.len() != 16 {
        return Err(KeyError::SeedLength { actual: seed.len() });
    }

    let s0 = seed[0] as i32;
    let mut kek = [0u8; 16];
    for (out, &b) in kek.iter_mut().zip(seed) {
        let t1 = wrap8(s0.wrapping_mul(b as i32));
        let t2 = wrap8(t1 as i32 / 0x5D);
        *out = wrap8(t1 as i32 + t2 as i32 * -0x5D + i32::from(b'!')) as u8;
    }
    Ok(kek)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zero_seed_golden_vector() {
        // seed[0] = 0 zeroes both intermediates, leaving only the '!' bias.
        let kek = derive_kek(&[0u8; 16]).unwrap();
        assert_eq!(kek, [0x21u8; 16]);
    }

    #[test]
    fn test_signed_wraparound_and_truncating_division() {
        // seed[0] = 2, b = 0x50: 160 wraps to -96; -96 / 93 truncates to -1
        // (not -2 as floor division would give); -96 + 93 + 33 = 30.
        let mut seed = [0u8; 16];
        seed[0] = 2;
        seed[1] = 0x50;
        let kek = derive_kek(&seed).unwrap();
        assert_eq!(kek[1], 30);
        // b = 0: product 0, output is plain '!'
        assert_eq!(kek[2], 0x21);
    }

    #[test]
    fn test_identity_multiplier() {
        let mut seed = [0u8; 16];
        seed[0] = 1;
        seed[1] = 0xFF;
        let kek = derive_kek(&seed).unwrap();
        // b = 1: t1 = 1, t2 = 0, out = 34
        assert_eq!(kek[0], 34);
        // b = 0xFF reinterprets as -1: out = -1 + 0 + 33 = 32
        assert_eq!(kek[1], 32);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(matches!(
            derive_kek(&[0u8; 15]),
            Err(KeyError::SeedLength { actual: 15 })
        ));
        assert!(derive_kek(&[0u8; 17]).is_err());
        assert!(derive_kek(&[]).is_err());
    }

    #[test]
    fn test_deterministic() {
        let seed: Vec<u8> = (0..16).collect();
        assert_eq!(derive_kek(&seed).unwrap(), derive_kek(&seed).unwrap());
    }
}
