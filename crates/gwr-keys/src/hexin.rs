//! Hex input parsing for pasted provisioning output

use crate::error::{KeyError, KeyResult};

/// Parse a hex line as copied from the vendor provisioning tool.
///
/// Embedded spaces and tabs are stripped. When the cleaned text contains a
/// colon, everything after the first colon-delimited label is the payload
/// (`"kek: a0b1..."` style); otherwise the whole string is the payload.
/// Decoding is case-insensitive; odd length or non-hex characters fail.
pub fn parse_hex_input(text: &str) -> KeyResult<Vec<u8>> {
    let cleaned: String = text.chars().filter(|c| *c != ' ' && *c != '\t').collect();
    let payload = match cleaned.split_once(':') {
        Some((_label, rest)) => rest,
        None => cleaned.as_str(),
    };
    hex::decode(payload).map_err(|e| KeyError::InvalidHex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_payload() {
        assert_eq!(parse_hex_input("bbcc").unwrap(), vec![0xBB, 0xCC]);
    }

    #[test]
    fn test_label_and_whitespace_ignored() {
        // Label before the colon is discarded, even when it looks like hex
        assert_eq!(parse_hex_input("AA:BB CC").unwrap(), vec![0xBB, 0xCC]);
        assert_eq!(parse_hex_input("kek:\tbb cc").unwrap(), vec![0xBB, 0xCC]);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            parse_hex_input("BbCc").unwrap(),
            parse_hex_input("bbcc").unwrap()
        );
    }

    #[test]
    fn test_odd_length_rejected() {
        assert!(parse_hex_input("abc").is_err());
    }

    #[test]
    fn test_non_hex_rejected() {
        assert!(parse_hex_input("zz00").is_err());
    }
}
