//! Stable short hashes used to disambiguate generated email addresses.
//!
//! The hash is cosmetic, not a security control: it only has to be
//! deterministic and spread evenly enough that two employees sharing a name
//! rarely share an address. Existing realms were generated with exactly this
//! digest and truncation, so changing either breaks address compatibility.

use md5::{Digest, Md5};

/// Default number of decimal digits appended to email local parts.
pub const DEFAULT_HASH_LENGTH: usize = 4;

/// Lower-case hex MD5 digest of the UTF-8 bytes of `id`.
pub fn id_digest_hex(id: &str) -> String {
    hex::encode(Md5::digest(id.as_bytes()))
}

/// Derive a fixed-width decimal hash from an identifier.
///
/// The first 8 hex characters of the MD5 digest are read as a base-16
/// integer and rendered in base 10. The first `length` characters of that
/// decimal string are kept and left-padded with `'0'` up to `length`.
pub fn generate_stable_hash(id: &str, length: usize) -> String {
    let digest = Md5::digest(id.as_bytes());
    // First 8 hex characters == first 4 bytes, big-endian.
    let numeric = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let decimal = numeric.to_string();
    let head: String = decimal.chars().take(length).collect();
    format!("{:0>width$}", head, width = length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        assert_eq!(generate_stable_hash("EMP-1042", DEFAULT_HASH_LENGTH), "1961");
        assert_eq!(generate_stable_hash("EMP-007", DEFAULT_HASH_LENGTH), "1658");
        assert_eq!(generate_stable_hash("EMP-001", DEFAULT_HASH_LENGTH), "3810");
        assert_eq!(generate_stable_hash("TN-0001", DEFAULT_HASH_LENGTH), "2372");
    }

    #[test]
    fn test_digest_prefix_matches_hash_input() {
        let digest = id_digest_hex("EMP-1042");
        assert_eq!(digest.len(), 32);
        assert_eq!(&digest[..8], "74f009a9");
        assert_eq!(u32::from_str_radix(&digest[..8], 16).unwrap(), 1_961_888_169);
    }

    #[test]
    fn test_longer_length_truncates_decimal() {
        assert_eq!(generate_stable_hash("EMP-1042", 6), "196188");
    }

    #[test]
    fn test_short_decimal_is_zero_padded() {
        // md5("EMP-27482") starts with 0x00012483 == 74883 (five digits).
        assert_eq!(generate_stable_hash("EMP-27482", 6), "074883");
        assert_eq!(generate_stable_hash("EMP-27482", 4), "7488");
    }

    #[test]
    fn test_length_beyond_decimal_width_pads() {
        assert_eq!(generate_stable_hash("EMP-1042", 12), "001961888169");
        assert_eq!(generate_stable_hash("EMP-001", 12), "000381039566");
    }

    #[test]
    fn test_empty_id_is_still_hashed() {
        assert_eq!(generate_stable_hash("", 4), "3558");
    }

    #[test]
    fn test_zero_length() {
        assert_eq!(generate_stable_hash("EMP-1042", 0), "");
    }
}
