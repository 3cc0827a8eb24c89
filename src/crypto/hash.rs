//! Hashing utilities for the overlay
//!
//! Provides the SHA-256 based hashing functions used for transaction IDs,
//! signature digests, key derivation and Base58Check checksums.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Length of a Base58Check checksum in bytes
pub const CHECKSUM_LEN: usize = 4;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
/// Used for transaction IDs and Base58Check checksums
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// Computes HMAC-SHA256 of `data` under `key`
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);

    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Base58Check-encodes `payload` behind a version `prefix`
///
/// The checksum is the first 4 bytes of double SHA-256 over prefix + payload.
pub fn to_base58_check(payload: &[u8], prefix: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(prefix.len() + payload.len() + CHECKSUM_LEN);
    bytes.extend_from_slice(prefix);
    bytes.extend_from_slice(payload);
    let checksum = double_sha256(&bytes);
    bytes.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    bs58::encode(bytes).into_string()
}

/// Decodes a Base58Check string into `(prefix, payload)`
///
/// Returns `None` when the string is not valid Base58, is too short or the
/// checksum does not match.
pub fn from_base58_check(encoded: &str, prefix_len: usize) -> Option<(Vec<u8>, Vec<u8>)> {
    let bytes = bs58::decode(encoded).into_vec().ok()?;
    if bytes.len() < prefix_len + CHECKSUM_LEN {
        return None;
    }

    let (body, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if double_sha256(body)[..CHECKSUM_LEN] != *checksum {
        return None;
    }

    let (prefix, payload) = body.split_at(prefix_len);
    Some((prefix.to_vec(), payload.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        let hash = sha256(data);
        assert_eq!(hash.len(), 32);
        assert_eq!(
            hex::encode(hash),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_hmac_sha256_rfc4231_case_2() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_base58_check_round_trip() {
        let encoded = to_base58_check(&[7u8; 32], &[0xce, 0x00]);
        let (prefix, payload) = from_base58_check(&encoded, 2).unwrap();
        assert_eq!(prefix, vec![0xce, 0x00]);
        assert_eq!(payload, vec![7u8; 32]);
    }

    #[test]
    fn test_base58_check_rejects_bad_checksum() {
        let mut encoded = to_base58_check(&[1u8; 32], &[0xce, 0x00]);
        // Swap the final character for a different Base58 digit
        let last = encoded.pop().unwrap();
        encoded.push(if last == '2' { '3' } else { '2' });
        assert!(from_base58_check(&encoded, 2).is_none());
    }
}
