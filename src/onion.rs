//! Tor v3 onion address encoding and verification
//!
//! A v3 address is `base32(pubkey || checksum || version)` where
//! `checksum = SHA3-256(".onion checksum" || pubkey || version)[0..2]`
//! and `version = 0x03`. The base32 form is 56 lowercase characters
//! with no padding; the `.onion` suffix is display-only.

use sha3::{Digest, Sha3_256};
use thiserror::Error;

/// Version byte appended to every v3 address payload.
pub const VERSION: u8 = 3;

/// Length of the base32 address body, without the `.onion` suffix.
pub const ADDRESS_LEN: usize = 56;

const ALPHABET: base32::Alphabet = base32::Alphabet::Rfc4648Lower { padding: false };

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected a 32-byte public key, got {0} bytes")]
    InvalidKeyLength(usize),

    #[error("invalid onion address: {0}")]
    InvalidAddress(String),

    #[error("address checksum does not match embedded public key")]
    BadChecksum,

    #[error("unsupported address version byte: {0}")]
    BadVersion(u8),
}

/// Base32-encode arbitrary bytes (RFC 4648 alphabet, lowercase, no padding).
pub fn base32_encode(bytes: &[u8]) -> String {
    base32::encode(ALPHABET, bytes)
}

/// Decode a lowercase or uppercase unpadded base32 string.
pub fn base32_decode(s: &str) -> Option<Vec<u8>> {
    base32::decode(ALPHABET, &s.to_lowercase())
}

/// The two checksum bytes for a public key under the v3 address scheme.
pub fn checksum(pubkey: &[u8; 32]) -> [u8; 2] {
    let mut hasher = Sha3_256::new();
    hasher.update(b".onion checksum");
    hasher.update(pubkey);
    hasher.update([VERSION]);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

/// Convert an Ed25519 public key to its 56-character onion address body.
pub fn pubkey_to_onion(pubkey: &[u8; 32]) -> String {
    let mut payload = [0u8; 35];
    payload[..32].copy_from_slice(pubkey);
    payload[32..34].copy_from_slice(&checksum(pubkey));
    payload[34] = VERSION;

    base32_encode(&payload)
}

/// Fallible wrapper for callers holding an unchecked key slice.
pub fn derive_onion_address(pubkey: &[u8]) -> Result<String, CodecError> {
    let key: &[u8; 32] = pubkey
        .try_into()
        .map_err(|_| CodecError::InvalidKeyLength(pubkey.len()))?;
    Ok(pubkey_to_onion(key))
}

/// Recover the embedded public key from an address, verifying the
/// checksum and version byte. Accepts an optional `.onion` suffix and
/// uppercase input.
pub fn onion_to_pubkey(address: &str) -> Result<[u8; 32], CodecError> {
    let body = strip_suffix(address);
    if body.len() != ADDRESS_LEN {
        return Err(CodecError::InvalidAddress(format!(
            "expected {} base32 characters, got {}",
            ADDRESS_LEN,
            body.len()
        )));
    }

    let payload = base32_decode(body)
        .ok_or_else(|| CodecError::InvalidAddress("not valid base32".into()))?;
    if payload.len() != 35 {
        return Err(CodecError::InvalidAddress(format!(
            "decoded to {} bytes, expected 35",
            payload.len()
        )));
    }

    if payload[34] != VERSION {
        return Err(CodecError::BadVersion(payload[34]));
    }

    let mut pubkey = [0u8; 32];
    pubkey.copy_from_slice(&payload[..32]);
    if payload[32..34] != checksum(&pubkey) {
        return Err(CodecError::BadChecksum);
    }

    Ok(pubkey)
}

/// Check whether an address was derived from the given public key.
/// Case-insensitive; ignores any `.onion` suffix.
pub fn verify_address_matches_key(address: &str, pubkey: &[u8; 32]) -> bool {
    strip_suffix(address).to_lowercase() == pubkey_to_onion(pubkey)
}

fn strip_suffix(address: &str) -> &str {
    address
        .strip_suffix(".onion")
        .or_else(|| address.strip_suffix(".ONION"))
        .unwrap_or(address)
}
