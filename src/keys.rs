//! Ed25519 key material for onion services
//!
//! Workers generate one [`KeyPair`] per candidate; only matched pairs
//! outlive the hot loop. Tor's secret key file format stores the
//! expanded (clamped SHA-512) form rather than the seed, so both
//! derivations live here.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha512};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("expected a 32-byte seed, got {0} bytes")]
    InvalidSeedLength(usize),

    #[error("key generation failed: {0}")]
    Rng(#[from] rand::Error),
}

/// An Ed25519 key pair as raw bytes: the public point and the private seed.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: [u8; 32],
    pub seed: [u8; 32],
}

impl KeyPair {
    /// Generate a fresh random key pair from the OS RNG.
    ///
    /// RNG failure is the only fallible step in the search loop; callers
    /// report it and keep going rather than tearing the worker down.
    pub fn generate() -> Result<Self, KeyError> {
        let mut seed = [0u8; 32];
        OsRng.try_fill_bytes(&mut seed)?;
        Ok(Self::from_seed(seed))
    }

    /// Deterministically derive the pair for a known seed.
    ///
    /// This is the single place that touches the dalek key container:
    /// `SigningKey::from_bytes` takes the raw 32-byte seed and
    /// `VerifyingKey::to_bytes` yields the raw compressed point, so no
    /// structural offset parsing is needed. A library swap only touches
    /// this function.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        Self {
            public: signing_key.verifying_key().to_bytes(),
            seed,
        }
    }

    /// The 64-byte expanded secret key for this pair's seed.
    pub fn expanded(&self) -> [u8; 64] {
        expand_secret_key(&self.seed)
    }
}

/// Derive the Ed25519 public key for a seed held as an unchecked slice.
pub fn derive_public_key(seed: &[u8]) -> Result<[u8; 32], KeyError> {
    let seed: [u8; 32] = seed
        .try_into()
        .map_err(|_| KeyError::InvalidSeedLength(seed.len()))?;
    Ok(KeyPair::from_seed(seed).public)
}

/// Expand a seed into the 64-byte secret key Tor stores on disk:
/// `SHA-512(seed)` with the scalar half clamped.
pub fn expand_secret_key(seed: &[u8; 32]) -> [u8; 64] {
    let hash = Sha512::digest(seed);
    let mut expanded = [0u8; 64];
    expanded.copy_from_slice(&hash);
    expanded[0] &= 248;
    expanded[31] &= 127;
    expanded[31] |= 64;
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let pair = KeyPair::generate().unwrap();
        assert_eq!(pair.public.len(), 32);
        assert_eq!(pair.seed.len(), 32);
    }

    #[test]
    fn test_derivation_deterministic() {
        let mut seed = [0u8; 32];
        seed[31] = 1;
        let a = derive_public_key(&seed).unwrap();
        let b = derive_public_key(&seed).unwrap();
        assert_eq!(a, b);
        assert_eq!(KeyPair::from_seed(seed).public, a);
        assert_eq!(expand_secret_key(&seed), expand_secret_key(&seed));
    }

    #[test]
    fn test_expand_clamping() {
        let mut seed = [0u8; 32];
        seed[31] = 1;
        let expanded = expand_secret_key(&seed);
        assert_eq!(expanded[0] & 0b0000_0111, 0);
        assert_eq!(expanded[31] & 0b1000_0000, 0);
        assert_eq!(expanded[31] & 0b0100_0000, 0b0100_0000);
    }

    #[test]
    fn test_seed_length_checked() {
        assert!(matches!(
            derive_public_key(&[0u8; 31]),
            Err(KeyError::InvalidSeedLength(31))
        ));
        assert!(derive_public_key(&[0u8; 32]).is_ok());
    }

    #[test]
    fn test_public_key_matches_dalek() {
        let pair = KeyPair::generate().unwrap();
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&pair.seed);
        assert_eq!(signing_key.verifying_key().to_bytes(), pair.public);
    }
}
