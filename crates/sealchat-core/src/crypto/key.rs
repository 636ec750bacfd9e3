//! Symmetric key type for AES-256-GCM.
//!
//! One key per device, generated or imported at session bootstrap and
//! treated as immutable afterwards. Key material is zeroized on drop and
//! never printed by `Debug`.

use crate::error::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the symmetric key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// A 256-bit symmetric key for authenticated encryption.
///
/// Lives only in process memory and, in exported form, in the key-value
/// store. Never logged, never transmitted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_SIZE]);

impl SecretKey {
    /// Generate a fresh random key from the operating system CSPRNG.
    ///
    /// Fails with [`Error::UnsupportedPlatform`] if the secure random
    /// source cannot be read; a non-secure generator is never substituted.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| Error::UnsupportedPlatform(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    ///
    /// # Security
    /// Handle with care - this exposes secret key material.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_distinct_keys() {
        let a = SecretKey::generate().unwrap();
        let b = SecretKey::generate().unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_from_bytes_round_trip() {
        let bytes = [7u8; KEY_SIZE];
        let key = SecretKey::from_bytes(bytes);
        assert_eq!(key.as_bytes(), &bytes);
    }

    #[test]
    fn test_debug_redacts_material() {
        let key = SecretKey::from_bytes([42u8; KEY_SIZE]);
        let printed = format!("{:?}", key);
        assert_eq!(printed, "SecretKey([REDACTED])");
        assert!(!printed.contains("42"));
    }
}
