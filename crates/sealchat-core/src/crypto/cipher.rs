//! Authenticated encryption using AES-256-GCM.
//!
//! Message bodies are sealed with AEAD to provide both confidentiality and
//! integrity. Every encryption generates a fresh random 12-byte nonce; the
//! payload text encoding is `base64(nonce || ciphertext || tag)` and must
//! stay stable for interoperability with previously stored payloads.

use crate::crypto::key::SecretKey;
use crate::error::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce as GcmNonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes (128 bits).
pub const TAG_SIZE: usize = 16;

/// A nonce for AEAD encryption.
///
/// Unique per encryption under a given key. Callers never supply nonces;
/// [`encrypt`] regenerates one on every call.
#[derive(Clone, Copy, Debug)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Create a new random nonce from the operating system CSPRNG.
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| Error::UnsupportedPlatform(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// The textual form of one sealed message body.
///
/// Wire format: `base64(nonce || ciphertext || tag)`. Opaque without the
/// key; this is the only externally observable binary-adjacent encoding.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedPayload(String);

impl EncryptedPayload {
    /// Wrap an already-encoded payload string (e.g. read back from storage).
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Get the encoded text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payloads are opaque but long; show only the size.
        write!(f, "EncryptedPayload({} chars)", self.0.len())
    }
}

/// Encrypt plaintext under `key` with a fresh random nonce.
///
/// Runs AES-256-GCM over the UTF-8 encoding of `plaintext` with no
/// associated data, then encodes `nonce || ciphertext || tag` as base64.
/// No side effects beyond random number consumption.
pub fn encrypt(plaintext: &str, key: &SecretKey) -> Result<EncryptedPayload> {
    let nonce = Nonce::random()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let ciphertext = cipher
        .encrypt(GcmNonce::from_slice(nonce.as_bytes()), plaintext.as_bytes())
        .map_err(|_| Error::Encryption("AEAD seal failed".into()))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(nonce.as_bytes());
    combined.extend_from_slice(&ciphertext);

    Ok(EncryptedPayload(BASE64.encode(combined)))
}

/// Decrypt a payload produced by [`encrypt`].
///
/// Splits the first 12 bytes as nonce and the remainder as ciphertext plus
/// tag. Fails with [`Error::AuthenticationFailure`] if the tag does not
/// verify (tampered data or wrong key) and [`Error::MalformedPayload`] if
/// the payload is too short or not validly encoded. Deterministic and
/// side-effect-free.
pub fn decrypt(payload: &EncryptedPayload, key: &SecretKey) -> Result<String> {
    let data = BASE64
        .decode(payload.as_str())
        .map_err(|_| Error::MalformedPayload("invalid base64".into()))?;

    if data.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::MalformedPayload("payload too short".into()));
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let plaintext = cipher
        .decrypt(GcmNonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| Error::AuthenticationFailure)?;

    String::from_utf8(plaintext).map_err(|_| Error::MalformedPayload("not valid UTF-8".into()))
}
