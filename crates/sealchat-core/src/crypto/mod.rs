//! Cryptographic core for Sealchat.
//!
//! A single, stateless transform pair parameterized by one symmetric key:
//!
//! - **AES-256-GCM**: authenticated encryption of message bodies
//! - **JWK**: portable textual key form for persistence
//!
//! All randomness comes from the operating system CSPRNG. There is no
//! mutable state in this module; message state lives in
//! [`crate::messaging`].
//!
//! ## Forbidden
//!
//! - Custom cryptography
//! - Caller-supplied nonces
//! - Non-secure random sources

mod cipher;
mod codec;
mod key;

pub use cipher::{decrypt, encrypt, EncryptedPayload, Nonce, NONCE_SIZE, TAG_SIZE};
pub use codec::{export_key, import_key};
pub use key::{SecretKey, KEY_SIZE};
