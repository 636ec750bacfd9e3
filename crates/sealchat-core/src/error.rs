//! Error types for Sealchat.
//!
//! Error messages are intentionally generic: decrypt failures never reveal
//! whether the tag, the key, or the encoding was at fault beyond the coarse
//! taxonomy below, and key material never appears in an error string.

use thiserror::Error;

/// Core error type for Sealchat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Stored key string is not a valid encoding for the expected algorithm.
    /// Fatal at startup; the key is never silently regenerated.
    #[error("malformed key encoding")]
    MalformedKey(String),

    /// Stored key declares an algorithm other than AES-256-GCM.
    /// Fatal at startup.
    #[error("unsupported key algorithm")]
    UnsupportedAlgorithm(String),

    /// The external enhancement call failed. Recoverable: the pending user
    /// message is rolled back and the caller may retry with a fresh send.
    #[error("message enhancement failed")]
    Enhancement(String),

    /// AEAD seal failed. Should not occur under correct key material;
    /// triggers the same rollback as an enhancement failure.
    #[error("encryption failed")]
    Encryption(String),

    /// Authentication tag did not verify (tampered data or wrong key).
    /// The message keeps its payload; retry is possible.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// Payload is shorter than a nonce plus tag or not validly encoded.
    #[error("malformed payload")]
    MalformedPayload(String),

    /// Required cryptographic primitives are unavailable on this platform
    /// (the secure random source could not be read). Fatal.
    #[error("secure random source unavailable")]
    UnsupportedPlatform(String),

    /// Key-value storage operation failed.
    #[error("storage error")]
    Storage(String),
}

/// Result type alias using Sealchat's Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check whether this error is fatal to session initialization.
    ///
    /// A fatal import or platform error must block startup: regenerating a
    /// key here would orphan every previously encrypted message.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MalformedKey(_) | Error::UnsupportedAlgorithm(_) | Error::UnsupportedPlatform(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
