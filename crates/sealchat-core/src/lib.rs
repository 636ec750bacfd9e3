//! # Sealchat Core Library
//!
//! A client-side secure-messaging core. One AES-256-GCM key per device
//! manages the whole lifecycle: user text is rephrased by an out-of-process
//! enhancement collaborator, sealed under the session key, and appended to
//! an ordered log whose entries move through an explicit state machine
//! (composed -> enhanced -> encrypted -> decrypted -> read).
//!
//! ## Guarantees
//!
//! - Key material exists only in process memory and in its exported JWK
//!   form in storage; it is never logged and zeroized on drop
//! - Every encryption uses a fresh random 12-byte nonce
//! - Tampered payloads fail authentication; corrupted plaintext is never
//!   returned
//! - A failed send always rolls back its pending user message; no partial
//!   assistant entry is representable
//! - A stored key that fails to import blocks startup; it is never
//!   silently regenerated
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               Caller / UI               │
//! ├─────────────────────────────────────────┤
//! │    session (bootstrap)   │   storage    │
//! ├─────────────────────────────────────────┤
//! │        messaging (log + enhancer)       │
//! ├─────────────────────────────────────────┤
//! │          crypto (AEAD + codec)          │
//! └─────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod crypto;
pub mod error;
pub mod messaging;
pub mod session;
pub mod storage;

pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
